use glam::{Affine3A, Vec3};
use rustc_hash::FxHashMap;
use strider_core::{BonePath, CorrectionError, Result};

use crate::sampler::{SampledTransform, try_inverse};

/// World-space rest pose of the skeleton, captured before any animation is
/// sampled. "World" is the export root's space.
#[derive(Debug, Clone, Default)]
pub struct RestPose {
    world: FxHashMap<BonePath, Affine3A>,
}

impl RestPose {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<BonePath>, world: Affine3A) {
        self.world.insert(path.into(), world);
    }

    /// Records a translation-only rest transform.
    pub fn insert_position(&mut self, path: impl Into<BonePath>, position: Vec3) {
        self.insert(path, Affine3A::from_translation(position));
    }

    /// Builds world rest transforms from local rest TRS values.
    ///
    /// Parents are resolved by path; a bone whose ancestors are all missing
    /// hangs directly off the export root.
    #[must_use]
    pub fn from_local<P>(locals: impl IntoIterator<Item = (P, SampledTransform)>) -> Self
    where
        P: Into<BonePath>,
    {
        let mut locals: Vec<(BonePath, Affine3A)> = locals
            .into_iter()
            .map(|(path, trs)| (path.into(), trs.to_affine()))
            .collect();
        // Parents before children
        locals.sort_by(|(a, _), (b, _)| a.depth().cmp(&b.depth()).then_with(|| a.cmp(b)));

        let mut pose = Self::new();
        for (path, local) in locals {
            let parent_world = pose.nearest_ancestor_transform(&path);
            pose.world.insert(path, parent_world * local);
        }
        pose
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.world.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    #[must_use]
    pub fn transform(&self, path: &str) -> Option<&Affine3A> {
        self.world.get(path)
    }

    #[must_use]
    pub fn position(&self, path: &str) -> Option<Vec3> {
        self.world.get(path).map(|m| Vec3::from(m.translation))
    }

    /// Nearest ancestor of `path` present in the pose.
    #[must_use]
    pub fn nearest_ancestor(&self, path: &BonePath) -> Option<(&BonePath, &Affine3A)> {
        path.ancestors().find_map(|p| self.world.get_key_value(p))
    }

    /// World transform of the nearest ancestor present in the pose, or
    /// identity if there is none.
    #[must_use]
    pub fn nearest_ancestor_transform(&self, path: &BonePath) -> Affine3A {
        self.nearest_ancestor(path)
            .map_or(Affine3A::IDENTITY, |(_, world)| *world)
    }

    /// Transform of `path` relative to its nearest rest-posed ancestor, or
    /// `None` if the bone is not rest-posed.
    pub fn local_transform(&self, path: &BonePath) -> Result<Option<Affine3A>> {
        let Some(world) = self.world.get(path) else {
            return Ok(None);
        };
        let Some((parent, parent_world)) = self.nearest_ancestor(path) else {
            return Ok(Some(*world));
        };
        let to_parent = try_inverse(parent_world).ok_or_else(|| {
            CorrectionError::SingularTransform {
                path: parent.to_string(),
                time: 0.0,
            }
        })?;
        Ok(Some(to_parent * *world))
    }

    pub fn paths(&self) -> impl Iterator<Item = &BonePath> {
        self.world.keys()
    }
}
