//! Bone hierarchy resolution.
//!
//! Paths are decomposed into a parent-linked tree once, when a corrector is
//! initialized. Ancestor chains are then walked by key hops instead of by
//! repeatedly stripping and re-hashing path strings.

use glam::Affine3A;
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;
use strider_core::{BonePath, CorrectionError, Result};

use crate::group::CurveGroupSet;
use crate::rest::RestPose;

new_key_type! {
    pub struct BoneKey;
}

/// One bone of the tree. Intermediate path prefixes get a node even when
/// they are neither animated nor rest-posed.
#[derive(Debug, Clone)]
struct BoneNode {
    path: BonePath,
    parent: Option<BoneKey>,
    /// Index into the [`CurveGroupSet`] if the bone is animated.
    group: Option<usize>,
    /// Rest transform relative to the nearest rest-posed ancestor.
    rest_local: Option<Result<Affine3A>>,
}

/// One step of an ancestor chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainLink {
    /// Sampled from the curve group at this index.
    Animated(usize),
    /// Unanimated bone held at its rest-local transform.
    Rest { path: BonePath, local: Affine3A },
}

/// Transforms between a bone and its anchor, nearest parent first.
///
/// Bones that are neither animated nor rest-posed contribute identity and
/// are left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AncestorChain {
    links: SmallVec<[ChainLink; 8]>,
}

impl AncestorChain {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    #[must_use]
    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    /// Curve-group indices of the animated links, nearest first.
    pub fn groups(&self) -> impl Iterator<Item = usize> + '_ {
        self.links.iter().filter_map(|link| match link {
            ChainLink::Animated(idx) => Some(*idx),
            ChainLink::Rest { .. } => None,
        })
    }

    /// Whether sampling the chain can give different results over time.
    #[must_use]
    pub fn is_animated(&self) -> bool {
        self.groups().next().is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoneHierarchy {
    bones: SlotMap<BoneKey, BoneNode>,
    index: FxHashMap<BonePath, BoneKey>,
}

impl BoneHierarchy {
    /// Builds the tree from every animated path plus any extra paths.
    /// Unanimated bones carry no rest transform and drop out of chains.
    #[must_use]
    pub fn build<'a>(
        groups: &CurveGroupSet,
        extra: impl IntoIterator<Item = &'a BonePath>,
    ) -> Self {
        let mut hierarchy = Self::default();

        for group in groups.iter() {
            hierarchy.ensure(&group.path);
        }
        for path in extra {
            hierarchy.ensure(path);
        }
        for (_, node) in &mut hierarchy.bones {
            node.group = groups.index_of(node.path.as_str());
        }

        hierarchy
    }

    /// Builds the tree from the animated paths and the rest pose. Unanimated
    /// rest-posed bones stay in chains at their rest-local transform.
    #[must_use]
    pub fn with_rest(groups: &CurveGroupSet, rest: &RestPose) -> Self {
        let mut hierarchy = Self::build(groups, rest.paths());
        for (_, node) in &mut hierarchy.bones {
            node.rest_local = rest.local_transform(&node.path).transpose();
        }
        hierarchy
    }

    /// Inserts `path` and all of its prefixes, returning the key for `path`.
    fn ensure(&mut self, path: &BonePath) -> BoneKey {
        if let Some(&key) = self.index.get(path) {
            return key;
        }
        let parent = path.parent().map(|p| self.ensure(&p));
        let key = self.bones.insert(BoneNode {
            path: path.clone(),
            parent,
            group: None,
            rest_local: None,
        });
        self.index.insert(path.clone(), key);
        key
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[must_use]
    pub fn key(&self, path: &str) -> Option<BoneKey> {
        self.index.get(path).copied()
    }

    /// Rest transform of `path` relative to its nearest rest-posed ancestor,
    /// if the bone is rest-posed.
    pub fn rest_local(&self, path: &str) -> Result<Option<Affine3A>> {
        let key = self
            .key(path)
            .ok_or_else(|| CorrectionError::UnknownBone(path.to_string()))?;
        self.bones[key].rest_local.clone().transpose()
    }

    /// Collects the transforms above `path`, nearest parent first.
    ///
    /// With no boundary the walk runs to the top of the hierarchy. With a
    /// boundary the walk stops after the boundary bone, which is included, so
    /// the chain composes into the boundary's parent space. A boundary that
    /// is not an ancestor of `path` is an error.
    pub fn resolve_ancestors(&self, path: &str, boundary: Option<&str>) -> Result<AncestorChain> {
        let key = self
            .key(path)
            .ok_or_else(|| CorrectionError::UnknownBone(path.to_string()))?;

        let mut chain = AncestorChain::empty();
        let mut reached_boundary = boundary.is_none();
        let mut current = self.bones[key].parent;

        while let Some(key) = current {
            let node = &self.bones[key];
            match (node.group, &node.rest_local) {
                (Some(group), _) => chain.links.push(ChainLink::Animated(group)),
                (None, Some(Ok(local))) => chain.links.push(ChainLink::Rest {
                    path: node.path.clone(),
                    local: *local,
                }),
                (None, Some(Err(err))) => return Err(err.clone()),
                (None, None) => {}
            }
            if boundary == Some(node.path.as_str()) {
                reached_boundary = true;
                break;
            }
            current = node.parent;
        }

        if !reached_boundary {
            return Err(CorrectionError::OutsideAnchor {
                bone: path.to_string(),
                anchor: boundary.unwrap_or_default().to_string(),
            });
        }
        Ok(chain)
    }
}
