//! Root Motion Corrector
//!
//! Removes drift from the translation curve of a designated root bone.
//!
//! # Overview
//!
//! In-place locomotion clips often carry sway or bob on the root bone that the
//! feet do not account for. The corrector measures the midpoint between the
//! two foot bones every frame, compares it with the rest-pose midpoint (the
//! *baseline*), and subtracts the masked difference from the root's
//! translation, re-expressed in the root's parent space.
//!
//! # Lifecycle
//!
//! 1. [`RootMotionCorrector::new`] creates an uninitialized corrector.
//! 2. [`RootMotionCorrector::init`] locates the bones, resolves ancestor
//!    chains and captures the baseline. On a bad skeleton the corrector stays
//!    uninitialized and every [`RootMotionCorrector::apply`] passes through.
//! 3. [`RootMotionCorrector::apply`] is called per clip and property.
//!
//! ```rust,ignore
//! let mut corrector = RootMotionCorrector::new(CorrectorConfig::enabled());
//! corrector.init(groups.clone(), &rest_pose).ok();
//! let clip = corrector.clip("walk");
//! match corrector.apply(&clip, "translation", curves, frame_count, "Armature/root")? {
//!     Correction::Replace(samples) => write_translation(samples),
//!     Correction::Passthrough => write_original(curves),
//! }
//! ```

use std::sync::Arc;

use glam::{Affine3A, Vec3};
use log::{debug, trace, warn};
use rustc_hash::FxHashMap;
use strider_core::{BonePath, CorrectionError, Result};

use crate::config::{AnchorSpace, AxisMask, CorrectorConfig};
use crate::group::CurveGroupSet;
use crate::hierarchy::{AncestorChain, BoneHierarchy};
use crate::property::{PropertyCurves, PropertyKind};
use crate::rest::RestPose;
use crate::sampler::{TransformSampler, try_inverse};

/// Timing of the clip being corrected.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipInfo {
    pub name: String,
    pub frame_rate: f32,
}

impl ClipInfo {
    #[must_use]
    pub fn new(name: impl Into<String>, frame_rate: f32) -> Self {
        Self {
            name: name.into(),
            frame_rate,
        }
    }

    /// Time in seconds of frame `index`.
    #[inline]
    #[must_use]
    pub fn frame_time(&self, index: usize) -> f32 {
        index as f32 / self.frame_rate
    }

    /// Number of frames needed to cover `duration` seconds, both ends included.
    #[must_use]
    pub fn frame_count_for(&self, duration: f32) -> usize {
        if !self.has_valid_rate() || !duration.is_finite() || duration <= 0.0 {
            return 1;
        }
        (duration * self.frame_rate).round() as usize + 1
    }

    fn has_valid_rate(&self) -> bool {
        self.frame_rate.is_finite() && self.frame_rate > 0.0
    }
}

/// Result of [`RootMotionCorrector::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Correction {
    /// Keep the original curves untouched.
    Passthrough,
    /// Replace the property with one sample per frame.
    Replace(Vec<Vec3>),
}

impl Correction {
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough)
    }

    #[must_use]
    pub fn samples(&self) -> Option<&[Vec3]> {
        match self {
            Self::Replace(samples) => Some(samples),
            Self::Passthrough => None,
        }
    }
}

/// A reference bone whose anchor-space position is tracked per frame.
#[derive(Debug, Clone)]
struct FootTrack {
    path: BonePath,
    /// Group index if the foot's translation is animated.
    translation: Option<usize>,
    chain: AncestorChain,
    /// Offset from the nearest rest-posed ancestor; stands in for missing
    /// translation keys.
    rest_local: Vec3,
    /// Rest position in anchor space.
    rest_anchor: Vec3,
}

impl FootTrack {
    fn position(&self, groups: &CurveGroupSet, sampler: &TransformSampler<'_>, time: f32) -> Vec3 {
        let local = self
            .translation
            .and_then(|idx| groups.by_index(idx))
            .and_then(|g| g.property(PropertyKind::Translation))
            .map(|curves| curves.sample_vec3(time));

        match local {
            Some(local) => sampler.compose_up(local, &self.chain, time),
            None if self.chain.is_animated() => {
                sampler.compose_up(self.rest_local, &self.chain, time)
            }
            None => self.rest_anchor,
        }
    }
}

/// Everything resolved by a successful `init`.
#[derive(Debug, Clone)]
struct Rig {
    groups: Arc<CurveGroupSet>,
    root: BonePath,
    /// Root's ancestors up to the anchor; empty when anchored at its parent.
    root_chain: AncestorChain,
    left: FootTrack,
    right: FootTrack,
    baseline: Vec3,
}

impl Rig {
    fn build(
        config: &CorrectorConfig,
        groups: Arc<CurveGroupSet>,
        rest: &RestPose,
    ) -> Result<Self> {
        let root = find_bone(rest, "root", &config.root_bone_name)?;
        let left = find_bone(rest, "left foot", &config.left_foot_name)?;
        let right = find_bone(rest, "right foot", &config.right_foot_name)?;

        let hierarchy = BoneHierarchy::with_rest(&groups, rest);

        let (boundary, root_chain, world_to_anchor) = match config.anchor {
            AnchorSpace::ExportRoot => (
                None,
                hierarchy.resolve_ancestors(root.as_str(), None)?,
                Affine3A::IDENTITY,
            ),
            AnchorSpace::RootParent => {
                let world_to_anchor = match rest.nearest_ancestor(&root) {
                    Some((parent, parent_world)) => try_inverse(parent_world).ok_or_else(|| {
                        CorrectionError::SingularTransform {
                            path: parent.to_string(),
                            time: 0.0,
                        }
                    })?,
                    None => Affine3A::IDENTITY,
                };
                (Some(root.as_str()), AncestorChain::empty(), world_to_anchor)
            }
        };

        let track = |path: BonePath| -> Result<FootTrack> {
            let chain = hierarchy.resolve_ancestors(path.as_str(), boundary)?;
            let translation = groups.index_of(path.as_str()).filter(|&idx| {
                groups
                    .by_index(idx)
                    .and_then(|g| g.property(PropertyKind::Translation))
                    .is_some_and(|c| !c.is_unanimated())
            });
            let rest_local = hierarchy
                .rest_local(path.as_str())?
                .map_or(Vec3::ZERO, |m| Vec3::from(m.translation));
            let rest_world = rest.position(path.as_str()).unwrap_or_default();
            Ok(FootTrack {
                rest_anchor: world_to_anchor.transform_point3(rest_world),
                path,
                translation,
                chain,
                rest_local,
            })
        };

        let left = track(left)?;
        let right = track(right)?;
        let baseline = (left.rest_anchor + right.rest_anchor) * 0.5;

        Ok(Self {
            groups,
            root,
            root_chain,
            left,
            right,
            baseline,
        })
    }

    fn correct_translation(
        &self,
        mask: AxisMask,
        clip: &ClipInfo,
        curves: &PropertyCurves,
        frame_count: usize,
    ) -> Result<Vec<Vec3>> {
        if frame_count == 0 {
            return Ok(Vec::new());
        }
        if !clip.has_valid_rate() {
            return Err(CorrectionError::InvalidFrameRate(clip.frame_rate));
        }

        let sampler = TransformSampler::new(&self.groups);
        let mut samples = Vec::with_capacity(frame_count);

        for i in 0..frame_count {
            let time = clip.frame_time(i);
            let local = curves.sample_vec3(time);

            let left = self.left.position(&self.groups, &sampler, time);
            let right = self.right.position(&self.groups, &sampler, time);
            let current = (left + right) * 0.5;
            let offset = mask.apply(current - self.baseline);
            trace!("{} frame {i}: drift offset {offset:?}", clip.name);

            if offset == Vec3::ZERO {
                samples.push(local);
                continue;
            }

            let anchored = sampler.compose_up(local, &self.root_chain, time);
            let corrected = sampler.compose_down(anchored - offset, &self.root_chain, time)?;
            samples.push(corrected);
        }

        Ok(samples)
    }
}

/// Finds the rest-posed bone whose last path segment is `name`.
///
/// Several matches resolve to the shallowest path, ties broken by path order.
fn find_bone(rest: &RestPose, role: &'static str, name: &str) -> Result<BonePath> {
    let mut matches: Vec<&BonePath> = rest.paths().filter(|p| p.name() == name).collect();
    matches.sort_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.cmp(b)));

    let Some(&first) = matches.first() else {
        return Err(CorrectionError::MissingBone {
            role,
            name: name.to_string(),
        });
    };
    if matches.len() > 1 {
        warn!(
            "{} bones are named '{name}'; using '{first}' as the {role} bone",
            matches.len()
        );
    }
    Ok(first.clone())
}

#[derive(Debug, Clone)]
enum CorrectorState {
    Uninitialized,
    Ready(Box<Rig>),
}

/// Rewrites the root bone's translation curve to cancel foot-midpoint drift.
///
/// One instance serves one skeleton/clip pair. Instances share nothing
/// mutable, so clips can be corrected in parallel on separate instances.
#[derive(Debug, Clone)]
pub struct RootMotionCorrector {
    config: CorrectorConfig,
    state: CorrectorState,
}

impl RootMotionCorrector {
    #[must_use]
    pub fn new(config: CorrectorConfig) -> Self {
        Self {
            config,
            state: CorrectorState::Uninitialized,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &CorrectorConfig {
        &self.config
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, CorrectorState::Ready(_))
    }

    /// Rest midpoint of the feet in anchor space, once ready.
    #[must_use]
    pub fn baseline(&self) -> Option<Vec3> {
        self.rig().map(|rig| rig.baseline)
    }

    /// Path of the bone being corrected, once ready.
    #[must_use]
    pub fn root_path(&self) -> Option<&BonePath> {
        self.rig().map(|rig| &rig.root)
    }

    /// Clip timing using the configured frame rate.
    #[must_use]
    pub fn clip(&self, name: impl Into<String>) -> ClipInfo {
        ClipInfo::new(name, self.config.frame_rate)
    }

    fn rig(&self) -> Option<&Rig> {
        match &self.state {
            CorrectorState::Ready(rig) => Some(rig.as_ref()),
            CorrectorState::Uninitialized => None,
        }
    }

    /// Locates the root and foot bones and captures the baseline.
    ///
    /// Does nothing when correction is disabled. On error the corrector is
    /// left uninitialized, the problem is logged as a warning, and later
    /// `apply` calls pass through.
    pub fn init(&mut self, groups: Arc<CurveGroupSet>, rest: &RestPose) -> Result<()> {
        self.state = CorrectorState::Uninitialized;

        if !self.config.enabled {
            debug!("Root motion correction disabled; skipping init");
            return Ok(());
        }

        match Rig::build(&self.config, groups, rest) {
            Ok(rig) => {
                debug!(
                    "Root motion corrector ready: root '{}', feet '{}' / '{}', \
                     baseline {:?} ({:?}, chains {}/{}/{})",
                    rig.root,
                    rig.left.path,
                    rig.right.path,
                    rig.baseline,
                    self.config.anchor,
                    rig.root_chain.len(),
                    rig.left.chain.len(),
                    rig.right.chain.len(),
                );
                self.state = CorrectorState::Ready(Box::new(rig));
                Ok(())
            }
            Err(err) => {
                warn!("Root motion correction skipped: {err}");
                Err(err)
            }
        }
    }

    /// Corrects one property of one bone.
    ///
    /// Passes through unless the corrector is ready and `bone_path` is the
    /// root bone. Rotation and scale always pass through. Unknown property
    /// names and Euler angle curves are errors the caller must not ignore.
    pub fn apply(
        &self,
        clip: &ClipInfo,
        property: &str,
        curves: &PropertyCurves,
        frame_count: usize,
        bone_path: &str,
    ) -> Result<Correction> {
        if !self.config.enabled {
            return Ok(Correction::Passthrough);
        }
        let Some(rig) = self.rig() else {
            return Ok(Correction::Passthrough);
        };
        if bone_path != rig.root.as_str() {
            return Ok(Correction::Passthrough);
        }

        match PropertyKind::from_name(property)? {
            PropertyKind::Rotation | PropertyKind::Scale => Ok(Correction::Passthrough),
            PropertyKind::Translation => {
                if curves.kind() != PropertyKind::Translation {
                    return Err(CorrectionError::PropertyMismatch {
                        expected: PropertyKind::Translation.name(),
                        found: curves.kind().name(),
                    });
                }

                match rig.correct_translation(self.config.axis_mask(), clip, curves, frame_count) {
                    Ok(samples) => Ok(Correction::Replace(samples)),
                    Err(err) if err.is_recoverable() => {
                        warn!("Root motion correction skipped for clip '{}': {err}", clip.name);
                        Ok(Correction::Passthrough)
                    }
                    Err(err) => Err(err),
                }
            }
        }
    }

    /// Runs [`apply`](Self::apply) over every property of the initialized
    /// curve groups and returns the replaced translation arrays by bone path.
    pub fn correct_clip(
        &self,
        clip: &ClipInfo,
        frame_count: usize,
    ) -> Result<FxHashMap<BonePath, Vec<Vec3>>> {
        let mut replaced = FxHashMap::default();
        let Some(rig) = self.rig() else {
            return Ok(replaced);
        };

        for group in rig.groups.iter() {
            for curves in group.properties() {
                let correction = self.apply(
                    clip,
                    curves.kind().name(),
                    curves,
                    frame_count,
                    group.path.as_str(),
                )?;
                if let Correction::Replace(samples) = correction {
                    replaced.insert(group.path.clone(), samples);
                }
            }
        }

        debug!(
            "Clip '{}': {} translation curve(s) corrected over {frame_count} frame(s)",
            clip.name,
            replaced.len()
        );
        Ok(replaced)
    }
}
