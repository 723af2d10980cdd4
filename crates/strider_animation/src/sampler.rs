//! Transform sampling and hierarchical composition.
//!
//! A bone's local transform at time `t` is assembled from its translation,
//! rotation and scale curves. Chains of such transforms move points between a
//! bone's local space and the space above its furthest sampled ancestor:
//!
//! ```text
//! compose_up:   p' = M_far * ... * M_near * p
//! compose_down: p  = M_near⁻¹ * ... * M_far⁻¹ * p'
//! ```

use glam::{Affine3A, Quat, Vec3};
use smallvec::SmallVec;
use strider_core::{CorrectionError, Result};

use crate::group::{CurveGroup, CurveGroupSet};
use crate::hierarchy::{AncestorChain, ChainLink};
use crate::property::PropertyKind;

/// Inverts `m`, or `None` if it collapses an axis or the inverse overflows.
#[must_use]
pub fn try_inverse(m: &Affine3A) -> Option<Affine3A> {
    if !m.matrix3.determinant().is_normal() {
        return None;
    }
    Some(m.inverse()).filter(Affine3A::is_finite)
}

/// A translation/rotation/scale triple sampled from curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl SampledTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Scale, then rotate, then translate.
    #[inline]
    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    #[must_use]
    pub fn is_invertible(&self) -> bool {
        try_inverse(&self.to_affine()).is_some()
    }
}

impl Default for SampledTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Samples the local transform of a curve group at `time`.
///
/// Unanimated properties and channels contribute identity values.
#[must_use]
pub fn sample_local(group: &CurveGroup, time: f32) -> SampledTransform {
    let mut out = SampledTransform::IDENTITY;
    if let Some(curves) = group.property(PropertyKind::Translation) {
        out.translation = curves.sample_vec3(time);
    }
    if let Some(curves) = group.property(PropertyKind::Rotation) {
        out.rotation = curves.sample_quat(time);
    }
    if let Some(curves) = group.property(PropertyKind::Scale) {
        out.scale = curves.sample_vec3(time);
    }
    out
}

/// Maps `point` from the nearest bone's space to the space above the
/// furthest transform. `chain` is ordered nearest ancestor first.
#[must_use]
pub fn compose_up(point: Vec3, chain: &[SampledTransform]) -> Vec3 {
    chain
        .iter()
        .fold(point, |p, trs| trs.to_affine().transform_point3(p))
}

fn affine_up(point: Vec3, chain: &[Affine3A]) -> Vec3 {
    chain.iter().fold(point, |p, m| m.transform_point3(p))
}

fn affine_down(point: Vec3, chain: &[Affine3A]) -> std::result::Result<Vec3, usize> {
    chain.iter().enumerate().rev().try_fold(point, |p, (i, m)| {
        try_inverse(m).map(|inv| inv.transform_point3(p)).ok_or(i)
    })
}

/// Inverse of [`compose_up`]: applies each inverse transform, furthest
/// ancestor first.
///
/// Fails with the offending chain position if a transform has zero scale.
pub fn compose_down(
    point: Vec3,
    chain: &[SampledTransform],
) -> std::result::Result<Vec3, usize> {
    let matrices: SmallVec<[Affine3A; 8]> = chain.iter().map(SampledTransform::to_affine).collect();
    affine_down(point, &matrices)
}

/// Samples ancestor chains of one curve-group set.
#[derive(Debug, Clone, Copy)]
pub struct TransformSampler<'a> {
    groups: &'a CurveGroupSet,
}

impl<'a> TransformSampler<'a> {
    #[must_use]
    pub fn new(groups: &'a CurveGroupSet) -> Self {
        Self { groups }
    }

    /// Transform of every chain link at `time`, nearest first.
    #[must_use]
    pub fn sample_chain(&self, chain: &AncestorChain, time: f32) -> SmallVec<[Affine3A; 8]> {
        chain
            .links()
            .iter()
            .map(|link| match link {
                ChainLink::Animated(idx) => self
                    .groups
                    .by_index(*idx)
                    .map_or(Affine3A::IDENTITY, |g| sample_local(g, time).to_affine()),
                ChainLink::Rest { local, .. } => *local,
            })
            .collect()
    }

    #[must_use]
    pub fn compose_up(&self, point: Vec3, chain: &AncestorChain, time: f32) -> Vec3 {
        affine_up(point, &self.sample_chain(chain, time))
    }

    pub fn compose_down(&self, point: Vec3, chain: &AncestorChain, time: f32) -> Result<Vec3> {
        let sampled = self.sample_chain(chain, time);
        affine_down(point, &sampled).map_err(|i| CorrectionError::SingularTransform {
            path: self.link_path(chain, i),
            time,
        })
    }

    fn link_path(&self, chain: &AncestorChain, i: usize) -> String {
        match chain.links().get(i) {
            Some(ChainLink::Animated(idx)) => self
                .groups
                .by_index(*idx)
                .map(|g| g.path.to_string())
                .unwrap_or_default(),
            Some(ChainLink::Rest { path, .. }) => path.to_string(),
            None => String::new(),
        }
    }
}
