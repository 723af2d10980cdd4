//! Curve sampling, hierarchy resolution and root-motion correction.
//!
//! Data flows leaves-first:
//! - [`ChannelCurve`] / [`PropertyCurves`] / [`CurveGroup`]: the per-bone
//!   curve model handed over by the export pipeline.
//! - [`BoneHierarchy`]: resolves the transforms between a bone and its anchor.
//! - [`TransformSampler`]: evaluates local transforms and moves points up and
//!   down an ancestor chain.
//! - [`RootMotionCorrector`]: removes foot-midpoint drift from the root bone.

pub mod config;
pub mod corrector;
pub mod curve;
pub mod group;
pub mod hierarchy;
pub mod property;
pub mod rest;
pub mod sampler;

pub use config::{AnchorSpace, AxisMask, CorrectorConfig};
pub use corrector::{ClipInfo, Correction, RootMotionCorrector};
pub use curve::{ChannelCurve, InterpolationMode};
pub use group::{CurveGroup, CurveGroupSet};
pub use hierarchy::{AncestorChain, BoneHierarchy, BoneKey, ChainLink};
pub use property::{PropertyCurves, PropertyKind};
pub use rest::RestPose;
pub use sampler::{
    SampledTransform, TransformSampler, compose_down, compose_up, sample_local, try_inverse,
};
