//! # Strider
//!
//! Root-motion correction for skeletal animation curves prior to export.
//!
//! Bone paths and the error taxonomy are re-exported at the top level; the
//! curve model, hierarchy, sampling and the corrector live in [`animation`].

pub use strider_animation as animation;

pub use strider_animation::{
    AnchorSpace, AxisMask, ChannelCurve, ClipInfo, Correction, CorrectorConfig, CurveGroup,
    CurveGroupSet, InterpolationMode, PropertyCurves, PropertyKind, RestPose,
    RootMotionCorrector, SampledTransform,
};
pub use strider_core::{BonePath, CorrectionError, Result};

pub mod prelude {
    pub use crate::{
        AnchorSpace, BonePath, ChannelCurve, ClipInfo, Correction, CorrectionError,
        CorrectorConfig, CurveGroup, CurveGroupSet, PropertyCurves, RestPose,
        RootMotionCorrector,
    };
    pub use glam::Vec3;
}
