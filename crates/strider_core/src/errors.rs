//! Error Types
//!
//! This module defines the error types used throughout the root-motion tools.
//!
//! # Overview
//!
//! The main error type [`CorrectionError`] covers three failure classes:
//! - Skeleton and data problems (missing bones, bones outside the anchor,
//!   singular ancestor transforms). These are recovered locally: the clip is
//!   exported with its original curves and a warning is logged.
//! - Contract violations (a property the corrector never handles was passed
//!   in). These must abort the caller.
//! - Curve semantics that cannot be corrected without approximation
//!   (raw Euler angle channels).
//!
//! ```rust,ignore
//! use strider_core::errors::{CorrectionError, Result};
//!
//! fn correct() -> Result<()> {
//!     Err(CorrectionError::UnsupportedProperty("weights".into()))
//! }
//! ```

use thiserror::Error;

/// The main error type for curve correction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorrectionError {
    // ========================================================================
    // Skeleton & Configuration Errors
    // ========================================================================
    /// A bone required by the corrector was not found in the rest pose.
    #[error("Invalid skeleton: no {role} bone named '{name}'")]
    MissingBone {
        /// Which bone was looked up ("root", "left foot", "right foot")
        role: &'static str,
        /// The configured bone name
        name: String,
    },

    /// The bone path is not part of the resolved hierarchy.
    #[error("Unknown bone path: '{0}'")]
    UnknownBone(String),

    /// The bone does not descend from the anchor bone.
    #[error("Bone '{bone}' is not a descendant of anchor '{anchor}'")]
    OutsideAnchor {
        /// Path of the bone being resolved
        bone: String,
        /// Path of the anchor boundary
        anchor: String,
    },

    /// An ancestor transform could not be inverted (zero scale).
    #[error("Singular transform on '{path}' at t={time}")]
    SingularTransform {
        /// Path of the bone whose sampled matrix is singular
        path: String,
        /// Sample time in seconds
        time: f32,
    },

    /// The clip frame rate is zero, negative or not finite.
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f32),

    // ========================================================================
    // Contract Violations
    // ========================================================================
    /// The property name is not one the corrector understands.
    #[error("Unsupported property: '{0}'")]
    UnsupportedProperty(String),

    /// The supplied curves belong to a different property than requested.
    #[error("Property mismatch: expected {expected} curves, got {found}")]
    PropertyMismatch {
        /// Property named by the caller
        expected: &'static str,
        /// Property the curves were built for
        found: &'static str,
    },

    /// A property was built with the wrong number of channels.
    #[error("Property '{property}' expects {expected} channels, got {found}")]
    ChannelArity {
        /// Property name
        property: &'static str,
        /// Channel count of the property
        expected: usize,
        /// Channel count supplied
        found: usize,
    },

    // ========================================================================
    // Unsupported Curve Semantics
    // ========================================================================
    /// Euler angle channels cannot be corrected without approximation.
    #[error("Euler angle curves are not supported: '{0}'")]
    EulerAnglesUnsupported(String),
}

impl CorrectionError {
    /// Whether the export may continue with the original curves.
    ///
    /// Skeleton and data problems are recoverable; contract violations and
    /// unsupported curve semantics are not.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingBone { .. }
                | Self::UnknownBone(_)
                | Self::OutsideAnchor { .. }
                | Self::SingularTransform { .. }
                | Self::InvalidFrameRate(_)
        )
    }
}

/// Alias for `Result<T, CorrectionError>`.
pub type Result<T> = std::result::Result<T, CorrectionError>;
