use glam::{Quat, Vec3};
use smallvec::SmallVec;
use strider_core::{CorrectionError, Result};

use crate::curve::ChannelCurve;

/// Defines the animated property a set of channel curves drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Translation, // x, y, z
    Rotation,    // quaternion x, y, z, w
    Scale,       // x, y, z
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 3] = [Self::Translation, Self::Rotation, Self::Scale];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Translation => "translation",
            Self::Rotation => "rotation",
            Self::Scale => "scale",
        }
    }

    #[must_use]
    pub fn channel_count(self) -> usize {
        match self {
            Self::Rotation => 4,
            Self::Translation | Self::Scale => 3,
        }
    }

    /// Channel values used where a channel has no curve.
    #[must_use]
    pub fn identity_channels(self) -> [f32; 4] {
        match self {
            Self::Translation => [0.0, 0.0, 0.0, 0.0],
            Self::Rotation => [0.0, 0.0, 0.0, 1.0],
            Self::Scale => [1.0, 1.0, 1.0, 0.0],
        }
    }

    /// Parses an exporter property name.
    ///
    /// Euler angle channels are rejected explicitly; anything else unknown is
    /// a contract violation.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "translation" => Ok(Self::Translation),
            "rotation" => Ok(Self::Rotation),
            "scale" => Ok(Self::Scale),
            "euler_angles" | "rotation_euler" => {
                Err(CorrectionError::EulerAnglesUnsupported(name.to_string()))
            }
            _ => Err(CorrectionError::UnsupportedProperty(name.to_string())),
        }
    }
}

/// The channel curves of one animated property.
///
/// Channels are positional (`x, y, z[, w]`); a `None` slot means that
/// channel was never animated and contributes its identity value.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyCurves {
    kind: PropertyKind,
    channels: SmallVec<[Option<ChannelCurve>; 4]>,
}

impl PropertyCurves {
    pub fn new(kind: PropertyKind, channels: Vec<Option<ChannelCurve>>) -> Result<Self> {
        if channels.len() != kind.channel_count() {
            return Err(CorrectionError::ChannelArity {
                property: kind.name(),
                expected: kind.channel_count(),
                found: channels.len(),
            });
        }
        Ok(Self {
            kind,
            channels: SmallVec::from_vec(channels),
        })
    }

    #[must_use]
    pub fn translation(
        x: Option<ChannelCurve>,
        y: Option<ChannelCurve>,
        z: Option<ChannelCurve>,
    ) -> Self {
        Self {
            kind: PropertyKind::Translation,
            channels: SmallVec::from_iter([x, y, z]),
        }
    }

    #[must_use]
    pub fn rotation(
        x: Option<ChannelCurve>,
        y: Option<ChannelCurve>,
        z: Option<ChannelCurve>,
        w: Option<ChannelCurve>,
    ) -> Self {
        Self {
            kind: PropertyKind::Rotation,
            channels: SmallVec::from_iter([x, y, z, w]),
        }
    }

    #[must_use]
    pub fn scale(
        x: Option<ChannelCurve>,
        y: Option<ChannelCurve>,
        z: Option<ChannelCurve>,
    ) -> Self {
        Self {
            kind: PropertyKind::Scale,
            channels: SmallVec::from_iter([x, y, z]),
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    #[must_use]
    pub fn channel(&self, index: usize) -> Option<&ChannelCurve> {
        self.channels.get(index).and_then(Option::as_ref)
    }

    /// True if no channel carries any keyframe.
    #[must_use]
    pub fn is_unanimated(&self) -> bool {
        self.channels
            .iter()
            .all(|c| c.as_ref().is_none_or(ChannelCurve::is_empty))
    }

    /// Latest keyframe time across all channels.
    #[must_use]
    pub fn end_time(&self) -> Option<f32> {
        self.channels
            .iter()
            .flatten()
            .filter_map(ChannelCurve::end_time)
            .reduce(f32::max)
    }

    /// Samples every channel, substituting identity values for absent ones.
    #[must_use]
    pub fn sample_channels(&self, time: f32) -> [f32; 4] {
        let mut out = self.kind.identity_channels();
        for (slot, curve) in out.iter_mut().zip(&self.channels) {
            if let Some(value) = curve.as_ref().and_then(|c| c.sample(time)) {
                *slot = value;
            }
        }
        out
    }

    #[must_use]
    pub fn sample_vec3(&self, time: f32) -> Vec3 {
        let [x, y, z, _] = self.sample_channels(time);
        Vec3::new(x, y, z)
    }

    /// Samples the quaternion and re-normalizes it.
    ///
    /// Channels are interpolated independently, so the raw sample is not
    /// unit length. Degenerate samples collapse to identity.
    #[must_use]
    pub fn sample_quat(&self, time: f32) -> Quat {
        let [x, y, z, w] = self.sample_channels(time);
        normalize_or_identity(Quat::from_xyzw(x, y, z, w))
    }
}

#[must_use]
pub fn normalize_or_identity(q: Quat) -> Quat {
    let len_sq = q.length_squared();
    if len_sq.is_finite() && len_sq > 1e-12 {
        q * len_sq.sqrt().recip()
    } else {
        Quat::IDENTITY
    }
}
