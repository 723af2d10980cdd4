use glam::Vec3;

/// The coordinate frame in which foot drift is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AnchorSpace {
    /// Feet and root are composed all the way up to the export root.
    #[default]
    ExportRoot,
    /// Feet are composed up to the corrected bone's parent space.
    RootParent,
}

/// Selects which components of the drift offset are removed.
///
/// Vertical is +Y; horizontal covers X and Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisMask {
    pub vertical: bool,
    pub horizontal: bool,
}

impl AxisMask {
    #[must_use]
    pub fn apply(self, offset: Vec3) -> Vec3 {
        Vec3::new(
            if self.horizontal { offset.x } else { 0.0 },
            if self.vertical { offset.y } else { 0.0 },
            if self.horizontal { offset.z } else { 0.0 },
        )
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        !self.vertical && !self.horizontal
    }
}

/// Settings for one correction pass.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CorrectorConfig {
    pub enabled: bool,
    pub correct_vertical: bool,
    pub correct_horizontal: bool,
    pub root_bone_name: String,
    pub left_foot_name: String,
    pub right_foot_name: String,
    /// Frames per second used when a clip does not carry its own rate.
    pub frame_rate: f32,
    pub anchor: AnchorSpace,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            correct_vertical: false,
            correct_horizontal: true,
            root_bone_name: "root".to_string(),
            left_foot_name: "foot_L".to_string(),
            right_foot_name: "foot_R".to_string(),
            frame_rate: 30.0,
            anchor: AnchorSpace::ExportRoot,
        }
    }
}

impl CorrectorConfig {
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_axes(mut self, vertical: bool, horizontal: bool) -> Self {
        self.correct_vertical = vertical;
        self.correct_horizontal = horizontal;
        self
    }

    #[must_use]
    pub fn with_root_bone(mut self, name: impl Into<String>) -> Self {
        self.root_bone_name = name.into();
        self
    }

    #[must_use]
    pub fn with_feet(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.left_foot_name = left.into();
        self.right_foot_name = right.into();
        self
    }

    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: f32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor: AnchorSpace) -> Self {
        self.anchor = anchor;
        self
    }

    #[must_use]
    pub fn axis_mask(&self) -> AxisMask {
        AxisMask {
            vertical: self.correct_vertical,
            horizontal: self.correct_horizontal,
        }
    }
}
