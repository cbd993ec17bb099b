//! View classification: which side of the body faces the camera.
//!
//! Classification is stateless. Each call looks only at the landmarks and
//! heading it is given. Smoothing across ticks belongs to
//! [`crate::smoothing::ViewDebouncer`].
//!
//! Two signals are available:
//!
//! - **Geometry**: shoulder separation tells profile from square-on, the
//!   nose position across the shoulder span tells a turned head, and nose
//!   visibility tells facing-away from facing-camera.
//! - **Heading**: a device or pointer angle bucketed into four quarter turns.

use crate::{
    config::{ClassifierConfig, ClassifierMode},
    constants::{HEADING_BACK_START, HEADING_FRONT_START, HEADING_LEFT_START, HEADING_RIGHT_START},
    landmarks::{PoseFrame, PoseLandmark},
    orientation::normalize_heading,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Garment art variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewLabel {
    Front,
    Back,
    Left,
    Right,
}

impl ViewLabel {
    pub const ALL: [ViewLabel; 4] = [ViewLabel::Front, ViewLabel::Back, ViewLabel::Left, ViewLabel::Right];

    /// Left and right exchanged; front and back unchanged
    #[must_use]
    pub fn mirrored(self) -> Self {
        match self {
            ViewLabel::Left => ViewLabel::Right,
            ViewLabel::Right => ViewLabel::Left,
            other => other,
        }
    }

    /// Side views are scaled from torso height instead of shoulder width
    #[must_use]
    pub fn is_side(self) -> bool {
        matches!(self, ViewLabel::Left | ViewLabel::Right)
    }
}

impl fmt::Display for ViewLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewLabel::Front => "Front",
            ViewLabel::Back => "Back",
            ViewLabel::Left => "Left",
            ViewLabel::Right => "Right",
        };
        f.write_str(name)
    }
}

/// Bucket a heading into a view. Lower bounds are inclusive.
#[must_use]
pub fn view_from_heading(degrees: f32) -> ViewLabel {
    let heading = normalize_heading(degrees);
    if (HEADING_RIGHT_START..HEADING_BACK_START).contains(&heading) {
        ViewLabel::Right
    } else if (HEADING_BACK_START..HEADING_LEFT_START).contains(&heading) {
        ViewLabel::Back
    } else if (HEADING_LEFT_START..HEADING_FRONT_START).contains(&heading) {
        ViewLabel::Left
    } else {
        ViewLabel::Front
    }
}

/// Stateless view classifier
#[derive(Debug, Clone, Default)]
pub struct ViewClassifier {
    config: ClassifierConfig,
}

impl ViewClassifier {
    #[must_use]
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one tick. `None` means no confident view: skip the overlay.
    #[must_use]
    pub fn classify(&self, pose: &PoseFrame, heading: Option<f32>) -> Option<ViewLabel> {
        match self.config.mode {
            ClassifierMode::Geometry => self.classify_geometry(pose),
            ClassifierMode::Heading => heading.map(view_from_heading),
            ClassifierMode::Auto => self
                .classify_geometry(pose)
                .or_else(|| heading.map(view_from_heading)),
        }
    }

    /// Classify from landmark geometry alone
    #[must_use]
    pub fn classify_geometry(&self, pose: &PoseFrame) -> Option<ViewLabel> {
        let cfg = &self.config;
        let left = pose.visible(PoseLandmark::LeftShoulder, cfg.shoulder_visibility)?;
        let right = pose.visible(PoseLandmark::RightShoulder, cfg.shoulder_visibility)?;
        let nose = pose.get(PoseLandmark::Nose)?;

        let nose_hidden = nose.confidence() < cfg.nose_visibility;
        let separation = (left.x - right.x).abs();

        // Labels below are for a mirrored feed
        let view = if separation < cfg.profile_width {
            if nose_hidden {
                ViewLabel::Back
            } else if left.z < right.z {
                ViewLabel::Right
            } else {
                ViewLabel::Left
            }
        } else if nose_hidden {
            ViewLabel::Back
        } else {
            let ratio = (nose.x - right.x) / (left.x - right.x);
            if ratio < cfg.nose_ratio_low {
                ViewLabel::Left
            } else if ratio > cfg.nose_ratio_high {
                ViewLabel::Right
            } else {
                ViewLabel::Front
            }
        };

        Some(if cfg.mirrored { view } else { view.mirrored() })
    }
}
