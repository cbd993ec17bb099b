//! Transform solver: where, how large and how rotated to draw the garment.
//!
//! Anchors are the two shoulders and, for side views and skew, the two hips.
//! All distances are measured in pixels after scaling the normalized
//! landmark coordinates by the frame's width and height.

use crate::{
    classifier::ViewLabel,
    config::{PlacementConfig, RotationMode},
    constants::{DEFAULT_SHOULDER_VISIBILITY, DEGENERATE_DISTANCE_PX},
    landmarks::{PoseFrame, PoseLandmark},
};
use std::f32::consts::PI;

/// Garment transform for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Garment center, pixels
    pub center_x: f32,
    pub center_y: f32,
    /// Drawn garment width, pixels; height follows the asset's aspect ratio
    pub scale: f32,
    /// Radians, clockwise on screen
    pub rotation: f32,
    /// Horizontal shear factor, 0 when skew is disabled
    pub skew_x: f32,
}

/// Wrap an angle into `(-PI, PI]`
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.sin().atan2(angle.cos());
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

fn midpoint(a: (f32, f32), b: (f32, f32)) -> (f32, f32) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

/// Computes [`Placement`] from anchor landmarks
#[derive(Debug, Clone)]
pub struct TransformSolver {
    config: PlacementConfig,
    visibility_threshold: f32,
}

impl Default for TransformSolver {
    fn default() -> Self {
        Self::new(PlacementConfig::default(), DEFAULT_SHOULDER_VISIBILITY)
    }
}

impl TransformSolver {
    #[must_use]
    pub fn new(config: PlacementConfig, visibility_threshold: f32) -> Self {
        Self {
            config,
            visibility_threshold,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Solve the placement, or `None` when the anchors cannot support one
    #[must_use]
    pub fn solve(&self, pose: &PoseFrame, view: ViewLabel) -> Option<Placement> {
        let cfg = &self.config;
        let (width, height) = (pose.frame_width(), pose.frame_height());

        let left_shoulder = pose.visible(PoseLandmark::LeftShoulder, self.visibility_threshold)?;
        let right_shoulder = pose.visible(PoseLandmark::RightShoulder, self.visibility_threshold)?;
        let left_px = left_shoulder.to_pixel(width, height);
        let right_px = right_shoulder.to_pixel(width, height);

        let shoulder_distance = distance(left_px, right_px);
        if shoulder_distance.is_nan() || shoulder_distance < DEGENERATE_DISTANCE_PX {
            return None;
        }
        let shoulder_mid = midpoint(left_px, right_px);

        let hips = pose
            .visible(PoseLandmark::LeftHip, self.visibility_threshold)
            .zip(pose.visible(PoseLandmark::RightHip, self.visibility_threshold));

        let (scale, offset) = if view.is_side() {
            let (left_hip, right_hip) = hips?;
            let hip_mid = midpoint(left_hip.to_pixel(width, height), right_hip.to_pixel(width, height));
            let torso_height = distance(shoulder_mid, hip_mid);
            if torso_height.is_nan() || torso_height < DEGENERATE_DISTANCE_PX {
                return None;
            }
            let scale = torso_height * cfg.k_side;
            (scale, scale * cfg.side_offset)
        } else {
            let scale = shoulder_distance * cfg.k_front;
            (scale, scale * cfg.front_offset)
        };

        let rotation = match cfg.rotation {
            RotationMode::Upright => 0.0,
            RotationMode::ShoulderTilt => {
                // +PI: left minus right points the wrong way for an upright asset
                wrap_angle((left_px.1 - right_px.1).atan2(left_px.0 - right_px.0) + PI)
            }
        };

        let skew_x = match hips {
            Some((left_hip, right_hip)) if cfg.skew_enabled => {
                let shoulder_mid_x = (left_shoulder.x + right_shoulder.x) / 2.0;
                let hip_mid_x = (left_hip.x + right_hip.x) / 2.0;
                (shoulder_mid_x - hip_mid_x) * cfg.skew_coefficient
            }
            _ => 0.0,
        };

        // Shift down along the garment's own vertical axis
        let center_x = shoulder_mid.0 - offset * rotation.sin();
        let center_y = shoulder_mid.1 + offset * rotation.cos();

        let placement = Placement {
            center_x,
            center_y,
            scale,
            rotation,
            skew_x,
        };
        [center_x, center_y, scale, rotation, skew_x]
            .iter()
            .all(|v| v.is_finite())
            .then_some(placement)
    }
}
