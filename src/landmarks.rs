//! Body landmark data model and the pose-estimation seam.
//!
//! The pose estimator itself lives outside this crate. It is reached through
//! [`LandmarkSource`], which turns one [`VideoFrame`] into a [`PoseFrame`]:
//! either the full, positionally indexed set of 33 landmarks or an empty set
//! when no body was detected.

use crate::{config::PoseSourceConfig, constants::NUM_POSE_LANDMARKS, frame::VideoFrame, Error, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Named landmark slots, in the estimator's fixed output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseLandmark {
    pub const COUNT: usize = NUM_POSE_LANDMARKS;

    /// Slot position in a [`PoseFrame`]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A single estimated keypoint
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    /// Normalized horizontal position (0.0-1.0)
    pub x: f32,
    /// Normalized vertical position (0.0-1.0)
    pub y: f32,
    /// Relative depth, unitless; smaller is closer to the camera
    #[serde(default)]
    pub z: f32,
    /// Detection confidence (0.0-1.0), if the estimator reports one
    #[serde(default)]
    pub visibility: Option<f32>,
}

impl Landmark {
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: Some(visibility),
        }
    }

    /// Reported visibility; an estimator that omits it is taken at its word.
    #[must_use]
    pub fn confidence(&self) -> f32 {
        self.visibility.unwrap_or(1.0)
    }

    /// Whether visibility is at or above `threshold`
    #[must_use]
    pub fn is_visible(&self, threshold: f32) -> bool {
        self.confidence() >= threshold
    }

    /// Position in pixels for a frame of the given size
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_pixel(&self, width: u32, height: u32) -> (f32, f32) {
        (self.x * width as f32, self.y * height as f32)
    }
}

/// Landmarks for one video frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoseFrame")]
pub struct PoseFrame {
    landmarks: Vec<Landmark>,
    frame_width: u32,
    frame_height: u32,
}

#[derive(Deserialize)]
struct RawPoseFrame {
    #[serde(default)]
    landmarks: Vec<Landmark>,
    frame_width: u32,
    frame_height: u32,
}

impl TryFrom<RawPoseFrame> for PoseFrame {
    type Error = Error;

    fn try_from(raw: RawPoseFrame) -> Result<Self> {
        Self::new(raw.landmarks, raw.frame_width, raw.frame_height)
    }
}

impl PoseFrame {
    /// Create a pose frame from a complete landmark set or an empty one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a partial landmark set or a zero-sized frame.
    pub fn new(landmarks: Vec<Landmark>, frame_width: u32, frame_height: u32) -> Result<Self> {
        if !landmarks.is_empty() && landmarks.len() != PoseLandmark::COUNT {
            return Err(Error::InvalidInput(format!(
                "Expected 0 or {} landmarks, got {}",
                PoseLandmark::COUNT,
                landmarks.len()
            )));
        }
        if frame_width == 0 || frame_height == 0 {
            return Err(Error::InvalidInput(format!(
                "Invalid frame dimensions: {frame_width}x{frame_height}"
            )));
        }

        Ok(Self {
            landmarks,
            frame_width,
            frame_height,
        })
    }

    /// A frame in which no body was detected
    #[must_use]
    pub fn empty(frame_width: u32, frame_height: u32) -> Self {
        Self {
            landmarks: Vec::new(),
            frame_width: frame_width.max(1),
            frame_height: frame_height.max(1),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Landmark at a named slot, `None` when nothing was detected
    #[must_use]
    pub fn get(&self, landmark: PoseLandmark) -> Option<&Landmark> {
        self.landmarks.get(landmark.index())
    }

    /// Landmark at a named slot if its visibility reaches `threshold`
    #[must_use]
    pub fn visible(&self, landmark: PoseLandmark, threshold: f32) -> Option<&Landmark> {
        self.get(landmark).filter(|lm| lm.is_visible(threshold))
    }

    #[must_use]
    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    #[must_use]
    pub fn frame_width(&self) -> u32 {
        self.frame_width
    }

    #[must_use]
    pub fn frame_height(&self) -> u32 {
        self.frame_height
    }
}

/// The pose-estimation collaborator.
///
/// `estimate` is the only suspension point inside a tick.
pub trait LandmarkSource: Send {
    /// Apply estimator settings before the first frame.
    ///
    /// Called once per session by the capture loop. Sources without
    /// tunable settings can ignore it.
    fn configure(&mut self, _config: &PoseSourceConfig) {}

    /// Estimate body landmarks for one frame
    fn estimate(&mut self, frame: &VideoFrame) -> impl Future<Output = Result<PoseFrame>> + Send;
}
