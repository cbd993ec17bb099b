//! Configuration management for the garment overlay application

use crate::{
    constants::{
        DEFAULT_FRONT_OFFSET, DEFAULT_K_FRONT, DEFAULT_K_SIDE, DEFAULT_MIN_CONFIDENCE,
        DEFAULT_NOSE_RATIO_HIGH, DEFAULT_NOSE_RATIO_LOW, DEFAULT_NOSE_VISIBILITY, DEFAULT_PROFILE_WIDTH,
        DEFAULT_SHOULDER_VISIBILITY, DEFAULT_SIDE_OFFSET, DEFAULT_SKEW_COEFFICIENT, DEFAULT_TINT_OPACITY,
    },
    orientation::HeadingSource,
    tint::Color,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings handed to the pose estimator
    pub pose: PoseSourceConfig,

    /// View classification
    pub classifier: ClassifierConfig,

    /// Garment placement
    pub placement: PlacementConfig,

    /// Garment recoloring
    pub tint: TintConfig,

    /// Garment asset files
    pub assets: AssetConfig,

    /// Heading input
    pub orientation: OrientationConfig,

    /// Rendered output
    pub output: OutputConfig,
}

/// Pose estimator knobs; the estimator itself is external
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseSourceConfig {
    /// Model complexity level (0-2)
    pub model_complexity: u8,

    /// Temporal landmark smoothing inside the estimator
    pub smooth_landmarks: bool,

    /// Minimum detection confidence (0.0-1.0)
    pub min_detection_confidence: f32,

    /// Minimum tracking confidence (0.0-1.0)
    pub min_tracking_confidence: f32,
}

/// How the view label is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    /// Landmark geometry only
    Geometry,
    /// Orientation heading only
    Heading,
    /// Geometry, with the heading as fallback when shoulders are not confident
    Auto,
}

/// View classifier thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub mode: ClassifierMode,

    /// Front-facing camera feed; swaps left/right labels
    pub mirrored: bool,

    /// Minimum shoulder visibility
    pub shoulder_visibility: f32,

    /// Normalized shoulder separation below which the body is in profile
    pub profile_width: f32,

    /// Nose visibility below which the body faces away
    pub nose_visibility: f32,

    /// Nose ratio below which the view is Left
    pub nose_ratio_low: f32,

    /// Nose ratio above which the view is Right
    pub nose_ratio_high: f32,

    /// Consecutive agreeing ticks before a new view is committed (1 = none)
    pub debounce_ticks: usize,
}

/// Garment rotation policy, fixed for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Always drawn upright
    Upright,
    /// Follows the shoulder line
    ShoulderTilt,
}

/// Transform solver factors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub rotation: RotationMode,

    /// Apply perspective shear from the shoulder/hip offset
    pub skew_enabled: bool,

    /// Garment width per pixel of shoulder distance (front/back)
    pub k_front: f32,

    /// Downward center offset as a fraction of scale (front/back)
    pub front_offset: f32,

    /// Garment width per pixel of torso height (left/right)
    pub k_side: f32,

    /// Downward center offset as a fraction of scale (left/right)
    pub side_offset: f32,

    /// Shear per normalized unit of shoulder/hip midpoint offset
    pub skew_coefficient: f32,
}

/// Garment recoloring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TintConfig {
    /// Color drawn without any tinting
    pub neutral_color: Color,

    /// Opacity of the flat color layer (0.0-1.0)
    pub opacity: f32,

    /// Colors offered for selection
    pub palette: Vec<Color>,

    /// Memoize tinted assets per (view, color)
    pub cache: bool,
}

/// Garment asset file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub directory: PathBuf,
    pub front: String,
    pub back: String,
    pub left: String,
    pub right: String,
}

/// Heading input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Preferred source; device access may still fall back to pointer
    pub source: HeadingSource,
}

/// Rendered output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for composited frames
    pub directory: PathBuf,

    /// Write every composited frame, not only the final snapshot
    pub write_frames: bool,
}

impl Default for PoseSourceConfig {
    fn default() -> Self {
        Self {
            model_complexity: 1,
            smooth_landmarks: true,
            min_detection_confidence: DEFAULT_MIN_CONFIDENCE,
            min_tracking_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            mode: ClassifierMode::Geometry,
            mirrored: true,
            shoulder_visibility: DEFAULT_SHOULDER_VISIBILITY,
            profile_width: DEFAULT_PROFILE_WIDTH,
            nose_visibility: DEFAULT_NOSE_VISIBILITY,
            nose_ratio_low: DEFAULT_NOSE_RATIO_LOW,
            nose_ratio_high: DEFAULT_NOSE_RATIO_HIGH,
            debounce_ticks: 1,
        }
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            rotation: RotationMode::Upright,
            skew_enabled: false,
            k_front: DEFAULT_K_FRONT,
            front_offset: DEFAULT_FRONT_OFFSET,
            k_side: DEFAULT_K_SIDE,
            side_offset: DEFAULT_SIDE_OFFSET,
            skew_coefficient: DEFAULT_SKEW_COEFFICIENT,
        }
    }
}

impl Default for TintConfig {
    fn default() -> Self {
        Self {
            neutral_color: Color::WHITE,
            opacity: DEFAULT_TINT_OPACITY,
            palette: vec![
                Color::WHITE,
                Color::new(0x1F, 0x1F, 0x1F),
                Color::new(0xE1, 0x1D, 0x48),
                Color::new(0x25, 0x63, 0xEB),
                Color::new(0x16, 0xA3, 0x4A),
                Color::new(0xF5, 0x9E, 0x0B),
            ],
            cache: true,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("assets"),
            front: "front.png".to_string(),
            back: "back.png".to_string(),
            left: "left.png".to_string(),
            right: "right.png".to_string(),
        }
    }
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            source: HeadingSource::Pointer,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            write_frames: true,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Pose estimator knobs
        if self.pose.model_complexity > 2 {
            return Err(Error::ConfigError("Model complexity must be 0, 1 or 2".to_string()));
        }
        for (name, value) in [
            ("Minimum detection confidence", self.pose.min_detection_confidence),
            ("Minimum tracking confidence", self.pose.min_tracking_confidence),
            ("Shoulder visibility", self.classifier.shoulder_visibility),
            ("Nose visibility", self.classifier.nose_visibility),
            ("Tint opacity", self.tint.opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::ConfigError(format!("{name} must be between 0.0 and 1.0")));
            }
        }

        // Classifier geometry
        if self.classifier.profile_width <= 0.0 {
            return Err(Error::ConfigError("Profile width must be greater than 0".to_string()));
        }
        if self.classifier.nose_ratio_low >= self.classifier.nose_ratio_high {
            return Err(Error::ConfigError(
                "Nose ratio low bound must be below the high bound".to_string(),
            ));
        }
        if self.classifier.debounce_ticks == 0 {
            return Err(Error::ConfigError("Debounce ticks must be at least 1".to_string()));
        }

        // Placement factors
        if self.placement.k_front <= 0.0 || self.placement.k_side <= 0.0 {
            return Err(Error::ConfigError("Scale factors must be greater than 0".to_string()));
        }

        // Palette
        if self.tint.palette.is_empty() {
            return Err(Error::ConfigError("Palette must contain at least one color".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r##"# Garment Overlay Configuration

# Pose estimator settings
pose:
  model_complexity: 1
  smooth_landmarks: true
  min_detection_confidence: 0.5
  min_tracking_confidence: 0.5

# View classification
classifier:
  mode: "geometry"
  mirrored: true
  shoulder_visibility: 0.5
  profile_width: 0.12
  nose_visibility: 0.3
  nose_ratio_low: 0.3
  nose_ratio_high: 0.7
  debounce_ticks: 1

# Garment placement
placement:
  rotation: "upright"
  skew_enabled: false
  k_front: 2.3
  front_offset: 0.28
  k_side: 1.6
  side_offset: 0.45
  skew_coefficient: 0.5

# Recoloring
tint:
  neutral_color: "#FFFFFF"
  opacity: 0.6
  palette: ["#FFFFFF", "#1F1F1F", "#E11D48", "#2563EB", "#16A34A", "#F59E0B"]
  cache: true

# Garment assets
assets:
  directory: "assets"
  front: "front.png"
  back: "back.png"
  left: "left.png"
  right: "right.png"

# Heading input
orientation:
  source: "pointer"

# Output
output:
  directory: "output"
  write_frames: true
"##;
