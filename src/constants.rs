//! Constants used throughout the application

/// Number of body landmarks reported by the pose estimator
pub const NUM_POSE_LANDMARKS: usize = 33;

/// Minimum shoulder visibility for a confident view or placement
pub const DEFAULT_SHOULDER_VISIBILITY: f32 = 0.5;

/// Normalized shoulder separation below which the body is in profile
pub const DEFAULT_PROFILE_WIDTH: f32 = 0.12;

/// Nose visibility below which the body is facing away
pub const DEFAULT_NOSE_VISIBILITY: f32 = 0.3;

/// Nose-position ratio bounds across the shoulder span
pub const DEFAULT_NOSE_RATIO_LOW: f32 = 0.3;
pub const DEFAULT_NOSE_RATIO_HIGH: f32 = 0.7;

/// Heading bucket lower bounds in degrees
pub const HEADING_RIGHT_START: f32 = 45.0;
pub const HEADING_BACK_START: f32 = 135.0;
pub const HEADING_LEFT_START: f32 = 225.0;
pub const HEADING_FRONT_START: f32 = 315.0;

/// Full circle in degrees
pub const FULL_TURN_DEGREES: f32 = 360.0;

/// Placement factors for front/back views
pub const DEFAULT_K_FRONT: f32 = 2.3;
pub const DEFAULT_FRONT_OFFSET: f32 = 0.28;

/// Placement factors for side views
pub const DEFAULT_K_SIDE: f32 = 1.6;
pub const DEFAULT_SIDE_OFFSET: f32 = 0.45;

/// Horizontal shear per unit of shoulder/hip midpoint offset
pub const DEFAULT_SKEW_COEFFICIENT: f32 = 0.5;

/// Anchor distances below this many pixels are degenerate
pub const DEGENERATE_DISTANCE_PX: f32 = 0.5;

/// Opacity of the flat color layer over the garment
pub const DEFAULT_TINT_OPACITY: f32 = 0.6;

/// Neutral garment color, drawn without tinting
pub const DEFAULT_NEUTRAL_COLOR: &str = "#FFFFFF";

/// Default minimum detection / tracking confidence for the pose estimator
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

/// Numeric precision epsilon
pub const EPSILON: f32 = 1e-6;
