//! Orientation adapter: device rotation or pointer position to a heading.
//!
//! Headings are degrees in `[0, 360)`. A device sensor is preferred; when
//! the platform refuses or lacks it the adapter switches to pointer input
//! and the session carries on.

use crate::constants::FULL_TURN_DEGREES;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Wrap any angle in degrees into `[0, 360)`
#[must_use]
pub fn normalize_heading(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    ((degrees % FULL_TURN_DEGREES) + FULL_TURN_DEGREES) % FULL_TURN_DEGREES
}

/// Map a pointer x position across a surface of `width` to a heading
#[must_use]
pub fn heading_from_pointer(x: f32, width: f32) -> f32 {
    if !width.is_finite() || width <= 0.0 || !x.is_finite() {
        return 0.0;
    }
    let fraction = (x / width).clamp(0.0, 1.0);
    normalize_heading(fraction * FULL_TURN_DEGREES)
}

/// A normalized heading reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationSample {
    pub heading_degrees: f32,
}

impl OrientationSample {
    #[must_use]
    pub fn new(degrees: f32) -> Self {
        Self {
            heading_degrees: normalize_heading(degrees),
        }
    }
}

/// Outcome of asking the platform for device-rotation access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationPermission {
    Granted,
    Denied,
    Unsupported,
}

/// Where headings currently come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingSource {
    /// Device rotation sensor
    Device,
    /// Horizontal pointer position over the preview
    Pointer,
}

/// Tracks the active heading source and the latest reading
#[derive(Debug, Clone)]
pub struct OrientationAdapter {
    source: HeadingSource,
    heading: f32,
}

impl Default for OrientationAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl OrientationAdapter {
    /// Start in pointer mode until device access is granted
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: HeadingSource::Pointer,
            heading: 0.0,
        }
    }

    /// Apply the platform's answer to a device-rotation permission request
    pub fn apply_permission(&mut self, permission: OrientationPermission) -> HeadingSource {
        self.source = match permission {
            OrientationPermission::Granted => {
                info!("Device orientation granted, using sensor heading");
                HeadingSource::Device
            }
            OrientationPermission::Denied => {
                warn!("Device orientation denied, falling back to pointer heading");
                HeadingSource::Pointer
            }
            OrientationPermission::Unsupported => {
                warn!("Device orientation unsupported, falling back to pointer heading");
                HeadingSource::Pointer
            }
        };
        self.source
    }

    /// Switch back to pointer control
    pub fn use_pointer(&mut self) {
        self.source = HeadingSource::Pointer;
    }

    #[must_use]
    pub fn source(&self) -> HeadingSource {
        self.source
    }

    /// Feed a device rotation event; ignored unless the sensor is active.
    ///
    /// A missing reading counts as 0 degrees.
    pub fn on_device_rotation(&mut self, alpha: Option<f32>) -> Option<OrientationSample> {
        if self.source != HeadingSource::Device {
            return None;
        }
        self.heading = normalize_heading(alpha.unwrap_or(0.0));
        Some(self.sample())
    }

    /// Feed a pointer move; ignored while the sensor is active
    pub fn on_pointer_move(&mut self, x: f32, width: f32) -> Option<OrientationSample> {
        if self.source != HeadingSource::Pointer {
            return None;
        }
        self.heading = heading_from_pointer(x, width);
        Some(self.sample())
    }

    /// Latest heading
    #[must_use]
    pub fn sample(&self) -> OrientationSample {
        OrientationSample {
            heading_degrees: self.heading,
        }
    }
}
