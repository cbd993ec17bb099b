//! Utility functions for raster coordinates and frame conversion.

pub mod safe_cast;
#[cfg(feature = "camera")]
pub mod image_conversion;
