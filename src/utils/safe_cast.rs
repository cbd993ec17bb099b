//! Safe float-to-pixel casting for raster coordinates

/// Clamp and convert f32 to a pixel index in `[min, max]`
///
/// Non-finite values map to `min`.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Acceptable for clamping bounds
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamping ensures safe truncation
pub fn f32_to_u32_clamp(value: f32, min: u32, max: u32) -> u32 {
    // Ensure min <= max
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if !value.is_finite() {
        return min;
    }

    let clamped = value.clamp(min as f32, max as f32);

    // Ensure result is within bounds after conversion
    let result = clamped as u32;
    result.clamp(min, max)
}

/// Convert a pixel dimension to f32 for geometry
#[must_use]
#[allow(clippy::cast_precision_loss)] // Frame sizes are far below 2^24
pub fn u32_to_f32(value: u32) -> f32 {
    value as f32
}
