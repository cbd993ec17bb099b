//! Image conversion between OpenCV Mat and `image` buffers.

use crate::{Error, Result};
use image::{Rgba, RgbaImage};
use opencv::core::{Mat, MatTraitConst, Vec3b, CV_8UC3};

/// Convert an 8-bit BGR OpenCV Mat to an opaque RGBA image
///
/// # Errors
/// * Returns error if the Mat is empty or not `CV_8UC3`
/// * Returns error if Mat data cannot be accessed
pub fn bgr_mat_to_rgba(mat: &Mat) -> Result<RgbaImage> {
    let rows = mat.rows();
    let cols = mat.cols();

    if rows <= 0 || cols <= 0 {
        return Err(Error::InvalidInput(format!("Invalid Mat dimensions: {rows}x{cols}")));
    }
    if mat.typ() != CV_8UC3 {
        return Err(Error::InvalidInput(format!("Expected CV_8UC3 frame, got type {}", mat.typ())));
    }

    let width = u32::try_from(cols).map_err(|e| Error::InvalidInput(e.to_string()))?;
    let height = u32::try_from(rows).map_err(|e| Error::InvalidInput(e.to_string()))?;
    let mut image = RgbaImage::new(width, height);

    for (row, y) in (0..rows).zip(0..height) {
        for (col, x) in (0..cols).zip(0..width) {
            let pixel = mat.at_2d::<Vec3b>(row, col)?;
            image.put_pixel(x, y, Rgba([pixel[2], pixel[1], pixel[0], 255]));
        }
    }

    Ok(image)
}
