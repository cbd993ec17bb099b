//! Frame renderer and the shared output surface.
//!
//! Every render starts from a full copy of the background, so nothing from
//! a previous tick can survive into the next one. The garment is drawn by
//! inverse-mapping each destination pixel through the placement transform
//! and sampling the asset with nearest-neighbor lookup.

use crate::{
    constants::EPSILON,
    placement::Placement,
    utils::safe_cast::{f32_to_u32_clamp, u32_to_f32},
    Result,
};
use image::{Pixel, RgbaImage};
use log::debug;
use nalgebra::{Matrix3, Vector3};
use parking_lot::Mutex;
use std::{path::Path, sync::Arc};

/// Garment raster space to surface space.
///
/// Centers the asset on the origin, scales it so its width equals
/// `placement.scale`, shears, rotates, then moves it to the placement center.
#[must_use]
pub fn garment_transform(garment_width: u32, garment_height: u32, placement: &Placement) -> Matrix3<f32> {
    let (w, h) = (u32_to_f32(garment_width), u32_to_f32(garment_height));
    let s = placement.scale / w;
    let (sin, cos) = placement.rotation.sin_cos();

    let center_asset = Matrix3::new(1.0, 0.0, -w / 2.0, 0.0, 1.0, -h / 2.0, 0.0, 0.0, 1.0);
    let scale = Matrix3::new(s, 0.0, 0.0, 0.0, s, 0.0, 0.0, 0.0, 1.0);
    let skew = Matrix3::new(1.0, placement.skew_x, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
    let rotate = Matrix3::new(cos, -sin, 0.0, sin, cos, 0.0, 0.0, 0.0, 1.0);
    let translate = Matrix3::new(
        1.0,
        0.0,
        placement.center_x,
        0.0,
        1.0,
        placement.center_y,
        0.0,
        0.0,
        1.0,
    );

    translate * rotate * skew * scale * center_asset
}

/// Compose one output frame into `surface`.
///
/// The surface is resized to the background and fully overwritten. With a
/// garment, it is alpha-blended on top at `placement`. A placement that
/// cannot be inverted draws the background alone.
pub fn render(surface: &mut RgbaImage, background: &RgbaImage, garment: Option<(&RgbaImage, &Placement)>) {
    surface.clone_from(background);

    if let Some((asset, placement)) = garment {
        draw_garment(surface, asset, placement);
    }
}

fn draw_garment(surface: &mut RgbaImage, asset: &RgbaImage, placement: &Placement) {
    if asset.width() == 0 || asset.height() == 0 || surface.width() == 0 || surface.height() == 0 {
        return;
    }
    if !placement.scale.is_finite() || placement.scale < EPSILON {
        return;
    }

    let forward = garment_transform(asset.width(), asset.height(), placement);
    let Some(inverse) = forward.try_inverse() else {
        debug!("Garment transform is singular, drawing background only");
        return;
    };

    // Destination bounding box of the transformed asset corners
    let (aw, ah) = (u32_to_f32(asset.width()), u32_to_f32(asset.height()));
    let corners = [(0.0, 0.0), (aw, 0.0), (0.0, ah), (aw, ah)].map(|(x, y)| forward * Vector3::new(x, y, 1.0));
    let min_x = corners.iter().map(|c| c.x).fold(f32::INFINITY, f32::min);
    let max_x = corners.iter().map(|c| c.x).fold(f32::NEG_INFINITY, f32::max);
    let min_y = corners.iter().map(|c| c.y).fold(f32::INFINITY, f32::min);
    let max_y = corners.iter().map(|c| c.y).fold(f32::NEG_INFINITY, f32::max);
    if !(min_x.is_finite() && max_x.is_finite() && min_y.is_finite() && max_y.is_finite()) {
        return;
    }

    let x0 = f32_to_u32_clamp(min_x.floor(), 0, surface.width());
    let x1 = f32_to_u32_clamp(max_x.ceil(), 0, surface.width());
    let y0 = f32_to_u32_clamp(min_y.floor(), 0, surface.height());
    let y1 = f32_to_u32_clamp(max_y.ceil(), 0, surface.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let src = inverse * Vector3::new(u32_to_f32(x) + 0.5, u32_to_f32(y) + 0.5, 1.0);
            if src.x < 0.0 || src.y < 0.0 || src.x >= aw || src.y >= ah {
                continue;
            }
            let sx = f32_to_u32_clamp(src.x, 0, asset.width() - 1);
            let sy = f32_to_u32_clamp(src.y, 0, asset.height() - 1);
            let texel = asset.get_pixel(sx, sy);
            if texel[3] == 0 {
                continue;
            }
            surface.get_pixel_mut(x, y).blend(texel);
        }
    }
}

/// Output surface shared between the capture loop and its owner.
///
/// `None` inside means the surface has been detached; rendering into a
/// detached surface does nothing.
#[derive(Debug, Clone)]
pub struct SharedSurface {
    inner: Arc<Mutex<Option<RgbaImage>>>,
}

impl Default for SharedSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedSurface {
    /// An attached, empty surface
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(RgbaImage::new(0, 0)))),
        }
    }

    /// A surface that is not attached yet
    #[must_use]
    pub fn detached() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }

    pub fn attach(&self) {
        let mut guard = self.inner.lock();
        if guard.is_none() {
            *guard = Some(RgbaImage::new(0, 0));
        }
    }

    pub fn detach(&self) {
        *self.inner.lock() = None;
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// Render into the surface. Returns `false` when it is detached.
    pub fn render(&self, background: &RgbaImage, garment: Option<(&RgbaImage, &Placement)>) -> bool {
        match self.inner.lock().as_mut() {
            Some(surface) => {
                render(surface, background, garment);
                true
            }
            None => false,
        }
    }

    /// Copy of the last rendered frame
    #[must_use]
    pub fn snapshot(&self) -> Option<RgbaImage> {
        self.inner
            .lock()
            .as_ref()
            .filter(|img| img.width() > 0 && img.height() > 0)
            .cloned()
    }

    /// Write the last rendered frame as an image file.
    ///
    /// Returns `Ok(false)` when there is nothing to write.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be encoded or written.
    pub fn save_snapshot(&self, path: &Path) -> Result<bool> {
        let Some(frame) = self.snapshot() else {
            return Ok(false);
        };
        frame.save(path)?;
        Ok(true)
    }
}
