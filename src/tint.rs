//! Color compositor: recolor a garment while keeping its shading.
//!
//! Opaque pixels receive a flat fill of the requested color at a fixed
//! opacity over the original pixel, so folds and texture show through. The
//! alpha channel is never modified, so the garment silhouette is unchanged.
//! The neutral color skips all of this and hands back the asset as-is.

use crate::{classifier::ViewLabel, constants::DEFAULT_TINT_OPACITY, Error};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::HashMap, fmt, str::FromStr, sync::Arc};

/// An sRGB color, written `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(0xFF, 0xFF, 0xFF);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::ColorParse(format!("Expected #RRGGBB, got {s:?}")));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| Error::ColorParse(format!("{s:?}: {e}")))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Recolors garment rasters
#[derive(Debug, Clone)]
pub struct ColorCompositor {
    neutral: Color,
    opacity: f32,
}

impl Default for ColorCompositor {
    fn default() -> Self {
        Self::new(Color::WHITE, DEFAULT_TINT_OPACITY)
    }
}

impl ColorCompositor {
    #[must_use]
    pub fn new(neutral: Color, opacity: f32) -> Self {
        Self {
            neutral,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn neutral(&self) -> Color {
        self.neutral
    }

    /// Tint `asset` with `color`; the neutral color borrows the asset untouched
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamped to the u8 range
    pub fn tint<'a>(&self, asset: &'a RgbaImage, color: Color) -> Cow<'a, RgbaImage> {
        if color == self.neutral {
            return Cow::Borrowed(asset);
        }

        let fill = [f32::from(color.r), f32::from(color.g), f32::from(color.b)];
        let keep = 1.0 - self.opacity;
        let mut tinted = asset.clone();
        for pixel in tinted.pixels_mut() {
            if pixel[3] == 0 {
                continue;
            }
            for (channel, target) in pixel.0[..3].iter_mut().zip(fill) {
                let blended = f32::from(*channel) * keep + target * self.opacity;
                *channel = blended.round().clamp(0.0, 255.0) as u8;
            }
        }
        Cow::Owned(tinted)
    }
}

/// Memoized tints keyed by view, valid for a single color at a time
#[derive(Debug, Default)]
pub struct TintCache {
    color: Option<Color>,
    entries: HashMap<ViewLabel, Arc<RgbaImage>>,
}

impl TintCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tinted asset for `view` in `color`, computing it on first use.
    ///
    /// A change of color drops every cached entry.
    pub fn get_or_tint(
        &mut self,
        compositor: &ColorCompositor,
        view: ViewLabel,
        asset: &RgbaImage,
        color: Color,
    ) -> Arc<RgbaImage> {
        if self.color != Some(color) {
            self.entries.clear();
            self.color = Some(color);
        }
        Arc::clone(
            self.entries
                .entry(view)
                .or_insert_with(|| Arc::new(compositor.tint(asset, color).into_owned())),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
