//! Per-tick composite: classify, place, tint and render one frame.
//!
//! The pipeline is synchronous and owns all state that persists between
//! ticks (the view debouncer and the tint cache). The async capture loop in
//! [`crate::app`] drives it once per inference result.

use crate::{
    assets::GarmentAssets,
    classifier::{ViewClassifier, ViewLabel},
    config::Config,
    frame::VideoFrame,
    landmarks::PoseFrame,
    placement::{Placement, TransformSolver},
    render::SharedSurface,
    smoothing::ViewDebouncer,
    tint::{Color, ColorCompositor, TintCache},
};
use image::RgbaImage;
use log::debug;
use std::{borrow::Cow, fmt, sync::Arc};

/// Settings read once at the start of every tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSettings {
    /// Garment color; the neutral color draws the asset untinted
    pub color: Color,
    /// Current heading in degrees, when a heading source is active
    pub heading: Option<f32>,
}

impl Default for TickSettings {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            heading: None,
        }
    }
}

/// Why a tick drew the background alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No confident view this tick
    NoView,
    /// Anchors missing or degenerate
    NoPlacement,
    /// The asset for the chosen view is not loaded
    AssetNotReady,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NoView => "no confident view",
            SkipReason::NoPlacement => "no placement",
            SkipReason::AssetNotReady => "asset not ready",
        };
        f.write_str(text)
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// View used for this tick, after debouncing
    pub view: Option<ViewLabel>,
    /// Solved garment transform
    pub placement: Option<Placement>,
    /// Set when the garment was not drawn
    pub skipped: Option<SkipReason>,
    /// False when the surface was detached and nothing was written
    pub rendered: bool,
}

impl TickOutcome {
    /// Whether the garment was drawn this tick
    #[must_use]
    pub fn garment_drawn(&self) -> bool {
        self.rendered && self.skipped.is_none()
    }
}

/// Frame composite pipeline
#[derive(Debug)]
pub struct Pipeline {
    classifier: ViewClassifier,
    debouncer: ViewDebouncer,
    solver: TransformSolver,
    compositor: ColorCompositor,
    tint_cache: Option<TintCache>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Pipeline {
    /// Build a pipeline from configuration
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            classifier: ViewClassifier::new(config.classifier.clone()),
            debouncer: ViewDebouncer::new(config.classifier.debounce_ticks),
            solver: TransformSolver::new(config.placement.clone(), config.classifier.shoulder_visibility),
            compositor: ColorCompositor::new(config.tint.neutral_color, config.tint.opacity),
            tint_cache: config.tint.cache.then(TintCache::new),
        }
    }

    #[must_use]
    pub fn classifier(&self) -> &ViewClassifier {
        &self.classifier
    }

    /// Classify, debounce and solve the placement for one pose
    pub fn plan(&mut self, pose: &PoseFrame, heading: Option<f32>) -> (Option<ViewLabel>, Option<Placement>) {
        let observed = self.classifier.classify(pose, heading);
        let view = self.debouncer.update(observed);
        let placement = view.and_then(|v| self.solver.solve(pose, v));
        (view, placement)
    }

    /// Run one tick and render into `surface`
    pub fn composite(
        &mut self,
        surface: &SharedSurface,
        frame: &VideoFrame,
        pose: &PoseFrame,
        assets: &GarmentAssets,
        settings: &TickSettings,
    ) -> TickOutcome {
        let (view, placement) = self.plan(pose, settings.heading);

        let skipped = match (view, placement) {
            (None, _) => Some(SkipReason::NoView),
            (Some(_), None) => Some(SkipReason::NoPlacement),
            (Some(v), Some(_)) if assets.get(v).is_none() => Some(SkipReason::AssetNotReady),
            _ => None,
        };

        let rendered = match (view.and_then(|v| assets.get(v)), placement, skipped) {
            (Some(asset), Some(placement), None) => {
                let cached: Arc<RgbaImage>;
                let fresh: Cow<'_, RgbaImage>;
                let raster: &RgbaImage = match self.tint_cache.as_mut() {
                    Some(cache) if settings.color != self.compositor.neutral() => {
                        cached = cache.get_or_tint(&self.compositor, asset.view(), asset.raster(), settings.color);
                        &cached
                    }
                    _ => {
                        fresh = self.compositor.tint(asset.raster(), settings.color);
                        &fresh
                    }
                };
                surface.render(&frame.image, Some((raster, &placement)))
            }
            _ => {
                if let Some(reason) = skipped {
                    debug!("Frame {}: drawing background only ({})", frame.sequence, reason);
                }
                surface.render(&frame.image, None)
            }
        };

        TickOutcome {
            view,
            placement,
            skipped,
            rendered,
        }
    }

}
