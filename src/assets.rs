//! Garment asset store: one preloaded raster per view label.

use crate::{classifier::ViewLabel, config::AssetConfig, Error, Result};
use image::RgbaImage;
use log::{info, warn};
use std::{collections::HashMap, path::Path, sync::Arc};

/// A loaded garment view; immutable once built
#[derive(Debug, Clone)]
pub struct GarmentAsset {
    view: ViewLabel,
    raster: Arc<RgbaImage>,
}

impl GarmentAsset {
    /// Wrap a decoded raster.
    ///
    /// # Errors
    ///
    /// Returns `AssetError` for an empty raster.
    pub fn new(view: ViewLabel, raster: RgbaImage) -> Result<Self> {
        if raster.width() == 0 || raster.height() == 0 {
            return Err(Error::AssetError(format!("{view} asset has no pixels")));
        }
        Ok(Self {
            view,
            raster: Arc::new(raster),
        })
    }

    #[must_use]
    pub fn view(&self) -> ViewLabel {
        self.view
    }

    #[must_use]
    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    #[must_use]
    pub fn pixel_width(&self) -> u32 {
        self.raster.width()
    }

    #[must_use]
    pub fn pixel_height(&self) -> u32 {
        self.raster.height()
    }
}

/// View label to asset map, shared read-only across ticks
#[derive(Debug, Clone, Default)]
pub struct GarmentAssets {
    assets: HashMap<ViewLabel, GarmentAsset>,
}

impl GarmentAssets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the asset for its view
    pub fn insert(&mut self, asset: GarmentAsset) {
        self.assets.insert(asset.view(), asset);
    }

    /// Asset for `view`, `None` while it is not loaded
    #[must_use]
    pub fn get(&self, view: ViewLabel) -> Option<&GarmentAsset> {
        self.assets.get(&view)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Views with no asset yet
    #[must_use]
    pub fn missing(&self) -> Vec<ViewLabel> {
        ViewLabel::ALL
            .into_iter()
            .filter(|view| !self.assets.contains_key(view))
            .collect()
    }

    /// Load every configured view file from disk.
    ///
    /// A file that is missing or fails to decode leaves that view not ready.
    ///
    /// # Errors
    ///
    /// Returns `AssetError` when no view could be loaded at all.
    pub fn load_dir(config: &AssetConfig) -> Result<Self> {
        let mut assets = Self::new();
        for (view, file) in [
            (ViewLabel::Front, &config.front),
            (ViewLabel::Back, &config.back),
            (ViewLabel::Left, &config.left),
            (ViewLabel::Right, &config.right),
        ] {
            let path = config.directory.join(file);
            match load_raster(&path).and_then(|raster| GarmentAsset::new(view, raster)) {
                Ok(asset) => {
                    info!(
                        "Loaded {} asset {} ({}x{})",
                        view,
                        path.display(),
                        asset.pixel_width(),
                        asset.pixel_height()
                    );
                    assets.insert(asset);
                }
                Err(e) => warn!("{} asset unavailable: {}", view, e),
            }
        }

        if assets.is_empty() {
            return Err(Error::AssetError(format!(
                "No garment assets found in {}",
                config.directory.display()
            )));
        }
        Ok(assets)
    }

    /// [`GarmentAssets::load_dir`] on the blocking thread pool
    pub async fn load_dir_async(config: AssetConfig) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::load_dir(&config))
            .await
            .map_err(|e| Error::AssetError(format!("Asset loader task failed: {e}")))?
    }
}

fn load_raster(path: &Path) -> Result<RgbaImage> {
    Ok(image::open(path)?.to_rgba8())
}
