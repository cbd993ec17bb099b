//! Pose-guided garment overlay for live camera frames.
//!
//! This library places a flat garment image onto each video frame, aligned
//! to the wearer's body pose:
//! - A landmark source (pose model) supplies 33 body landmarks per frame
//! - The view classifier picks the front, back, left or right garment art
//! - The transform solver sizes and positions it from shoulders and hips
//! - The color compositor optionally re-tints it
//! - The renderer composites it over the frame
//!
//! The capture loop in [`app`] runs this once per frame on a tokio task and
//! never renders a result that arrives after it was stopped.
//!
//! # Examples
//!
//! ## Classify and place a single pose
//!
//! ```
//! use pose_tryon::{
//!     classifier::{ViewClassifier, ViewLabel},
//!     landmarks::{Landmark, PoseFrame, PoseLandmark},
//!     placement::TransformSolver,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut landmarks = vec![Landmark::new(0.5, 0.6, 0.0, 0.9); PoseLandmark::COUNT];
//! landmarks[PoseLandmark::Nose.index()] = Landmark::new(0.5, 0.2, 0.0, 0.95);
//! landmarks[PoseLandmark::LeftShoulder.index()] = Landmark::new(0.35, 0.4, 0.0, 0.9);
//! landmarks[PoseLandmark::RightShoulder.index()] = Landmark::new(0.65, 0.4, 0.0, 0.9);
//! let pose = PoseFrame::new(landmarks, 640, 480)?;
//!
//! let view = ViewClassifier::default().classify(&pose, None);
//! assert_eq!(view, Some(ViewLabel::Front));
//!
//! let placement = TransformSolver::default().solve(&pose, ViewLabel::Front);
//! assert!(placement.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Tint and render
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use pose_tryon::{placement::Placement, render::render, tint::{Color, ColorCompositor}};
//!
//! let garment = RgbaImage::from_pixel(8, 8, Rgba([200, 200, 200, 255]));
//! let tinted = ColorCompositor::default().tint(&garment, "#E11D48".parse().unwrap_or(Color::WHITE));
//!
//! let background = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255]));
//! let placement = Placement { center_x: 32.0, center_y: 32.0, scale: 16.0, rotation: 0.0, skew_x: 0.0 };
//! let mut surface = RgbaImage::new(0, 0);
//! render(&mut surface, &background, Some((&*tinted, &placement)));
//! assert_ne!(surface.get_pixel(32, 32), background.get_pixel(32, 32));
//! ```
//!
//! ## Offline capture loop
//!
//! ```no_run
//! use pose_tryon::{
//!     app::CaptureLoop,
//!     assets::GarmentAssets,
//!     config::Config,
//!     pipeline::TickSettings,
//!     render::SharedSurface,
//!     replay::{DirectoryFrameSource, ReplayLandmarkSource},
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let assets = Arc::new(GarmentAssets::load_dir_async(config.assets.clone()).await?);
//! let (_settings_tx, settings_rx) = tokio::sync::watch::channel(TickSettings::default());
//!
//! let capture = CaptureLoop::new(config, SharedSurface::new());
//! capture
//!     .start(
//!         DirectoryFrameSource::new("frames"),
//!         ReplayLandmarkSource::from_file("landmarks.json")?,
//!         assets,
//!         settings_rx,
//!     )
//!     .await?;
//! capture.wait().await?;
//! capture.surface().save_snapshot("last.png".as_ref())?;
//! # Ok(())
//! # }
//! ```

/// Body landmarks and the pose-estimation seam
pub mod landmarks;

/// Video frames and the camera seam
pub mod frame;

/// Heading from device rotation or pointer position
pub mod orientation;

/// Front/back/left/right view classification
pub mod classifier;

/// Debouncing of the classified view across ticks
pub mod smoothing;

/// Garment placement from anchor landmarks
pub mod placement;

/// Garment recoloring
pub mod tint;

/// Garment asset store
pub mod assets;

/// Frame compositing and the shared output surface
pub mod render;

/// Per-tick classify, place, tint and render
pub mod pipeline;

/// Capture loop state machine
pub mod app;

/// Recorded landmarks and image-sequence frames
pub mod replay;

/// OpenCV webcam frames
#[cfg(feature = "camera")]
pub mod camera;

/// Configuration management
pub mod config;

/// Application constants and default thresholds
pub mod constants;

/// Error types and result aliases
pub mod error;

/// Utility functions
pub mod utils;

pub use error::{Error, Result};
