//! Offline sources: recorded landmarks and image-sequence frames.
//!
//! These let the whole pipeline run without a camera or a pose model.
//! Landmark recordings are JSON arrays of pose frames:
//!
//! ```json
//! [
//!   {"landmarks": [{"x": 0.5, "y": 0.2, "z": 0.0, "visibility": 0.99}, ...],
//!    "frame_width": 640, "frame_height": 480},
//!   {"landmarks": [], "frame_width": 640, "frame_height": 480}
//! ]
//! ```

use crate::{
    config::PoseSourceConfig,
    frame::{FrameSource, VideoFrame},
    landmarks::{LandmarkSource, PoseFrame},
    Error, Result,
};
use log::{debug, info, warn};
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

/// Serves recorded pose frames in order, then empty poses
///
/// A recorded pose in which no landmark reaches the configured detection
/// confidence is served as an empty pose, as a live detector would report it.
#[derive(Debug, Clone, Default)]
pub struct ReplayLandmarkSource {
    frames: VecDeque<PoseFrame>,
    min_detection_confidence: f32,
}

impl ReplayLandmarkSource {
    #[must_use]
    pub fn new(frames: Vec<PoseFrame>) -> Self {
        Self {
            frames: frames.into(),
            min_detection_confidence: 0.0,
        }
    }

    /// Load a JSON recording
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or any frame is malformed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let frames: Vec<PoseFrame> = serde_json::from_str(&content)?;
        info!("Loaded {} recorded pose frames from {}", frames.len(), path.as_ref().display());
        Ok(Self::new(frames))
    }

    /// Recorded frames not served yet
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl LandmarkSource for ReplayLandmarkSource {
    fn configure(&mut self, config: &PoseSourceConfig) {
        self.min_detection_confidence = config.min_detection_confidence;
        debug!(
            "Replay detection threshold set to {:.2}",
            self.min_detection_confidence
        );
    }

    async fn estimate(&mut self, frame: &VideoFrame) -> Result<PoseFrame> {
        let Some(recorded) = self.frames.pop_front() else {
            return Ok(PoseFrame::empty(frame.width(), frame.height()));
        };
        let detected = recorded
            .landmarks()
            .iter()
            .any(|lm| lm.confidence() >= self.min_detection_confidence);
        if !detected {
            return Ok(PoseFrame::empty(frame.width(), frame.height()));
        }
        // Landmarks are normalized, so they apply to the frame actually shown
        match PoseFrame::new(recorded.landmarks().to_vec(), frame.width(), frame.height()) {
            Ok(pose) => Ok(pose),
            Err(e) => {
                warn!("Keeping recorded frame size, cannot re-tag pose: {}", e);
                Ok(recorded)
            }
        }
    }
}

/// Serves PNG images from a directory in file-name order
#[derive(Debug, Clone)]
pub struct DirectoryFrameSource {
    directory: PathBuf,
    paths: Vec<PathBuf>,
    next: usize,
}

impl DirectoryFrameSource {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
            paths: Vec::new(),
            next: 0,
        }
    }

    /// Frames found by the last `open`
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    fn scan(directory: &Path) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            let is_png = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            if is_png {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl FrameSource for DirectoryFrameSource {
    async fn open(&mut self) -> Result<()> {
        let directory = self.directory.clone();
        let paths = tokio::task::spawn_blocking(move || Self::scan(&directory))
            .await
            .map_err(|e| Error::FrameSource(format!("Frame scan task failed: {e}")))?
            .map_err(|e| Error::FrameSource(format!("Cannot read {}: {e}", self.directory.display())))?;

        if paths.is_empty() {
            return Err(Error::FrameSource(format!(
                "No PNG frames in {}",
                self.directory.display()
            )));
        }
        info!("Found {} frames in {}", paths.len(), self.directory.display());
        self.paths = paths;
        self.next = 0;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<VideoFrame>> {
        let Some(path) = self.paths.get(self.next).cloned() else {
            return Ok(None);
        };
        let sequence = self.next as u64;
        self.next += 1;

        debug!("Reading frame {}", path.display());
        let image = tokio::task::spawn_blocking(move || image::open(&path).map(|img| img.to_rgba8()))
            .await
            .map_err(|e| Error::FrameSource(format!("Frame decode task failed: {e}")))??;
        Ok(Some(VideoFrame::new(image, sequence)))
    }
}
