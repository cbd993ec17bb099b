//! Captured video frames and the camera seam.

use crate::Result;
use image::RgbaImage;
use std::future::Future;

/// One frame pulled from the camera
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Pixel data in RGBA order
    pub image: RgbaImage,
    /// Arrival order, starting at 0 for each session
    pub sequence: u64,
}

impl VideoFrame {
    #[must_use]
    pub fn new(image: RgbaImage, sequence: u64) -> Self {
        Self { image, sequence }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// The camera-acquisition collaborator.
pub trait FrameSource: Send {
    /// Acquire the stream, including any permission prompt.
    ///
    /// Failure here is the only session-fatal error.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Next frame, or `None` once the stream has ended
    fn next_frame(&mut self) -> impl Future<Output = Result<Option<VideoFrame>>> + Send;
}
