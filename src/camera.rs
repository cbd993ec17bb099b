//! Live camera frames through OpenCV.

use crate::{
    frame::{FrameSource, VideoFrame},
    utils::image_conversion::bgr_mat_to_rgba,
    Error, Result,
};
use log::info;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE},
};

/// Webcam frame source
pub struct OpenCvCamera {
    index: i32,
    mirror: bool,
    capture: Option<VideoCapture>,
    sequence: u64,
}

impl OpenCvCamera {
    /// Camera `index`, mirrored horizontally like a selfie view
    #[must_use]
    pub fn new(index: i32) -> Self {
        Self {
            index,
            mirror: true,
            capture: None,
            sequence: 0,
        }
    }

    /// Deliver frames as the sensor sees them
    #[must_use]
    pub fn unmirrored(mut self) -> Self {
        self.mirror = false;
        self
    }

    fn read(capture: &mut VideoCapture, mirror: bool) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !capture.read(&mut frame)? || frame.empty() {
            return Ok(None);
        }
        if mirror {
            let raw = frame.clone();
            opencv::core::flip(&raw, &mut frame, 1)?;
        }
        Ok(Some(frame))
    }
}

impl FrameSource for OpenCvCamera {
    async fn open(&mut self) -> Result<()> {
        info!("Opening camera {}", self.index);
        let index = self.index;
        let capture = tokio::task::spawn_blocking(move || -> Result<VideoCapture> {
            let mut cap = VideoCapture::new(index, videoio::CAP_ANY)?;
            if !cap.is_opened()? {
                return Err(Error::FrameSource(format!("Camera {index} is not available")));
            }
            // Reduce buffer size for lower latency
            cap.set(CAP_PROP_BUFFERSIZE, 1.0)?;
            Ok(cap)
        })
        .await
        .map_err(|e| Error::FrameSource(format!("Camera open task failed: {e}")))??;

        self.capture = Some(capture);
        self.sequence = 0;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<VideoFrame>> {
        let Some(mut capture) = self.capture.take() else {
            return Err(Error::FrameSource("Camera is not open".to_string()));
        };
        let mirror = self.mirror;
        let (capture, frame) = tokio::task::spawn_blocking(move || {
            let frame = Self::read(&mut capture, mirror).and_then(|mat| mat.map(|m| bgr_mat_to_rgba(&m)).transpose());
            (capture, frame)
        })
        .await
        .map_err(|e| Error::FrameSource(format!("Camera read task failed: {e}")))?;
        self.capture = Some(capture);

        match frame? {
            Some(image) => {
                let sequence = self.sequence;
                self.sequence += 1;
                Ok(Some(VideoFrame::new(image, sequence)))
            }
            // A live camera has no end of stream; an empty read is a transient failure
            None => Err(Error::FrameSource(format!("Camera {} returned no frame", self.index))),
        }
    }
}
