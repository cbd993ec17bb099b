//! Error types for the garment overlay library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[cfg(feature = "camera")]
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Recorded landmark data could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Garment asset missing or unusable
    #[error("Asset error: {0}")]
    AssetError(String),

    /// Color string could not be parsed
    #[error("Invalid color: {0}")]
    ColorParse(String),

    /// The pose-estimation collaborator failed for a frame
    #[error("Landmark source error: {0}")]
    LandmarkSource(String),

    /// The frame source could not be opened or read
    #[error("Frame source error: {0}")]
    FrameSource(String),

    /// Lifecycle operation not allowed in the current loop state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
