//! Error types for canvas operations.

use thiserror::Error;

/// Errors that can occur while loading, editing or exporting a mask canvas.
#[derive(Error, Debug)]
pub enum CanvasError {
    /// Source image bytes could not be decoded
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Mask could not be encoded
    #[error("Failed to encode mask: {0}")]
    Encode(#[source] image::ImageError),

    /// Canvas state (history entry) could not be serialized or parsed
    #[error("Canvas state error: {0}")]
    State(#[from] serde_json::Error),

    /// An image or surface had a zero dimension
    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Unknown brush mode name
    #[error("Unknown brush mode '{0}'")]
    UnknownMode(String),
}

impl CanvasError {
    /// Create an invalid dimensions error.
    pub fn invalid_dimensions(width: u32, height: u32) -> Self {
        Self::InvalidDimensions { width, height }
    }
}

/// Result alias for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;
