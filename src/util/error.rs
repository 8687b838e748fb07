//! Error types for tallymatch.

use thiserror::Error;

/// Result alias for tallymatch operations.
pub type TallyMatchResult<T> = std::result::Result<T, TallyMatchError>;

/// Errors that can occur while building images, scoring templates or
/// persisting session state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TallyMatchError {
    /// Width or height is zero, or their product overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the declared geometry requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Requested sub-region does not fit inside the image.
    #[error("roi ({x}, {y}, {width}x{height}) out of bounds for {img_width}x{img_height} image")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Template is larger than the search image it is scored against.
    #[error(
        "template {tpl_width}x{tpl_height} does not fit search image {img_width}x{img_height}"
    )]
    InvalidTemplateSize {
        tpl_width: usize,
        tpl_height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// A user-drawn rectangle is empty or malformed.
    #[error("invalid roi: {reason}")]
    InvalidRoi { reason: &'static str },
    /// Pixel buffer has an unsupported channel count.
    #[error("unsupported channel count: {channels}")]
    InvalidChannels { channels: usize },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Image decoding or encoding failed.
    #[error("image io failed: {reason}")]
    ImageIo { reason: String },
    /// Reading or writing persisted state failed.
    #[error("storage failed: {reason}")]
    Storage { reason: String },
}
