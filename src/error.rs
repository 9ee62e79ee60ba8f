//! Error types for still-frame classification and container assembly.

use alloc::string::String;
use thiserror::Error;

/// Errors that can occur while classifying still frames or assembling the
/// animated container.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MuxError {
    /// The data is not a recognizable WebP still image.
    #[error("Invalid WebP still: {0}")]
    InvalidFormat(String),

    /// A chunk other than a color profile or an image payload chunk sits
    /// between an extended frame's header and its bitstream.
    #[error("Unexpected chunk {fourcc:?} before image payload")]
    UnexpectedChunk {
        /// The fourcc found where a color-profile or payload chunk was expected.
        fourcc: [u8; 4],
    },

    /// The computed payload range is empty or extends past the buffer.
    #[error("No image payload after the container header")]
    EmptyPayload,

    /// Canvas dimensions are zero or exceed the format limit.
    #[error("Invalid canvas dimensions: {width}x{height}")]
    InvalidDimensions {
        /// The invalid width.
        width: u32,
        /// The invalid height.
        height: u32,
    },

    /// A frame's declared dimensions disagree with the canvas.
    #[error(
        "Frame {frame_index} is {width}x{height}, canvas is {canvas_width}x{canvas_height}"
    )]
    DimensionMismatch {
        /// Zero-based index of the offending frame.
        frame_index: usize,
        /// The frame's declared width.
        width: u32,
        /// The frame's declared height.
        height: u32,
        /// Canvas width.
        canvas_width: u32,
        /// Canvas height.
        canvas_height: u32,
    },

    /// The frame rate is zero, negative, or non-finite.
    #[error("Invalid frame rate: {0} fps")]
    InvalidFrameRate(f32),

    /// No frames were supplied before assembly.
    #[error("No frames to assemble")]
    NoFrames,
}
