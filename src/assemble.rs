//! Animated container assembly.
//!
//! [`AnimMux`] collects pre-encoded still frames and repackages their image
//! sub-chunks into one animated WebP file: a RIFF wrapper, a `VP8X` header
//! with the animation flag, an `ANIM` parameter chunk, and one `ANMF` chunk
//! per frame. Pixel data is copied verbatim; nothing is decoded or
//! re-encoded.
//!
//! # Example
//!
//! ```rust,no_run
//! use zenamux::AnimMux;
//!
//! let stills: Vec<Vec<u8>> = Vec::new(); // same-size encoded WebP stills
//! let mut mux = AnimMux::new(320, 240, 10.0)?;
//! mux.extend_frames(stills);
//! let webp = mux.assemble()?;
//! # Ok::<(), zenamux::MuxError>(())
//! ```

use alloc::vec::Vec;
use core::ops::Deref;

use crate::chunk::{write_chunk, ChunkPadding, VecWriter};
use crate::error::MuxError;
use crate::still;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// `VP8X` flags byte: only the animation bit is set.
const VP8X_FLAG_ANIMATION: u8 = 1 << 1;
/// `ANMF` flags byte: dispose to background (bit 0) and do not blend
/// (bit 1). Every frame fully replaces the canvas before the next one.
const ANMF_FLAGS: u8 = 0b11;
/// Fixed portion of an `ANMF` payload ahead of the embedded sub-chunks.
const ANMF_HEADER_LEN: usize = 16;
/// `ANMF` stores the frame duration in a 24-bit field.
const MAX_DURATION_MS: u32 = 0x00FF_FFFF;
/// Format limit on canvas dimensions.
const MAX_CANVAS_DIM: u32 = 16384;

/// Fixed pixel canvas shared by every frame of the animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasDescriptor {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
}

/// Global animation parameters written to the `ANIM` chunk.
///
/// The defaults are fixed for this muxer: a fully transparent black
/// background and infinite looping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationParams {
    /// Background color, byte order as stored on disk.
    pub background_color: u32,
    /// Loop count; `0` loops forever.
    pub loop_count: u16,
}

/// Per-frame record built during extraction: declared dimensions plus the
/// payload byte range into the source buffer.
#[derive(Debug, Clone, Copy)]
struct FrameDescriptor {
    width: u32,
    height: u32,
    payload_start: usize,
    payload_len: usize,
}

/// An assembled animated WebP file.
///
/// Produced only by a successful [`AnimMux::assemble`] call and read-only
/// afterwards, so one assembly can be persisted and transmitted any number
/// of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerBuffer {
    bytes: Vec<u8>,
}

impl ContainerBuffer {
    /// The complete container bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total container length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the container is empty. Assembly never produces an empty
    /// container; this exists for completeness alongside [`len`](Self::len).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume the container and return the underlying bytes.
    #[inline]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for ContainerBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Deref for ContainerBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Animated WebP assembler.
///
/// Collects still frames in display order and assembles them into one
/// animated container. Frames are validated against the canvas during
/// [`assemble`](Self::assemble); a failure aborts the whole call and no
/// partial container is ever returned.
#[derive(Debug, Clone)]
pub struct AnimMux {
    canvas: CanvasDescriptor,
    frame_duration_ms: u32,
    params: AnimationParams,
    padding: ChunkPadding,
    frames: Vec<Vec<u8>>,
}

impl AnimMux {
    /// Create a muxer for the given canvas size and frame rate.
    ///
    /// Every frame is shown for the same duration, `round(1000 / fps)`
    /// milliseconds. The canvas dimensions must be between 1 and 16384
    /// inclusive and `fps` must be finite and positive.
    pub fn new(width: u32, height: u32, fps: f32) -> Result<Self, MuxError> {
        if width == 0 || height == 0 || width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
            return Err(MuxError::InvalidDimensions { width, height });
        }
        if !fps.is_finite() || fps <= 0.0 {
            return Err(MuxError::InvalidFrameRate(fps));
        }
        // Round half up; f32::round is unavailable in core.
        let frame_duration_ms = ((1000.0 / fps + 0.5) as u32).min(MAX_DURATION_MS);
        Ok(Self {
            canvas: CanvasDescriptor { width, height },
            frame_duration_ms,
            params: AnimationParams::default(),
            padding: ChunkPadding::default(),
            frames: Vec::new(),
        })
    }

    /// Set the chunk padding policy. The default, [`ChunkPadding::None`],
    /// reproduces reference output byte for byte.
    pub fn padding(mut self, padding: ChunkPadding) -> Self {
        self.padding = padding;
        self
    }

    /// The canvas every frame must match.
    pub fn canvas(&self) -> CanvasDescriptor {
        self.canvas
    }

    /// Constant per-frame display duration in milliseconds.
    pub fn frame_duration_ms(&self) -> u32 {
        self.frame_duration_ms
    }

    /// Append one encoded still frame.
    pub fn push_frame(&mut self, data: Vec<u8>) {
        self.frames.push(data);
    }

    /// Append every frame from an ordered source, preserving its order.
    pub fn extend_frames<I>(&mut self, frames: I)
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        self.frames.extend(frames);
    }

    /// Number of queued frames.
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Assemble the queued frames into an animated container.
    ///
    /// Classification and payload extraction are pure per-frame functions;
    /// with the `parallel` feature they run on the rayon pool, collected in
    /// frame order regardless of completion order. All accumulation state
    /// lives in this call, so concurrent assemblies of clones share
    /// nothing.
    pub fn assemble(&self) -> Result<ContainerBuffer, MuxError> {
        if self.frames.is_empty() {
            return Err(MuxError::NoFrames);
        }

        let descriptors = self.describe_frames()?;

        // Exact output size is known up front; the RIFF size field is still
        // written as a placeholder and patched last, after every chunk's
        // bytes have been accounted for.
        let total: usize = 12
            + self.padding.chunk_size(10)
            + self.padding.chunk_size(6)
            + descriptors
                .iter()
                .map(|d| self.padding.chunk_size(ANMF_HEADER_LEN + d.payload_len))
                .sum::<usize>();

        let mut out = Vec::with_capacity(total);
        out.write_all(b"RIFF");
        out.write_u32_le(0); // patched below
        out.write_all(b"WEBP");

        let mut vp8x = Vec::with_capacity(10);
        vp8x.write_u8(VP8X_FLAG_ANIMATION);
        vp8x.write_all(&[0; 3]);
        vp8x.write_u24_le(self.canvas.width - 1);
        vp8x.write_u24_le(self.canvas.height - 1);
        write_chunk(&mut out, b"VP8X", &vp8x, self.padding);

        let mut anim = Vec::with_capacity(6);
        anim.write_u32_le(self.params.background_color);
        anim.write_u16_le(self.params.loop_count);
        write_chunk(&mut out, b"ANIM", &anim, self.padding);

        for (descriptor, data) in descriptors.iter().zip(&self.frames) {
            self.write_anmf(&mut out, descriptor, data);
        }

        debug_assert_eq!(out.len(), total);

        let riff_size = (out.len() - 8) as u32;
        out[4..8].copy_from_slice(&riff_size.to_le_bytes());

        Ok(ContainerBuffer { bytes: out })
    }

    /// Classify, extract, and validate every frame, in frame order.
    fn describe_frames(&self) -> Result<Vec<FrameDescriptor>, MuxError> {
        #[cfg(feature = "parallel")]
        {
            self.frames
                .par_iter()
                .enumerate()
                .map(|(index, data)| self.describe_frame(index, data))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.frames
                .iter()
                .enumerate()
                .map(|(index, data)| self.describe_frame(index, data))
                .collect()
        }
    }

    fn describe_frame(&self, index: usize, data: &[u8]) -> Result<FrameDescriptor, MuxError> {
        let layout = still::classify(data)?;
        let (payload_start, payload_len) = still::payload_range(data, layout)?;
        let (width, height) = still::dimensions(data, layout)?;

        if width != self.canvas.width || height != self.canvas.height {
            return Err(MuxError::DimensionMismatch {
                frame_index: index,
                width,
                height,
                canvas_width: self.canvas.width,
                canvas_height: self.canvas.height,
            });
        }

        Ok(FrameDescriptor {
            width,
            height,
            payload_start,
            payload_len,
        })
    }

    fn write_anmf(&self, out: &mut Vec<u8>, descriptor: &FrameDescriptor, data: &[u8]) {
        let payload_len = ANMF_HEADER_LEN + descriptor.payload_len;

        out.write_all(b"ANMF");
        out.write_u32_le(payload_len as u32);

        out.write_u24_le(0); // frame X
        out.write_u24_le(0); // frame Y
        out.write_u24_le(descriptor.width - 1);
        out.write_u24_le(descriptor.height - 1);
        out.write_u24_le(self.frame_duration_ms);
        out.write_u8(ANMF_FLAGS);

        let start = descriptor.payload_start;
        out.write_all(&data[start..start + descriptor.payload_len]);
        for _ in 0..self.padding.pad_len(payload_len) {
            out.write_u8(0);
        }
    }
}
