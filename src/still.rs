//! Still-frame classification and payload location.
//!
//! A still WebP file is a 12-byte RIFF wrapper followed either directly by
//! the image chunk (`VP8 ` or `VP8L`, the simple layout) or by a `VP8X`
//! feature header with an optional `ICCP` color-profile chunk ahead of the
//! image data (the extended layout). Everything the muxer needs is at fixed
//! offsets, so classification never walks the bitstream.

use crate::error::MuxError;
use crate::slice_reader::SliceReader;

/// Byte offset of the first chunk fourcc, right after the RIFF wrapper.
const FIRST_CHUNK_OFFSET: usize = 12;
/// Payload start for simple-layout stills: only the wrapper is stripped.
const SIMPLE_PAYLOAD_START: usize = 12;
/// Payload start for extended stills without a color profile:
/// wrapper (12) + `VP8X` chunk header (8) + `VP8X` payload (10).
const EXTENDED_PAYLOAD_START: usize = 30;
/// Offset of the `ICCP` chunk's declared payload length.
const PROFILE_LENGTH_OFFSET: usize = EXTENDED_PAYLOAD_START + 4;

/// Structural layout of one still frame.
///
/// Derived per frame by [`classify`] and consumed immediately; never stored
/// across assembly calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLayout {
    /// The image chunk directly follows the RIFF wrapper.
    Simple,
    /// A `VP8X` feature header precedes the image data.
    Extended {
        /// Whether an `ICCP` chunk sits between the header and the payload.
        has_color_profile: bool,
    },
}

/// Classify one still buffer by its fixed-offset chunk markers.
///
/// Fails closed: a first chunk other than `VP8 `/`VP8L`/`VP8X`, or anything
/// other than a color-profile or payload chunk at the extended payload
/// position, is an error rather than a guessed offset.
pub fn classify(data: &[u8]) -> Result<FrameLayout, MuxError> {
    if data.len() < FIRST_CHUNK_OFFSET + 4 {
        return Err(MuxError::InvalidFormat("file too small".into()));
    }
    if &data[0..4] != b"RIFF" {
        return Err(MuxError::InvalidFormat("missing RIFF signature".into()));
    }
    if &data[8..12] != b"WEBP" {
        return Err(MuxError::InvalidFormat("missing WEBP signature".into()));
    }

    let mut fourcc = [0u8; 4];
    fourcc.copy_from_slice(&data[FIRST_CHUNK_OFFSET..FIRST_CHUNK_OFFSET + 4]);
    match &fourcc {
        b"VP8 " | b"VP8L" => Ok(FrameLayout::Simple),
        b"VP8X" => {
            if data.len() < EXTENDED_PAYLOAD_START + 4 {
                return Err(MuxError::InvalidFormat("truncated extended header".into()));
            }
            let mut marker = [0u8; 4];
            marker.copy_from_slice(&data[EXTENDED_PAYLOAD_START..EXTENDED_PAYLOAD_START + 4]);
            match &marker {
                b"ICCP" => Ok(FrameLayout::Extended {
                    has_color_profile: true,
                }),
                b"VP8 " | b"VP8L" | b"ALPH" => Ok(FrameLayout::Extended {
                    has_color_profile: false,
                }),
                _ => Err(MuxError::UnexpectedChunk { fourcc: marker }),
            }
        }
        _ => Err(MuxError::InvalidFormat(alloc::format!(
            "unknown first chunk: {fourcc:?}"
        ))),
    }
}

/// Byte range `(start, length)` of the embedded image sub-chunk(s), with the
/// still's own outer wrapper stripped.
///
/// The range covers complete sub-chunks (fourcc and size fields included),
/// ready to be copied verbatim into a per-frame wrapper chunk.
pub fn payload_range(data: &[u8], layout: FrameLayout) -> Result<(usize, usize), MuxError> {
    let start = match layout {
        FrameLayout::Simple => SIMPLE_PAYLOAD_START,
        FrameLayout::Extended {
            has_color_profile: false,
        } => EXTENDED_PAYLOAD_START,
        FrameLayout::Extended {
            has_color_profile: true,
        } => {
            let mut r = SliceReader::new(data);
            r.seek_from_start(PROFILE_LENGTH_OFFSET)?;
            let profile_len = r.read_u32_le()? as usize;
            // Skip the profile chunk: its 8-byte header plus the declared
            // payload, which reference encoders emit unpadded.
            EXTENDED_PAYLOAD_START + 8 + profile_len
        }
    };
    if start >= data.len() {
        return Err(MuxError::EmptyPayload);
    }
    Ok((start, data.len() - start))
}

/// Declared pixel dimensions of one still frame.
///
/// Simple stills carry their size in the `VP8`/`VP8L` bitstream header;
/// extended stills declare a canvas in the `VP8X` chunk.
pub fn dimensions(data: &[u8], layout: FrameLayout) -> Result<(u32, u32), MuxError> {
    let mut r = SliceReader::new(data);
    match layout {
        FrameLayout::Simple => {
            r.seek_from_start(FIRST_CHUNK_OFFSET)?;
            let mut fourcc = [0u8; 4];
            r.read_exact(&mut fourcc)?;
            r.seek_from_start(FIRST_CHUNK_OFFSET + 8)?;
            if &fourcc == b"VP8 " {
                vp8_dimensions(&mut r)
            } else {
                vp8l_dimensions(&mut r)
            }
        }
        FrameLayout::Extended { .. } => {
            // VP8X payload: 1 flags byte, 3 reserved, then the canvas size
            // stored as width-1 / height-1 in 24-bit little-endian fields.
            r.seek_from_start(FIRST_CHUNK_OFFSET + 8 + 4)?;
            let width = r.read_u24_le()? + 1;
            let height = r.read_u24_le()? + 1;
            Ok((width, height))
        }
    }
}

/// Read dimensions from a lossy `VP8` keyframe header.
fn vp8_dimensions(r: &mut SliceReader<'_>) -> Result<(u32, u32), MuxError> {
    let frame_tag = r.read_u24_le()?;
    if frame_tag & 1 != 0 {
        return Err(MuxError::InvalidFormat("not a keyframe".into()));
    }

    let mut magic = [0u8; 3];
    r.read_exact(&mut magic)?;
    if magic != [0x9D, 0x01, 0x2A] {
        return Err(MuxError::InvalidFormat("invalid VP8 magic".into()));
    }

    let w = r.read_u16_le()?;
    let h = r.read_u16_le()?;
    Ok((u32::from(w & 0x3FFF), u32::from(h & 0x3FFF)))
}

/// Read dimensions from a lossless `VP8L` stream header.
fn vp8l_dimensions(r: &mut SliceReader<'_>) -> Result<(u32, u32), MuxError> {
    let signature = r.read_u8()?;
    if signature != 0x2F {
        return Err(MuxError::InvalidFormat("invalid VP8L signature".into()));
    }

    let header = r.read_u32_le()?;
    let width = (header & 0x3FFF) + 1;
    let height = ((header >> 14) & 0x3FFF) + 1;
    Ok((width, height))
}
