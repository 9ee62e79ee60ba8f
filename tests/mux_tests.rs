//! Tests for still classification and animated container assembly.

use zenamux::{still, AnimMux, ChunkPadding, FrameLayout, MuxError};

/// Wrap pre-built chunks in a RIFF/WEBP file wrapper.
fn wrap(chunks: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((chunks.len() + 4) as u32).to_le_bytes());
    out.extend_from_slice(b"WEBP");
    out.extend_from_slice(chunks);
    out
}

fn u24(v: u32) -> [u8; 3] {
    let b = v.to_le_bytes();
    [b[0], b[1], b[2]]
}

/// Minimal lossy still: a `VP8 ` chunk whose 10-byte keyframe header
/// declares the given dimensions, plus `extra` trailing bitstream bytes.
fn simple_lossy_still(width: u32, height: u32, extra: usize) -> Vec<u8> {
    let mut bitstream = Vec::new();
    bitstream.extend_from_slice(&[0, 0, 0]); // keyframe tag
    bitstream.extend_from_slice(&[0x9D, 0x01, 0x2A]);
    bitstream.extend_from_slice(&(width as u16).to_le_bytes());
    bitstream.extend_from_slice(&(height as u16).to_le_bytes());
    bitstream.extend(std::iter::repeat(0xAB).take(extra));

    let mut chunks = Vec::new();
    chunks.extend_from_slice(b"VP8 ");
    chunks.extend_from_slice(&(bitstream.len() as u32).to_le_bytes());
    chunks.extend_from_slice(&bitstream);
    wrap(&chunks)
}

/// Minimal lossless still: a `VP8L` chunk whose 5-byte stream header
/// declares the given dimensions, plus `extra` trailing bitstream bytes.
fn simple_lossless_still(width: u32, height: u32, extra: usize) -> Vec<u8> {
    let header: u32 = (width - 1) | ((height - 1) << 14);
    let mut bitstream = Vec::new();
    bitstream.push(0x2F);
    bitstream.extend_from_slice(&header.to_le_bytes());
    bitstream.extend(std::iter::repeat(0xCD).take(extra));

    let mut chunks = Vec::new();
    chunks.extend_from_slice(b"VP8L");
    chunks.extend_from_slice(&(bitstream.len() as u32).to_le_bytes());
    chunks.extend_from_slice(&bitstream);
    wrap(&chunks)
}

/// Extended still: a `VP8X` header declaring the canvas, an optional
/// `ICCP` profile, then a `VP8L` chunk of `image_len` filler bytes.
fn extended_still(width: u32, height: u32, profile: Option<&[u8]>, image_len: usize) -> Vec<u8> {
    let mut chunks = Vec::new();
    chunks.extend_from_slice(b"VP8X");
    chunks.extend_from_slice(&10u32.to_le_bytes());
    chunks.push(if profile.is_some() { 0b0010_0000 } else { 0 });
    chunks.extend_from_slice(&[0; 3]);
    chunks.extend_from_slice(&u24(width - 1));
    chunks.extend_from_slice(&u24(height - 1));

    if let Some(profile) = profile {
        chunks.extend_from_slice(b"ICCP");
        chunks.extend_from_slice(&(profile.len() as u32).to_le_bytes());
        chunks.extend_from_slice(profile);
    }

    chunks.extend_from_slice(b"VP8L");
    chunks.extend_from_slice(&(image_len as u32).to_le_bytes());
    chunks.extend(std::iter::repeat(0xEF).take(image_len));
    wrap(&chunks)
}

/// Collect `(fourcc, declared_size, payload_offset)` for every chunk after
/// the fixed preamble.
fn walk_frame_chunks(container: &[u8]) -> Vec<([u8; 4], u32, usize)> {
    let mut chunks = Vec::new();
    let mut pos = 44;
    while pos + 8 <= container.len() {
        let fourcc: [u8; 4] = container[pos..pos + 4].try_into().unwrap();
        let size = u32::from_le_bytes(container[pos + 4..pos + 8].try_into().unwrap());
        chunks.push((fourcc, size, pos + 8));
        pos += 8 + size as usize;
    }
    chunks
}

// ============================================================================
// Layout and extraction
// ============================================================================

#[test]
fn simple_payload_starts_after_wrapper() {
    let data = simple_lossy_still(4, 4, 0);
    let layout = still::classify(&data).unwrap();
    assert_eq!(layout, FrameLayout::Simple);
    assert_eq!(still::payload_range(&data, layout).unwrap(), (12, 18));
    assert_eq!(still::dimensions(&data, layout).unwrap(), (4, 4));
}

#[test]
fn extended_payload_starts_after_feature_header() {
    let data = extended_still(4, 4, None, 12);
    let layout = still::classify(&data).unwrap();
    assert_eq!(
        layout,
        FrameLayout::Extended {
            has_color_profile: false
        }
    );
    let (start, len) = still::payload_range(&data, layout).unwrap();
    assert_eq!(start, 30);
    assert_eq!(len, data.len() - 30);
}

#[test]
fn profile_of_declared_length_shifts_payload() {
    let profile = vec![0x11; 40];
    let data = extended_still(4, 4, Some(&profile), 12);
    let layout = still::classify(&data).unwrap();
    let (start, _) = still::payload_range(&data, layout).unwrap();
    assert_eq!(start, 30 + 8 + 40);
}

// ============================================================================
// Assembly
// ============================================================================

#[test]
fn two_simple_frames_produce_the_expected_container() {
    let frame = simple_lossy_still(4, 4, 0);
    assert_eq!(frame.len(), 30);

    let mut mux = AnimMux::new(4, 4, 10.0).unwrap();
    assert_eq!(mux.frame_duration_ms(), 100);
    mux.push_frame(frame.clone());
    mux.push_frame(frame.clone());

    let out = mux.assemble().unwrap();
    assert_eq!(out.len(), 128);

    // RIFF wrapper with the patched total size
    assert_eq!(&out[0..4], b"RIFF");
    assert_eq!(u32::from_le_bytes(out[4..8].try_into().unwrap()), 120);
    assert_eq!(&out[8..12], b"WEBP");

    // VP8X: animation flag and canvas size minus one
    assert_eq!(&out[12..16], b"VP8X");
    assert_eq!(u32::from_le_bytes(out[16..20].try_into().unwrap()), 10);
    assert_eq!(out[20], 0b10);
    assert_eq!(&out[21..24], &[0, 0, 0]);
    assert_eq!(&out[24..27], &u24(3));
    assert_eq!(&out[27..30], &u24(3));

    // ANIM: transparent background, infinite looping
    assert_eq!(&out[30..34], b"ANIM");
    assert_eq!(u32::from_le_bytes(out[34..38].try_into().unwrap()), 6);
    assert_eq!(&out[38..42], &[0, 0, 0, 0]);
    assert_eq!(&out[42..44], &[0, 0]);

    // Two ANMF chunks, each embedding the source payload verbatim
    let frames = walk_frame_chunks(&out);
    assert_eq!(frames.len(), 2);
    for (fourcc, size, payload) in frames {
        assert_eq!(&fourcc, b"ANMF");
        assert_eq!(size, 16 + 18);
        assert_eq!(&out[payload..payload + 3], &u24(0)); // frame X
        assert_eq!(&out[payload + 3..payload + 6], &u24(0)); // frame Y
        assert_eq!(&out[payload + 6..payload + 9], &u24(3));
        assert_eq!(&out[payload + 9..payload + 12], &u24(3));
        assert_eq!(&out[payload + 12..payload + 15], &u24(100));
        assert_eq!(out[payload + 15], 0b11);
        assert_eq!(&out[payload + 16..payload + 16 + 18], &frame[12..30]);
    }
}

#[test]
fn one_extended_frame_produces_the_expected_container() {
    let frame = extended_still(4, 4, None, 12);
    assert_eq!(frame.len(), 50);

    let mut mux = AnimMux::new(4, 4, 10.0).unwrap();
    mux.push_frame(frame);

    let out = mux.assemble().unwrap();
    assert_eq!(out.len(), 88);
    assert_eq!(u32::from_le_bytes(out[4..8].try_into().unwrap()), 80);
}

#[test]
fn mixed_layouts_share_one_canvas() {
    let mut mux = AnimMux::new(4, 4, 24.0).unwrap();
    assert_eq!(mux.frame_duration_ms(), 42);
    mux.extend_frames([
        simple_lossy_still(4, 4, 6),
        simple_lossless_still(4, 4, 3),
        extended_still(4, 4, Some(&[0x22; 10]), 7),
    ]);
    assert_eq!(mux.num_frames(), 3);

    let out = mux.assemble().unwrap();
    let declared = u32::from_le_bytes(out[4..8].try_into().unwrap());
    assert_eq!(declared as usize, out.len() - 8);

    let frames = walk_frame_chunks(&out);
    assert_eq!(frames.len(), 3);
    for (fourcc, _, payload) in frames {
        assert_eq!(&fourcc, b"ANMF");
        assert_eq!(&out[payload + 12..payload + 15], &u24(42));
    }
}

#[test]
fn assembly_is_repeatable_and_source_order_is_kept() {
    let mut mux = AnimMux::new(4, 4, 10.0).unwrap();
    mux.push_frame(simple_lossy_still(4, 4, 2));
    mux.push_frame(simple_lossless_still(4, 4, 9));

    let first = mux.assemble().unwrap();
    let second = mux.assemble().unwrap();
    assert_eq!(first, second);

    // The lossy frame's payload precedes the lossless frame's payload.
    let frames = walk_frame_chunks(&first);
    assert_eq!(&first[frames[0].2 + 16..frames[0].2 + 20], b"VP8 ");
    assert_eq!(&first[frames[1].2 + 16..frames[1].2 + 20], b"VP8L");
}

// ============================================================================
// Padding policy
// ============================================================================

#[test]
fn odd_payloads_are_unpadded_by_default() {
    // VP8L chunk header (8) + 5-byte stream header: 13 payload bytes,
    // so the ANMF payload is 16 + 13 = 29 bytes.
    let frame = simple_lossless_still(4, 4, 0);

    let mut mux = AnimMux::new(4, 4, 10.0).unwrap();
    mux.push_frame(frame);
    let out = mux.assemble().unwrap();

    assert_eq!(out.len(), 44 + 8 + 29);
    assert_eq!(u32::from_le_bytes(out[4..8].try_into().unwrap()), 73);
    let frames = walk_frame_chunks(&out);
    assert_eq!(frames[0].1, 29);
}

#[test]
fn even_byte_padding_adds_a_pad_byte_outside_the_declared_size() {
    let frame = simple_lossless_still(4, 4, 0);

    let mut mux = AnimMux::new(4, 4, 10.0)
        .unwrap()
        .padding(ChunkPadding::EvenByte);
    mux.push_frame(frame);
    let out = mux.assemble().unwrap();

    assert_eq!(out.len(), 44 + 8 + 29 + 1);
    assert_eq!(u32::from_le_bytes(out[4..8].try_into().unwrap()), 74);

    // Declared ANMF size excludes the pad byte; the pad byte is zero.
    assert_eq!(&out[44..48], b"ANMF");
    assert_eq!(u32::from_le_bytes(out[48..52].try_into().unwrap()), 29);
    assert_eq!(out[out.len() - 1], 0);
}

// ============================================================================
// Validation failures
// ============================================================================

#[test]
fn assembling_zero_frames_fails() {
    let mux = AnimMux::new(4, 4, 10.0).unwrap();
    assert!(matches!(mux.assemble(), Err(MuxError::NoFrames)));
}

#[test]
fn mismatched_frame_dimensions_fail_before_emission() {
    let mut mux = AnimMux::new(4, 4, 10.0).unwrap();
    mux.push_frame(simple_lossy_still(4, 4, 0));
    mux.push_frame(simple_lossy_still(8, 8, 0));

    match mux.assemble() {
        Err(MuxError::DimensionMismatch {
            frame_index,
            width,
            height,
            canvas_width,
            canvas_height,
        }) => {
            assert_eq!(frame_index, 1);
            assert_eq!((width, height), (8, 8));
            assert_eq!((canvas_width, canvas_height), (4, 4));
        }
        other => panic!("expected dimension mismatch, got {other:?}"),
    }
}

#[test]
fn unclassifiable_frame_fails_the_assembly() {
    let mut mux = AnimMux::new(4, 4, 10.0).unwrap();
    mux.push_frame(b"definitely not a webp".to_vec());
    assert!(matches!(mux.assemble(), Err(MuxError::InvalidFormat(_))));
}

#[test]
fn invalid_canvas_or_rate_is_rejected_up_front() {
    assert!(matches!(
        AnimMux::new(0, 4, 10.0),
        Err(MuxError::InvalidDimensions { .. })
    ));
    assert!(matches!(
        AnimMux::new(4, 20000, 10.0),
        Err(MuxError::InvalidDimensions { .. })
    ));
    assert!(matches!(
        AnimMux::new(4, 4, 0.0),
        Err(MuxError::InvalidFrameRate(_))
    ));
    assert!(matches!(
        AnimMux::new(4, 4, f32::NAN),
        Err(MuxError::InvalidFrameRate(_))
    ));
}

// ============================================================================
// Output sink
// ============================================================================

#[test]
fn persist_writes_the_container_bytes() {
    let mut mux = AnimMux::new(4, 4, 10.0).unwrap();
    mux.push_frame(simple_lossy_still(4, 4, 0));
    let out = mux.assemble().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("animation.webp");
    zenamux::sink::persist(&out, &path).unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), out.as_bytes());
}

#[test]
fn one_container_can_be_delivered_repeatedly() {
    let mut mux = AnimMux::new(4, 4, 10.0).unwrap();
    mux.push_frame(simple_lossy_still(4, 4, 0));
    let out = mux.assemble().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.webp");
    let second = dir.path().join("second.webp");
    zenamux::sink::persist(&out, &first).unwrap();
    zenamux::sink::persist(&out, &second).unwrap();

    assert_eq!(
        std::fs::read(&first).unwrap(),
        std::fs::read(&second).unwrap()
    );
}
