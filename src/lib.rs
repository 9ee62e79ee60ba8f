//! Assemble animated WebP files from already-encoded still WebP images.
//!
//! This crate is a container multiplexer: given an ordered sequence of
//! single-frame WebP files that share one pixel size, it locates each
//! frame's compressed image sub-chunks and repackages them into one
//! animated WebP container. No pixel data is decoded or re-encoded, so
//! assembly cost is dominated by memory copies.
//!
//! Source stills may use the simple layout (`VP8 `/`VP8L` directly after
//! the RIFF wrapper) or the extended layout (`VP8X` header, optionally
//! followed by an `ICCP` color profile). Any other chunk ahead of the image
//! payload is rejected rather than skipped.
//!
//! # Example
//!
//! ```rust,no_run
//! use zenamux::AnimMux;
//!
//! let stills: Vec<Vec<u8>> = Vec::new(); // same-size encoded WebP stills
//! let mut mux = AnimMux::new(640, 480, 10.0)?;
//! mux.extend_frames(stills);
//!
//! let webp = mux.assemble()?;
//! zenamux::sink::persist(&webp, "animation.webp")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Features
//!
//! - `std` (default): enables the [`sink`] module for output delivery.
//! - `parallel`: classify and extract frames on the rayon thread pool;
//!   output is byte-identical to sequential assembly.
//! - `upload`: multipart HTTP transmission of assembled containers.
//!
//! The core assembler works in `no_std + alloc` environments:
//!
//! ```toml
//! [dependencies]
//! zenamux = { version = "...", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

extern crate alloc;

mod chunk;
mod slice_reader;

pub mod assemble;
pub mod error;
pub mod still;

#[cfg(feature = "std")]
pub mod sink;

pub use assemble::{AnimMux, AnimationParams, CanvasDescriptor, ContainerBuffer};
pub use chunk::ChunkPadding;
pub use error::MuxError;
pub use still::FrameLayout;

#[cfg(feature = "std")]
pub use sink::SinkError;
