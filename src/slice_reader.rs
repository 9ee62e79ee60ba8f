//! A no_std compatible slice reader for reading bytes with position tracking.
//!
//! Wraps a byte slice and provides little-endian primitive reads, similar to
//! `std::io::Cursor` but without requiring the standard library. Every read
//! is bounds-checked; running past the end of the slice is reported as a
//! format error rather than a panic.

use alloc::string::ToString;
use byteorder_lite::{ByteOrder, LittleEndian};
use core::fmt;

use crate::error::MuxError;

#[inline]
fn truncated() -> MuxError {
    MuxError::InvalidFormat("unexpected end of data".to_string())
}

/// A reader that wraps a byte slice and tracks the current position.
#[derive(Clone)]
pub(crate) struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    /// Create a new SliceReader wrapping the given byte slice.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Seek to an absolute position.
    #[inline]
    pub fn seek_from_start(&mut self, pos: usize) -> Result<(), MuxError> {
        if pos > self.data.len() {
            return Err(truncated());
        }
        self.pos = pos;
        Ok(())
    }

    /// Read exactly `buf.len()` bytes into the buffer.
    #[inline]
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), MuxError> {
        let n = buf.len();
        if self.pos + n > self.data.len() {
            return Err(truncated());
        }
        buf.copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(())
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, MuxError> {
        if self.pos >= self.data.len() {
            return Err(truncated());
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Read a u16 in little-endian byte order.
    #[inline]
    pub fn read_u16_le(&mut self) -> Result<u16, MuxError> {
        if self.pos + 2 > self.data.len() {
            return Err(truncated());
        }
        let val = LittleEndian::read_u16(&self.data[self.pos..]);
        self.pos += 2;
        Ok(val)
    }

    /// Read a u24 in little-endian byte order (as u32).
    #[inline]
    pub fn read_u24_le(&mut self) -> Result<u32, MuxError> {
        if self.pos + 3 > self.data.len() {
            return Err(truncated());
        }
        let val = LittleEndian::read_u24(&self.data[self.pos..]);
        self.pos += 3;
        Ok(val)
    }

    /// Read a u32 in little-endian byte order.
    #[inline]
    pub fn read_u32_le(&mut self) -> Result<u32, MuxError> {
        if self.pos + 4 > self.data.len() {
            return Err(truncated());
        }
        let val = LittleEndian::read_u32(&self.data[self.pos..]);
        self.pos += 4;
        Ok(val)
    }
}

impl fmt::Debug for SliceReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceReader")
            .field("len", &self.data.len())
            .field("pos", &self.pos)
            .finish()
    }
}
