//! Sequential byte-level reader over the compressed input buffer.

use crate::error::{FormatError, WireResult};

/// A bounds-checked sequential reader over the raw input bytes.
///
/// All multi-byte scalars are little-endian. The cursor position only
/// increases; reads past the end of the buffer fail with
/// [`FormatError::UnexpectedEnd`] rather than panic.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor at the start of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read position from the start of the buffer.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Reads `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> WireResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(FormatError::UnexpectedEnd {
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> WireResult<u8> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    pub fn read_i8(&mut self) -> WireResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> WireResult<u16> {
        let bytes = self.read_array::<2>()?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_i16(&mut self) -> WireResult<i16> {
        let bytes = self.read_array::<2>()?;
        Ok(i16::from_le_bytes(bytes))
    }

    pub fn read_u32(&mut self) -> WireResult<u32> {
        let bytes = self.read_array::<4>()?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_i32(&mut self) -> WireResult<i32> {
        let bytes = self.read_array::<4>()?;
        Ok(i32::from_le_bytes(bytes))
    }

    pub fn read_f32(&mut self) -> WireResult<f32> {
        let bytes = self.read_array::<4>()?;
        Ok(f32::from_le_bytes(bytes))
    }

    /// Reads a length-prefixed string.
    ///
    /// The u16 prefix counts the bytes that follow *including* a trailing
    /// NUL terminator; the returned string excludes it.
    pub fn read_string(&mut self) -> WireResult<String> {
        let len = self.read_u16()? as usize;
        if len == 0 {
            return Err(FormatError::EmptyStringLength);
        }
        let bytes = self.read_bytes(len)?;
        let text = std::str::from_utf8(&bytes[..len - 1]).map_err(|_| FormatError::InvalidUtf8)?;
        Ok(text.to_owned())
    }

    /// Reads a bitstream sub-section: a word count, alignment padding to the
    /// next 4-byte boundary (relative to the buffer start), then that many
    /// little-endian 32-bit words.
    pub fn read_bit_section(&mut self) -> WireResult<Vec<u32>> {
        let count = self.read_i32()?;
        if count < 0 {
            return Err(FormatError::NegativeCount {
                field: "bitstream word",
                found: count,
            });
        }
        self.align4()?;
        let byte_len = (count as usize).saturating_mul(4);
        let bytes = self.read_bytes(byte_len)?;
        let words = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Ok(words)
    }

    fn align4(&mut self) -> WireResult<()> {
        let rem = self.pos % 4;
        if rem != 0 {
            self.read_bytes(4 - rem)?;
        }
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> WireResult<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}
