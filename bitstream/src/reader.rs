//! Word-based bit reader with bounded operations.

use crate::error::{BitError, BitResult};

const fn low_mask(bits: u32) -> u32 {
    if bits == 0 {
        0
    } else {
        u32::MAX >> (32 - bits)
    }
}

/// A bit-level reader over a buffer of 32-bit words.
///
/// Values are extracted most-significant-bit first and cross word
/// boundaries transparently. All read operations are bounds-checked and
/// return errors on failure; the reader never panics on malformed input.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    words: &'a [u32],
    /// Index of the next word to load.
    pos: usize,
    /// Unread low bits of the most recently loaded word.
    current: u32,
    /// How many bits of `current` are still unread (0..=32).
    pending: u32,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` over a word slice.
    #[must_use]
    pub const fn new(words: &'a [u32]) -> Self {
        Self {
            words,
            pos: 0,
            current: 0,
            pending: 0,
        }
    }

    /// Returns the number of bits remaining to read.
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        (self.words.len() - self.pos) * 32 + self.pending as usize
    }

    /// Returns `true` if there are no more bits to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> BitResult<bool> {
        Ok(self.read(1)? == 1)
    }

    /// Reads the next `bits` bits as an unsigned integer, MSB first.
    ///
    /// `bits` must be at most 32; reading zero bits yields zero without
    /// consuming anything.
    pub fn read(&mut self, bits: u32) -> BitResult<u32> {
        if bits > 32 {
            return Err(BitError::InvalidBitCount {
                bits: bits as usize,
                max_bits: 32,
            });
        }
        if bits == 0 {
            return Ok(0);
        }

        if bits <= self.pending {
            // pending never exceeds 31 once a word has been loaded, so the
            // shift below cannot overflow.
            self.pending -= bits;
            let value = self.current >> self.pending;
            self.current &= low_mask(self.pending);
            return Ok(value);
        }

        // Straddles a word boundary: drain `pending`, then take the rest
        // from the high end of the next word.
        let take = bits - self.pending;
        let high = u64::from(self.current) << take;

        let Some(&word) = self.words.get(self.pos) else {
            return Err(BitError::BufferUnderrun {
                requested: bits as usize,
                available: self.pending as usize,
            });
        };
        self.pos += 1;
        self.pending = 32 - take;
        self.current = word & low_mask(self.pending);

        let value = high | u64::from(word >> self.pending);
        Ok(value as u32)
    }
}
