//! Low-level bit unpacking primitives for the mdec codec.
//!
//! This crate provides [`BitReader`] for decoding values of arbitrary width
//! from a buffer of 32-bit words, most-significant-bit first. It is designed
//! for bounded, panic-free operation with explicit error handling.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are bounds-checked.
//! - **No domain knowledge** - This crate knows nothing about meshes,
//!   attributes, or geometry.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use bitstream::BitReader;
//!
//! let words = [0xA000_0000u32];
//! let mut reader = BitReader::new(&words);
//! assert_eq!(reader.read(4).unwrap(), 0xA);
//! ```

mod error;
mod reader;

pub use error::{BitError, BitResult};
pub use reader::BitReader;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stream() {
        let reader = BitReader::new(&[]);
        assert!(reader.is_empty());
    }

    #[test]
    fn doctest_example() {
        let words = [0xA000_0000u32];
        let mut reader = BitReader::new(&words);
        assert_eq!(reader.read(4).unwrap(), 0xA);
    }

    #[test]
    fn mixed_widths_drain_exactly() {
        let words = [0xDEAD_BEEF, 0xCAFE_BABE];
        let mut reader = BitReader::new(&words);
        let mut total = 0u32;
        for width in [3, 7, 11, 13, 5, 9, 16] {
            reader.read(width).unwrap();
            total += width;
        }
        assert_eq!(reader.bits_remaining(), 64 - total as usize);
    }
}
