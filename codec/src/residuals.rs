//! Variable-length integer decoding over a bit-width symbol stream.
//!
//! Every decoder here follows the same shape: read one bitstream
//! sub-section, entropy-decode a parallel array of per-element bit widths,
//! then pull that many raw bits per element and map them back to integers.
//! The bit-consumption and reconstruction rules are fixed by the format.

use bitstream::BitReader;
use wire::{ByteCursor, EntropyScheme};

use crate::error::DecodeResult;
use crate::limits::DecodeLimits;
use crate::tunstall::decode_block;

/// Decodes `count * components` correlated residuals: one width symbol per
/// element drives all of its components.
///
/// Returns the interleaved values and the element count the stream declared.
pub fn decode_array(
    cursor: &mut ByteCursor<'_>,
    scheme: EntropyScheme,
    limits: &DecodeLimits,
    components: usize,
) -> DecodeResult<(Vec<i32>, usize)> {
    let words = cursor.read_bit_section()?;
    let mut bits = BitReader::new(&words);
    let widths = decode_block(cursor, scheme, limits)?;

    let mut values = vec![0i32; widths.len() * components];
    for (i, &width) in widths.iter().enumerate() {
        if width == 0 {
            continue;
        }
        let width = u32::from(width);
        let max = (1i64 << width) >> 1;
        for c in 0..components {
            let raw = i64::from(bits.read(width)?);
            values[i * components + c] = (raw - max) as i32;
        }
    }
    Ok((values, widths.len()))
}

/// Decodes `count * components` independent residuals: one width stream per
/// component, all sharing a single bitstream read up front.
pub fn decode_values(
    cursor: &mut ByteCursor<'_>,
    scheme: EntropyScheme,
    limits: &DecodeLimits,
    components: usize,
) -> DecodeResult<(Vec<i32>, usize)> {
    let words = cursor.read_bit_section()?;
    let mut bits = BitReader::new(&words);

    let mut values = Vec::new();
    let mut count = 0usize;
    for c in 0..components {
        let widths = decode_block(cursor, scheme, limits)?;
        if c == 0 {
            count = widths.len();
            values = vec![0i32; count * components];
        }
        for (i, &width) in widths.iter().enumerate().take(count) {
            if width == 0 {
                continue;
            }
            let width = u32::from(width);
            let raw = i64::from(bits.read(width)?);
            let middle = 1i64 << (width - 1);
            let value = if raw < middle { -raw - middle } else { raw };
            values[i * components + c] = value as i32;
        }
    }
    Ok((values, count))
}

/// Single-component variant of [`decode_array`], for scalar residual
/// sequences.
pub fn decode_diffs(
    cursor: &mut ByteCursor<'_>,
    scheme: EntropyScheme,
    limits: &DecodeLimits,
) -> DecodeResult<Vec<i32>> {
    let (values, _) = decode_array(cursor, scheme, limits, 1)?;
    Ok(values)
}

/// Decodes non-negative index values with a truncated-binary style code:
/// width zero yields zero, otherwise `(1 << w) + raw - 1`.
pub fn decode_indices(
    cursor: &mut ByteCursor<'_>,
    scheme: EntropyScheme,
    limits: &DecodeLimits,
) -> DecodeResult<Vec<u32>> {
    let words = cursor.read_bit_section()?;
    let mut bits = BitReader::new(&words);
    let widths = decode_block(cursor, scheme, limits)?;

    let mut values = vec![0u32; widths.len()];
    for (i, &width) in widths.iter().enumerate() {
        if width == 0 {
            continue;
        }
        let width = u32::from(width);
        let raw = u64::from(bits.read(width)?);
        values[i] = ((1u64 << width) + raw - 1) as u32;
    }
    Ok(values)
}
