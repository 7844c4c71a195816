//! Variable-to-fixed entropy decoding.
//!
//! Each compressed byte indexes one of 256 dictionary entries; each entry
//! expands to a variable-length run of output symbols. The dictionary is
//! rebuilt per block from a (symbol, probability) table carried in the
//! stream, so decoding is fully deterministic.

use wire::{ByteCursor, EntropyScheme};

use crate::error::{DecodeError, DecodeResult};
use crate::limits::DecodeLimits;

const DICTIONARY_SIZE: usize = 256;

/// A Tunstall expansion dictionary built from a probability table.
#[derive(Debug, Clone)]
pub struct Tunstall {
    /// (symbol, probability) pairs, most probable first.
    probabilities: Vec<(u8, u8)>,
    /// Per dictionary entry: offset into `table`.
    index: Vec<u32>,
    /// Per dictionary entry: run length in symbols.
    lengths: Vec<u32>,
    /// Shared output-symbol table all entries point into.
    table: Vec<u8>,
}

impl Tunstall {
    /// Builds the 256-entry dictionary for the given probability table.
    ///
    /// Probabilities compose multiplicatively in 16.16 fixed point. The
    /// construction greedily extends the most probable growth candidate of
    /// each symbol until the dictionary is full; a geometrically-skewed
    /// table takes a batch-construction fast path that seeds the greedy
    /// loop with the same state it would have reached on its own, as long
    /// as the run length stays below the dictionary cap.
    #[must_use]
    pub fn with_probabilities(probabilities: Vec<(u8, u8)>) -> Self {
        Self::build(probabilities, false)
    }

    /// Builds the dictionary with the batch fast path disabled, running
    /// the greedy loop from singleton entries regardless of skew.
    #[cfg(test)]
    fn with_probabilities_general(probabilities: Vec<(u8, u8)>) -> Self {
        Self::build(probabilities, true)
    }

    fn build(probabilities: Vec<(u8, u8)>, force_general: bool) -> Self {
        let mut tunstall = Self {
            probabilities,
            index: Vec::new(),
            lengths: Vec::new(),
            table: Vec::new(),
        };
        tunstall.build_tables(force_general);
        tunstall
    }

    fn build_tables(&mut self, force_general: bool) {
        let n_symbols = self.probabilities.len();
        if n_symbols <= 1 {
            return;
        }

        // Slot layout mirrors the construction queues: per-symbol growth
        // candidates live at starts[i], new entries are appended at `end`.
        let mut queues = vec![0u32; 2 * DICTIONARY_SIZE];
        let mut index = vec![0u32; 2 * DICTIONARY_SIZE];
        let mut lengths = vec![0u32; 2 * DICTIONARY_SIZE];
        let mut table = vec![0u8; 8192];
        let mut starts = vec![0u32; n_symbols];

        let mut pos = 0usize;
        let mut end = 0usize;
        let mut n_words;

        let prob_scaled = |i: usize| u32::from(self.probabilities[i].1) << 8;

        // Detect a geometrically-skewed distribution: how many times the top
        // symbol repeats before its self-product drops below the runner-up.
        let p0 = prob_scaled(0);
        let p1 = prob_scaled(1);
        let mut prob = (p0 * p0) >> 16;
        let max_count = (DICTIONARY_SIZE - 1) / (n_symbols - 1);
        let mut count = 2usize;
        while prob > p1 && count < max_count {
            prob = (prob * p0) >> 16;
            count += 1;
        }

        if count >= 16 && !force_general {
            // Low entropy would make the general loop build a table past 8K.
            // Batch-build the equivalent shape directly: one all-top-symbol
            // run, plus every shorter run terminated by each other symbol.
            let top = self.probabilities[0].0;
            table[pos] = top;
            pos += 1;
            for k in 1..n_symbols {
                for _ in 0..count - 1 {
                    table[pos] = top;
                    pos += 1;
                }
                table[pos] = self.probabilities[k].0;
                pos += 1;
            }
            starts[0] = ((count - 1) * n_symbols) as u32;
            for (k, start) in starts.iter_mut().enumerate().skip(1) {
                *start = k as u32;
            }

            for col in 0..count {
                for row in 1..n_symbols {
                    let dest = row + col * n_symbols;
                    queues[dest] = if col == 0 {
                        prob_scaled(row)
                    } else {
                        (prob * prob_scaled(row)) >> 16
                    };
                    index[dest] = (row * count - col) as u32;
                    lengths[dest] = (col + 1) as u32;
                }
                prob = if col == 0 { p0 } else { (prob * p0) >> 16 };
            }

            let first = (count - 1) * n_symbols;
            queues[first] = prob;
            index[first] = 0;
            lengths[first] = count as u32;
            n_words = 1 + count * (n_symbols - 1);
            end = count * n_symbols;
        } else {
            n_words = n_symbols;
            for i in 0..n_symbols {
                starts[i] = i as u32;
                queues[end] = prob_scaled(i);
                index[end] = pos as u32;
                lengths[end] = 1;
                end += 1;
                table[pos] = self.probabilities[i].0;
                pos += 1;
            }
        }

        while n_words < DICTIONARY_SIZE {
            // Find the highest-probability growth candidate.
            let mut best = 0usize;
            let mut max_prob = 0u32;
            for (i, &start) in starts.iter().enumerate() {
                let p = queues[start as usize];
                if p > max_prob {
                    best = i;
                    max_prob = p;
                }
            }
            let word = starts[best] as usize;
            let probability = queues[word];
            let offset = index[word] as usize;
            let length = lengths[word] as usize;

            let mut r = 0usize;
            while r < n_symbols {
                queues[end] = (probability * prob_scaled(r)) >> 16;
                index[end] = pos as u32;
                lengths[end] = (length + 1) as u32;
                end += 1;

                if pos + length + 1 > table.len() {
                    table.resize((pos + length + 1).next_power_of_two(), 0);
                }
                table.copy_within(offset..offset + length, pos);
                pos += length;
                table[pos] = self.probabilities[r].0;
                pos += 1;

                if n_words + r == DICTIONARY_SIZE - 1 {
                    break;
                }
                r += 1;
            }
            if r == n_symbols {
                // The candidate is fully expanded and leaves the front.
                starts[best] += n_symbols as u32;
            }
            n_words += n_symbols - 1;
        }

        // Compact out the expanded (dead) candidates, keeping stream order.
        let mut word = 0usize;
        for i in 0..end {
            let row = i % n_symbols;
            if starts[row] as usize > i {
                continue;
            }
            index[word] = index[i];
            lengths[word] = lengths[i];
            word += 1;
        }
        index.truncate(DICTIONARY_SIZE);
        lengths.truncate(DICTIONARY_SIZE);
        table.truncate(pos);

        self.index = index;
        self.lengths = lengths;
        self.table = table;
    }

    /// Expands `compressed` into exactly `output_len` symbols.
    ///
    /// Every byte but the last copies its full dictionary entry; the last
    /// byte copies only as many symbols as needed to reach the declared
    /// length. A single-symbol alphabet fills the output directly without
    /// touching the compressed bytes.
    pub fn expand(&self, compressed: &[u8], output_len: usize) -> DecodeResult<Vec<u8>> {
        if output_len == 0 {
            return Ok(Vec::new());
        }
        if self.probabilities.len() == 1 {
            return Ok(vec![self.probabilities[0].0; output_len]);
        }
        if compressed.is_empty() || self.probabilities.is_empty() {
            return Err(DecodeError::Format(wire::FormatError::UnexpectedEnd {
                needed: 1,
                available: 0,
            }));
        }

        let mut output = vec![0u8; output_len];
        let mut written = 0usize;
        let (last, body) = compressed.split_last().unwrap_or((&0, &[]));

        for &byte in body {
            let start = self.index[usize::from(byte)] as usize;
            let length = self.lengths[usize::from(byte)] as usize;
            let take = length.min(output_len - written);
            output[written..written + take].copy_from_slice(&self.table[start..start + take]);
            written += take;
        }

        // The final entry is intentionally truncated at the output boundary.
        let start = self.index[usize::from(*last)] as usize;
        let take = (output_len - written).min(self.table.len() - start);
        output[written..written + take].copy_from_slice(&self.table[start..start + take]);
        Ok(output)
    }
}

/// Reads and expands one entropy-coded block at the cursor.
///
/// Tunstall block layout: symbol count (u8), (symbol, probability) pairs,
/// declared output length (i32), compressed length (i32), compressed bytes.
/// A raw block is just a u32 length followed by literal bytes.
pub fn decode_block(
    cursor: &mut ByteCursor<'_>,
    scheme: EntropyScheme,
    limits: &DecodeLimits,
) -> DecodeResult<Vec<u8>> {
    match scheme {
        EntropyScheme::Raw => {
            let len = read_sane_len(cursor, "output", limits.max_block_output)?;
            let bytes = cursor.read_bytes(len)?;
            Ok(bytes.to_vec())
        }
        EntropyScheme::Tunstall => {
            let n_symbols = cursor.read_u8()? as usize;
            let pair_bytes = cursor.read_bytes(n_symbols * 2)?;
            let probabilities = pair_bytes
                .chunks_exact(2)
                .map(|pair| (pair[0], pair[1]))
                .collect();
            let tunstall = Tunstall::with_probabilities(probabilities);

            let output_len = read_sane_len(cursor, "output", limits.max_block_output)?;
            let compressed_len = read_sane_len(cursor, "compressed", limits.max_block_compressed)?;
            let compressed = cursor.read_bytes(compressed_len)?;
            if output_len == 0 {
                return Ok(Vec::new());
            }
            tunstall.expand(compressed, output_len)
        }
    }
}

fn read_sane_len(
    cursor: &mut ByteCursor<'_>,
    field: &'static str,
    limit: usize,
) -> DecodeResult<usize> {
    let declared = cursor.read_i32()?;
    if declared < 0 {
        return Err(DecodeError::Format(wire::FormatError::NegativeCount {
            field,
            found: declared,
        }));
    }
    let declared = declared as usize;
    if declared > limit {
        return Err(DecodeError::SizeSanity {
            field,
            declared,
            limit,
        });
    }
    Ok(declared)
}
