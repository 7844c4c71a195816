//! Decode-level limits.

/// Sanity bounds applied to compressed block headers.
///
/// The container stores declared output and compressed lengths per block;
/// these bounds reject absurd values before any allocation happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum declared output length of one entropy-coded block, in bytes.
    pub max_block_output: usize,

    /// Maximum declared compressed length of one entropy-coded block, in bytes.
    pub max_block_compressed: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_block_output: 100_000_000,
            max_block_compressed: 100_000_000,
        }
    }
}

impl DecodeLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_block_output: 1 << 16,
            max_block_compressed: 1 << 16,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_block_output: usize::MAX,
            max_block_compressed: usize::MAX,
        }
    }
}
