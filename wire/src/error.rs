//! Error types for container parsing.

use std::fmt;

/// Result type for container parsing operations.
pub type WireResult<T> = Result<T, FormatError>;

/// Errors raised while parsing the container layout.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatError {
    /// Read past the end of the input buffer.
    UnexpectedEnd { needed: usize, available: usize },

    /// Invalid magic number at the start of the stream.
    InvalidMagic { found: u32 },

    /// Unsupported container version.
    UnsupportedVersion { found: i32 },

    /// Entropy scheme id this decoder does not handle.
    UnsupportedEntropy { id: u8 },

    /// Unknown attribute codec id.
    UnknownCodec { id: i32 },

    /// Unknown attribute value type tag.
    UnknownValueType { tag: u8 },

    /// A declared count field is negative.
    NegativeCount { field: &'static str, found: i32 },

    /// A string length prefix of zero (the length includes the NUL terminator,
    /// so it must be at least one).
    EmptyStringLength,

    /// String bytes are not valid UTF-8.
    InvalidUtf8,

    /// A declared size exceeds the configured limits.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },
}

/// Specific parse limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    MetadataEntries,
    Attributes,
    StringLength,
    Groups,
    VertexCount,
    FaceCount,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEnd { needed, available } => {
                write!(
                    f,
                    "unexpected end of input: need {needed} bytes, have {available}"
                )
            }
            Self::InvalidMagic { found } => {
                write!(f, "invalid magic number: 0x{found:08X}")
            }
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported container version: {found}")
            }
            Self::UnsupportedEntropy { id } => {
                write!(f, "unsupported entropy scheme: {id}")
            }
            Self::UnknownCodec { id } => {
                write!(f, "unknown attribute codec id: {id}")
            }
            Self::UnknownValueType { tag } => {
                write!(f, "unknown attribute value type tag: {tag}")
            }
            Self::NegativeCount { field, found } => {
                write!(f, "negative {field} count: {found}")
            }
            Self::EmptyStringLength => {
                write!(f, "string length prefix of zero")
            }
            Self::InvalidUtf8 => {
                write!(f, "string bytes are not valid UTF-8")
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MetadataEntries => "metadata entries",
            Self::Attributes => "attribute count",
            Self::StringLength => "string length",
            Self::Groups => "group count",
            Self::VertexCount => "vertex count",
            Self::FaceCount => "face count",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for FormatError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_magic() {
        let err = FormatError::InvalidMagic { found: 0xDEAD_BEEF };
        let msg = err.to_string();
        assert!(msg.contains("DEADBEEF"));
    }

    #[test]
    fn display_unexpected_end() {
        let err = FormatError::UnexpectedEnd {
            needed: 4,
            available: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("4 bytes"));
        assert!(msg.contains('1'));
    }

    #[test]
    fn display_limits_exceeded() {
        let err = FormatError::LimitsExceeded {
            kind: LimitKind::Groups,
            limit: 16,
            actual: 900,
        };
        let msg = err.to_string();
        assert!(msg.contains("group count"));
        assert!(msg.contains("900"));
    }

    #[test]
    fn display_negative_count() {
        let err = FormatError::NegativeCount {
            field: "attribute",
            found: -3,
        };
        assert!(err.to_string().contains("-3"));
    }

    #[test]
    fn error_equality_and_clone() {
        let err = FormatError::UnsupportedEntropy { id: 3 };
        assert_eq!(err.clone(), err);
        assert_ne!(err, FormatError::UnsupportedEntropy { id: 4 });
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<FormatError>();
    }
}
