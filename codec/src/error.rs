//! Error types for geometry decoding.

use std::fmt;

use bitstream::BitError;
use wire::{FormatError, ValueType};

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors that abort a decode call.
///
/// Every variant is fatal to the in-progress decode: there is no partial
/// result and no retry within a call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Container layout violation.
    Format(FormatError),

    /// Bit-level read failure inside a compressed section.
    Bits(BitError),

    /// A declared block size exceeds the defensive sanity bound.
    SizeSanity {
        field: &'static str,
        declared: usize,
        limit: usize,
    },

    /// Connectivity reconstruction failure.
    Topology(TopologyError),

    /// A group end offset lies outside the declared face range.
    GroupRange { end: u32, limit: u32 },

    /// The normal attribute declared a prediction mode outside the known
    /// set.
    UnknownNormalPrediction { tag: u8 },

    /// An attribute declared fewer components than its codec requires.
    InvalidComponentCount {
        codec: &'static str,
        components: u8,
    },

    /// The declared value type cannot be produced by this attribute codec.
    UnsupportedAttributeType {
        codec: &'static str,
        value_type: ValueType,
    },

    /// Normal estimation requires a generic "position" attribute that the
    /// stream does not carry.
    MissingPositionAttribute,
}

/// Failures of the front-edge traversal state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyError {
    /// A resolved vertex id is not below the declared vertex count.
    VertexOutOfRange { vertex: u32, nvert: u32 },

    /// A traversal code outside the known alphabet.
    InvalidCode { code: u8 },

    /// The traversal-code stream ended before all faces were resolved.
    CodesExhausted,

    /// No front edge was available where one was expected.
    NoEdgeToResolve,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(err) => write!(f, "format error: {err}"),
            Self::Bits(err) => write!(f, "bitstream error: {err}"),
            Self::SizeSanity {
                field,
                declared,
                limit,
            } => {
                write!(
                    f,
                    "declared {field} size {declared} exceeds sanity bound {limit}"
                )
            }
            Self::Topology(err) => write!(f, "topology error: {err}"),
            Self::GroupRange { end, limit } => {
                write!(f, "group end offset {end} out of range (limit {limit})")
            }
            Self::UnknownNormalPrediction { tag } => {
                write!(f, "unknown normal prediction mode: {tag}")
            }
            Self::InvalidComponentCount { codec, components } => {
                write!(
                    f,
                    "{codec} attribute cannot have {components} components"
                )
            }
            Self::UnsupportedAttributeType { codec, value_type } => {
                write!(
                    f,
                    "value type {value_type:?} not supported by the {codec} attribute codec"
                )
            }
            Self::MissingPositionAttribute => {
                write!(
                    f,
                    "normal estimation requires a generic position attribute"
                )
            }
        }
    }
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VertexOutOfRange { vertex, nvert } => {
                write!(f, "vertex id {vertex} out of range (nvert {nvert})")
            }
            Self::InvalidCode { code } => {
                write!(f, "invalid traversal code: {code}")
            }
            Self::CodesExhausted => {
                write!(f, "traversal code stream exhausted")
            }
            Self::NoEdgeToResolve => {
                write!(f, "no front edge available to resolve")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Format(err) => Some(err),
            Self::Bits(err) => Some(err),
            Self::Topology(err) => Some(err),
            _ => None,
        }
    }
}

impl std::error::Error for TopologyError {}

impl From<FormatError> for DecodeError {
    fn from(err: FormatError) -> Self {
        Self::Format(err)
    }
}

impl From<BitError> for DecodeError {
    fn from(err: BitError) -> Self {
        Self::Bits(err)
    }
}

impl From<TopologyError> for DecodeError {
    fn from(err: TopologyError) -> Self {
        Self::Topology(err)
    }
}
