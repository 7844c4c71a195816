//! Container header and attribute descriptor table.

use crate::cursor::ByteCursor;
use crate::error::{FormatError, LimitKind, WireResult};
use crate::limits::Limits;

/// Magic number identifying the container format.
pub const MAGIC: u32 = 0x787A_6300;

/// Container version this decoder understands.
pub const VERSION: i32 = 1;

/// Entropy scheme used for all compressed blocks in a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropyScheme {
    /// Blocks are stored as literal bytes.
    Raw,
    /// Blocks are Tunstall-coded.
    Tunstall,
}

impl EntropyScheme {
    /// Parses the entropy scheme byte.
    ///
    /// Ids 2 (Huffman), 3 (zlib) and 4 (LZ4) exist in the format but are not
    /// handled by this decoder; they are rejected along with unknown ids.
    pub fn from_tag(tag: u8) -> WireResult<Self> {
        match tag {
            0 => Ok(Self::Raw),
            1 => Ok(Self::Tunstall),
            id => Err(FormatError::UnsupportedEntropy { id }),
        }
    }
}

/// Numeric type of an attribute's output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    UInt32,
    Int32,
    UInt16,
    Int16,
    UInt8,
    Int8,
    Float,
    Double,
}

impl ValueType {
    pub fn from_tag(tag: u8) -> WireResult<Self> {
        match tag {
            0 => Ok(Self::UInt32),
            1 => Ok(Self::Int32),
            2 => Ok(Self::UInt16),
            3 => Ok(Self::Int16),
            4 => Ok(Self::UInt8),
            5 => Ok(Self::Int8),
            6 => Ok(Self::Float),
            7 => Ok(Self::Double),
            tag => Err(FormatError::UnknownValueType { tag }),
        }
    }

    /// Size of one component in bytes.
    #[must_use]
    pub const fn byte_size(self) -> usize {
        match self {
            Self::UInt8 | Self::Int8 => 1,
            Self::UInt16 | Self::Int16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float => 4,
            Self::Double => 8,
        }
    }
}

/// Which decoding behavior an attribute uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeCodec {
    Generic,
    Normal,
    Color,
}

impl AttributeCodec {
    pub fn from_id(id: i32) -> WireResult<Self> {
        match id {
            1 => Ok(Self::Generic),
            2 => Ok(Self::Normal),
            3 => Ok(Self::Color),
            id => Err(FormatError::UnknownCodec { id }),
        }
    }
}

/// Prediction-strategy flags for one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrategyFlags(u8);

impl StrategyFlags {
    /// Residuals were produced against a parallelogram prediction.
    pub const PARALLEL: u8 = 0x1;
    /// Components are correlated; residual blocks share one width stream.
    pub const CORRELATED: u8 = 0x2;

    #[must_use]
    pub const fn new(bits: u8) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_parallel(self) -> bool {
        self.0 & Self::PARALLEL != 0
    }

    #[must_use]
    pub const fn is_correlated(self) -> bool {
        self.0 & Self::CORRELATED != 0
    }
}

/// One entry of the attribute descriptor table.
///
/// Created once per stream at header parse time; immutable thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDescriptor {
    pub name: String,
    pub codec: AttributeCodec,
    /// Quantization step: the multiplier turning integer residuals back into
    /// real values.
    pub quant_step: f32,
    /// Number of residual components per vertex.
    pub components: u8,
    pub value_type: ValueType,
    pub strategy: StrategyFlags,
}

/// Parsed container header.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: i32,
    pub entropy: EntropyScheme,
    /// String-keyed metadata, in stream order.
    pub metadata: Vec<(String, String)>,
    pub attributes: Vec<AttributeDescriptor>,
    pub vertex_count: u32,
    pub face_count: u32,
}

fn read_count(
    cursor: &mut ByteCursor<'_>,
    field: &'static str,
    kind: LimitKind,
    limit: usize,
) -> WireResult<usize> {
    let found = cursor.read_i32()?;
    if found < 0 {
        return Err(FormatError::NegativeCount { field, found });
    }
    let actual = found as usize;
    if actual > limit {
        return Err(FormatError::LimitsExceeded {
            kind,
            limit,
            actual,
        });
    }
    Ok(actual)
}

fn read_bounded_string(cursor: &mut ByteCursor<'_>, limits: &Limits) -> WireResult<String> {
    let text = cursor.read_string()?;
    if text.len() > limits.max_string_len {
        return Err(FormatError::LimitsExceeded {
            kind: LimitKind::StringLength,
            limit: limits.max_string_len,
            actual: text.len(),
        });
    }
    Ok(text)
}

/// Parses the container header from the current cursor position.
pub fn decode_header(cursor: &mut ByteCursor<'_>, limits: &Limits) -> WireResult<Header> {
    let magic = cursor.read_i32()? as u32;
    if magic != MAGIC {
        return Err(FormatError::InvalidMagic { found: magic });
    }
    let version = cursor.read_i32()?;
    if version != VERSION {
        return Err(FormatError::UnsupportedVersion { found: version });
    }
    let entropy = EntropyScheme::from_tag(cursor.read_u8()?)?;

    let metadata_count = read_count(
        cursor,
        "metadata",
        LimitKind::MetadataEntries,
        limits.max_metadata_entries,
    )?;
    let mut metadata = Vec::with_capacity(metadata_count);
    for _ in 0..metadata_count {
        let key = read_bounded_string(cursor, limits)?;
        let value = read_bounded_string(cursor, limits)?;
        metadata.push((key, value));
    }

    let attribute_count = read_count(
        cursor,
        "attribute",
        LimitKind::Attributes,
        limits.max_attributes,
    )?;
    let mut attributes = Vec::with_capacity(attribute_count);
    for _ in 0..attribute_count {
        let name = read_bounded_string(cursor, limits)?;
        let codec = AttributeCodec::from_id(cursor.read_i32()?)?;
        let quant_step = cursor.read_f32()?;
        let components = cursor.read_u8()?;
        let value_type = ValueType::from_tag(cursor.read_u8()?)?;
        let strategy = StrategyFlags::new(cursor.read_u8()?);
        attributes.push(AttributeDescriptor {
            name,
            codec,
            quant_step,
            components,
            value_type,
            strategy,
        });
    }

    let vertex_count = read_count(
        cursor,
        "vertex",
        LimitKind::VertexCount,
        limits.max_vertices,
    )? as u32;
    let face_count =
        read_count(cursor, "face", LimitKind::FaceCount, limits.max_faces)? as u32;

    Ok(Header {
        version,
        entropy,
        metadata,
        attributes,
        vertex_count,
        face_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_string(out: &mut Vec<u8>, text: &str) {
        out.extend_from_slice(&((text.len() + 1) as u16).to_le_bytes());
        out.extend_from_slice(text.as_bytes());
        out.push(0);
    }

    fn minimal_header_bytes() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&(MAGIC as i32).to_le_bytes());
        data.extend_from_slice(&VERSION.to_le_bytes());
        data.push(1); // Tunstall
        data.extend_from_slice(&1i32.to_le_bytes()); // metadata count
        push_string(&mut data, "created-by");
        push_string(&mut data, "mdec-tests");
        data.extend_from_slice(&1i32.to_le_bytes()); // attribute count
        push_string(&mut data, "position");
        data.extend_from_slice(&1i32.to_le_bytes()); // generic codec
        data.extend_from_slice(&0.01f32.to_le_bytes());
        data.push(3); // components
        data.push(6); // float
        data.push(StrategyFlags::PARALLEL);
        data.extend_from_slice(&100i32.to_le_bytes()); // nvert
        data.extend_from_slice(&196i32.to_le_bytes()); // nface
        data
    }

    #[test]
    fn parse_minimal_header() {
        let data = minimal_header_bytes();
        let mut cursor = ByteCursor::new(&data);
        let header = decode_header(&mut cursor, &Limits::for_testing()).unwrap();

        assert_eq!(header.version, VERSION);
        assert_eq!(header.entropy, EntropyScheme::Tunstall);
        assert_eq!(
            header.metadata,
            vec![("created-by".to_owned(), "mdec-tests".to_owned())]
        );
        assert_eq!(header.vertex_count, 100);
        assert_eq!(header.face_count, 196);

        let attr = &header.attributes[0];
        assert_eq!(attr.name, "position");
        assert_eq!(attr.codec, AttributeCodec::Generic);
        assert_eq!(attr.components, 3);
        assert_eq!(attr.value_type, ValueType::Float);
        assert!(attr.strategy.is_parallel());
        assert!(!attr.strategy.is_correlated());
    }

    #[test]
    fn bad_magic_rejected() {
        let mut data = minimal_header_bytes();
        data[0] ^= 0xFF;
        let mut cursor = ByteCursor::new(&data);
        let err = decode_header(&mut cursor, &Limits::for_testing()).unwrap_err();
        assert!(matches!(err, FormatError::InvalidMagic { .. }));
    }

    #[test]
    fn bad_version_rejected() {
        let mut data = minimal_header_bytes();
        data[4] = 9;
        let mut cursor = ByteCursor::new(&data);
        let err = decode_header(&mut cursor, &Limits::for_testing()).unwrap_err();
        assert_eq!(err, FormatError::UnsupportedVersion { found: 9 });
    }

    #[test]
    fn zlib_entropy_rejected() {
        let mut data = minimal_header_bytes();
        data[8] = 3;
        let mut cursor = ByteCursor::new(&data);
        let err = decode_header(&mut cursor, &Limits::for_testing()).unwrap_err();
        assert_eq!(err, FormatError::UnsupportedEntropy { id: 3 });
    }

    #[test]
    fn attribute_limit_enforced() {
        let data = minimal_header_bytes();
        let limits = Limits {
            max_attributes: 0,
            ..Limits::for_testing()
        };
        let mut cursor = ByteCursor::new(&data);
        let err = decode_header(&mut cursor, &limits).unwrap_err();
        assert!(matches!(
            err,
            FormatError::LimitsExceeded {
                kind: LimitKind::Attributes,
                ..
            }
        ));
    }

    #[test]
    fn vertex_limit_enforced() {
        let data = minimal_header_bytes();
        let limits = Limits {
            max_vertices: 10,
            ..Limits::for_testing()
        };
        let mut cursor = ByteCursor::new(&data);
        let err = decode_header(&mut cursor, &limits).unwrap_err();
        assert!(matches!(
            err,
            FormatError::LimitsExceeded {
                kind: LimitKind::VertexCount,
                ..
            }
        ));
    }

    #[test]
    fn value_type_sizes() {
        assert_eq!(ValueType::UInt8.byte_size(), 1);
        assert_eq!(ValueType::Int16.byte_size(), 2);
        assert_eq!(ValueType::Float.byte_size(), 4);
        assert_eq!(ValueType::Double.byte_size(), 8);
    }

    #[test]
    fn unknown_value_type() {
        assert_eq!(
            ValueType::from_tag(8).unwrap_err(),
            FormatError::UnknownValueType { tag: 8 }
        );
    }

    #[test]
    fn unknown_codec_id() {
        assert_eq!(
            AttributeCodec::from_id(100).unwrap_err(),
            FormatError::UnknownCodec { id: 100 }
        );
    }

    #[test]
    fn strategy_flags() {
        let both = StrategyFlags::new(StrategyFlags::PARALLEL | StrategyFlags::CORRELATED);
        assert!(both.is_parallel());
        assert!(both.is_correlated());
        assert_eq!(both.bits(), 0x3);
        assert!(!StrategyFlags::default().is_parallel());
    }
}
