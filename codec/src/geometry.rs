//! Decoded geometry containers.

use wire::Group;

/// A dequantized attribute buffer in its declared output type.
///
/// Values are interleaved per vertex (e.g. `x y z x y z ...` for a
/// three-component attribute).
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeBuffer {
    Float(Vec<f32>),
    Double(Vec<f64>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
}

impl AttributeBuffer {
    /// Total number of scalar values across all vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::UInt32(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::UInt16(v) => v.len(),
            Self::Int8(v) => v.len(),
            Self::UInt8(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows the values if this buffer holds 32-bit floats.
    #[must_use]
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows the values if this buffer holds unsigned bytes.
    #[must_use]
    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            Self::UInt8(v) => Some(v),
            _ => None,
        }
    }

    /// Borrows the values if this buffer holds signed 16-bit integers.
    #[must_use]
    pub fn as_i16(&self) -> Option<&[i16]> {
        match self {
            Self::Int16(v) => Some(v),
            _ => None,
        }
    }
}

/// A fully decoded mesh or point cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// Number of vertices.
    pub vertex_count: u32,
    /// Number of faces; zero for point clouds.
    pub face_count: u32,
    /// Triangle index buffer, three vertex ids per face. `None` for point
    /// clouds.
    pub index: Option<Vec<u32>>,
    /// Key/value pairs carried verbatim from the container header.
    pub metadata: Vec<(String, String)>,
    /// Face groups with their exclusive end offsets and properties.
    pub groups: Vec<Group>,
    /// Decoded attributes in stream order.
    pub attributes: Vec<(String, AttributeBuffer)>,
}

impl Geometry {
    /// Looks up a decoded attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeBuffer> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, buffer)| buffer)
    }

    /// Decoded vertex positions as interleaved floats, when the stream
    /// carries a float `position` attribute.
    #[must_use]
    pub fn positions(&self) -> Option<&[f32]> {
        self.attribute("position").and_then(AttributeBuffer::as_f32)
    }

    /// The decoded `normal` attribute, if present.
    #[must_use]
    pub fn normals(&self) -> Option<&AttributeBuffer> {
        self.attribute("normal")
    }

    /// The decoded `color` attribute, if present.
    #[must_use]
    pub fn colors(&self) -> Option<&AttributeBuffer> {
        self.attribute("color")
    }

    /// The decoded `uv` attribute, if present.
    #[must_use]
    pub fn uvs(&self) -> Option<&AttributeBuffer> {
        self.attribute("uv")
    }

    /// Metadata value for a key, if present.
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub const fn is_point_cloud(&self) -> bool {
        self.face_count == 0
    }
}
