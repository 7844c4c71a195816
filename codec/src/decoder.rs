//! Top-level stream decoding.
//!
//! # Design Principles
//!
//! - **Single pass**: the stream is consumed front to back, one cursor,
//!   no seeking.
//! - **Stage batching**: meshes run each attribute stage across all
//!   attributes before the next stage, because normal estimation reads the
//!   reconstructed position values of another attribute.
//! - **Fail fast**: every declared count is validated before allocation.

use tracing::debug;
use wire::{decode_groups, decode_header, AttributeCodec, ByteCursor, Limits};

use crate::attributes::AttributeDecoder;
use crate::connectivity::decode_connectivity;
use crate::error::{DecodeError, DecodeResult};
use crate::geometry::Geometry;
use crate::limits::DecodeLimits;

/// Stream decoder with configurable safety limits.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    wire_limits: Limits,
    limits: DecodeLimits,
}

impl Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_limits(wire_limits: Limits, limits: DecodeLimits) -> Self {
        Self { wire_limits, limits }
    }

    /// Decodes one complete stream into a [`Geometry`].
    pub fn decode(&self, data: &[u8]) -> DecodeResult<Geometry> {
        let mut cursor = ByteCursor::new(data);
        let header = decode_header(&mut cursor, &self.wire_limits)?;
        debug!(
            version = header.version,
            vertices = header.vertex_count,
            faces = header.face_count,
            attributes = header.attributes.len(),
            "header decoded"
        );
        let groups = decode_groups(&mut cursor, &self.wire_limits)?;

        let nvert = header.vertex_count as usize;
        let mut decoders: Vec<AttributeDecoder> = header
            .attributes
            .iter()
            .cloned()
            .map(AttributeDecoder::new)
            .collect();

        let index = if header.face_count == 0 {
            // Point cloud: attributes are self-contained, vertices are
            // assumed ordered by proximity.
            for decoder in &mut decoders {
                decoder.decode(nvert, &mut cursor, header.entropy, &self.limits)?;
                decoder.delta_decode(nvert, None);
            }
            None
        } else {
            let ends = face_range_ends(&groups, header.face_count)?;
            let connectivity = decode_connectivity(
                &mut cursor,
                header.entropy,
                &self.limits,
                header.vertex_count,
                header.face_count,
                &ends,
            )?;
            debug!(
                vertices = connectivity.vertex_count,
                faces = header.face_count,
                "connectivity decoded"
            );

            for decoder in &mut decoders {
                decoder.decode(nvert, &mut cursor, header.entropy, &self.limits)?;
            }
            for decoder in &mut decoders {
                decoder.delta_decode(nvert, Some(&connectivity.prediction));
            }
            if decoders.iter().any(AttributeDecoder::needs_position) {
                let positions = position_values(&decoders, nvert)?;
                for decoder in &mut decoders {
                    decoder.post_delta(nvert, &positions, &connectivity.faces);
                }
            }
            Some(connectivity.faces)
        };

        let mut attributes = Vec::with_capacity(decoders.len());
        for decoder in &decoders {
            let buffer = decoder.dequantize(nvert)?;
            attributes.push((decoder.descriptor.name.clone(), buffer));
        }
        debug!(attributes = attributes.len(), "attributes dequantized");

        Ok(Geometry {
            vertex_count: header.vertex_count,
            face_count: header.face_count,
            index,
            metadata: header.metadata,
            groups,
            attributes,
        })
    }
}

/// Convenience wrapper: decode with default limits.
pub fn decode(data: &[u8]) -> DecodeResult<Geometry> {
    Decoder::new().decode(data)
}

/// Validates group face ranges: non-decreasing ends covering exactly
/// `nface` faces. A stream without groups decodes as one implicit group.
fn face_range_ends(groups: &[wire::Group], nface: u32) -> DecodeResult<Vec<u32>> {
    if groups.is_empty() {
        return Ok(vec![nface]);
    }
    let mut previous = 0u32;
    for group in groups {
        if group.end < previous || group.end > nface {
            return Err(DecodeError::GroupRange {
                end: group.end,
                limit: nface,
            });
        }
        previous = group.end;
    }
    if previous != nface {
        return Err(DecodeError::GroupRange {
            end: previous,
            limit: nface,
        });
    }
    Ok(groups.iter().map(|g| g.end).collect())
}

/// Copies out the reconstructed position values needed by normal
/// estimation, padded to three components per vertex.
fn position_values(decoders: &[AttributeDecoder], nvert: usize) -> DecodeResult<Vec<i32>> {
    let position = decoders
        .iter()
        .find(|d| {
            d.descriptor.name == "position"
                && d.descriptor.codec == AttributeCodec::Generic
                && d.descriptor.components == 3
        })
        .ok_or(DecodeError::MissingPositionAttribute)?;
    let mut values = position.quantized_values().to_vec();
    values.resize(nvert * 3, 0);
    Ok(values)
}
