//! Per-attribute decode pipeline.
//!
//! Attributes decode in fixed stages shared across the whole stream:
//! residual decode, delta reconstruction, topology-dependent resolution,
//! then dequantization into the declared output type. Meshes run each
//! stage for every attribute before moving to the next, because normal
//! estimation needs the position residuals of the previous stage.

use glam::Vec3;
use wire::{AttributeCodec, AttributeDescriptor, ByteCursor, EntropyScheme, ValueType};

use crate::error::{DecodeError, DecodeResult};
use crate::geometry::AttributeBuffer;
use crate::limits::DecodeLimits;
use crate::normals::{correct_estimates, estimate_normals, mark_boundary, to_sphere};
use crate::residuals::{decode_array, decode_values};

/// How normal residuals relate to the transmitted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalPrediction {
    /// Residuals are plain octahedral deltas for every vertex.
    Diff,
    /// Normals are estimated from geometry; residuals correct every vertex.
    Estimated,
    /// Normals are estimated; residuals correct boundary vertices only.
    Border,
}

impl NormalPrediction {
    fn from_tag(tag: u8) -> DecodeResult<Self> {
        match tag {
            0 => Ok(Self::Diff),
            1 => Ok(Self::Estimated),
            2 => Ok(Self::Border),
            tag => Err(DecodeError::UnknownNormalPrediction { tag }),
        }
    }
}

enum State {
    Generic {
        residuals: Vec<i32>,
    },
    Color {
        quantization: [u8; 4],
        residuals: Vec<i32>,
    },
    Normal {
        prediction: NormalPrediction,
        residuals: Vec<i32>,
        resolved: Option<Vec<Vec3>>,
    },
}

/// Decoding state for one attribute, advanced stage by stage.
pub struct AttributeDecoder {
    pub descriptor: AttributeDescriptor,
    state: State,
}

impl AttributeDecoder {
    #[must_use]
    pub fn new(descriptor: AttributeDescriptor) -> Self {
        let state = match descriptor.codec {
            AttributeCodec::Generic => State::Generic {
                residuals: Vec::new(),
            },
            AttributeCodec::Color => State::Color {
                quantization: [0; 4],
                residuals: Vec::new(),
            },
            AttributeCodec::Normal => State::Normal {
                prediction: NormalPrediction::Diff,
                residuals: Vec::new(),
                resolved: None,
            },
        };
        Self { descriptor, state }
    }

    fn components(&self) -> usize {
        usize::from(self.descriptor.components)
    }

    fn unsupported_type(&self, codec: &'static str) -> DecodeError {
        DecodeError::UnsupportedAttributeType {
            codec,
            value_type: self.descriptor.value_type,
        }
    }

    /// Stage 1: entropy-decode the residual arrays for `nvert` vertices.
    pub fn decode(
        &mut self,
        nvert: usize,
        cursor: &mut ByteCursor<'_>,
        scheme: EntropyScheme,
        limits: &DecodeLimits,
    ) -> DecodeResult<()> {
        let components = self.components();
        let correlated = self.descriptor.strategy.is_correlated();
        match &mut self.state {
            State::Generic { residuals } => {
                let (mut values, _) = if correlated {
                    decode_array(cursor, scheme, limits, components)?
                } else {
                    decode_values(cursor, scheme, limits, components)?
                };
                values.resize(nvert * components, 0);
                *residuals = values;
            }
            State::Color {
                quantization,
                residuals,
            } => {
                if self.descriptor.value_type != ValueType::UInt8 {
                    return Err(DecodeError::UnsupportedAttributeType {
                        codec: "color",
                        value_type: self.descriptor.value_type,
                    });
                }
                if components < 3 {
                    return Err(DecodeError::InvalidComponentCount {
                        codec: "color",
                        components: self.descriptor.components,
                    });
                }
                for q in quantization.iter_mut() {
                    *q = cursor.read_u8()?;
                }
                let (mut values, _) = if correlated {
                    decode_array(cursor, scheme, limits, components)?
                } else {
                    decode_values(cursor, scheme, limits, components)?
                };
                values.resize(nvert * components, 0);
                *residuals = values;
            }
            State::Normal {
                prediction,
                residuals,
                ..
            } => {
                if !matches!(
                    self.descriptor.value_type,
                    ValueType::Float | ValueType::Int16
                ) {
                    return Err(DecodeError::UnsupportedAttributeType {
                        codec: "normal",
                        value_type: self.descriptor.value_type,
                    });
                }
                *prediction = NormalPrediction::from_tag(cursor.read_u8()?)?;
                let (mut values, count) = decode_array(cursor, scheme, limits, 2)?;
                // Border prediction transmits corrections for boundary
                // vertices only, so the short read is intentional.
                if *prediction == NormalPrediction::Border {
                    values.truncate(count * 2);
                } else {
                    values.resize(nvert * 2, 0);
                }
                *residuals = values;
            }
        }
        Ok(())
    }

    /// Stage 2: undo per-vertex delta prediction. `context` carries the
    /// reference vertices produced by connectivity traversal; point clouds
    /// pass `None` and fall back to sequential deltas.
    pub fn delta_decode(&mut self, nvert: usize, context: Option<&[[u32; 3]]>) {
        let components = self.components();
        let parallel = self.descriptor.strategy.is_parallel();
        match &mut self.state {
            State::Generic { residuals } | State::Color { residuals, .. } => {
                reconstruct_deltas(residuals, nvert, components, parallel, context);
            }
            State::Normal {
                prediction,
                residuals,
                ..
            } => {
                if *prediction != NormalPrediction::Diff {
                    return;
                }
                if let Some(context) = context {
                    for (i, refs) in context.iter().enumerate().take(nvert).skip(1) {
                        let a = refs[0] as usize;
                        for c in 0..2 {
                            residuals[i * 2 + c] =
                                residuals[i * 2 + c].wrapping_add(residuals[a * 2 + c]);
                        }
                    }
                } else {
                    for i in 2..nvert * 2 {
                        residuals[i] = residuals[i].wrapping_add(residuals[i - 2]);
                    }
                }
            }
        }
    }

    /// Whether stage 3 applies: estimated normals need the reconstructed
    /// position residuals and the face index.
    #[must_use]
    pub fn needs_position(&self) -> bool {
        matches!(
            self.state,
            State::Normal {
                prediction: NormalPrediction::Estimated | NormalPrediction::Border,
                ..
            }
        )
    }

    /// Stage 3: resolve estimated normals against the decoded topology.
    /// `positions` are the quantized (not yet dequantized) position values,
    /// three per vertex.
    pub fn post_delta(&mut self, nvert: usize, positions: &[i32], faces: &[u32]) {
        if let State::Normal {
            prediction,
            residuals,
            resolved,
        } = &mut self.state
        {
            let unit = self.descriptor.quant_step as i32;
            let correct_all = match prediction {
                NormalPrediction::Diff => return,
                NormalPrediction::Estimated => true,
                NormalPrediction::Border => false,
            };
            let estimated = estimate_normals(nvert, positions, faces);
            let boundary = if correct_all {
                vec![0; nvert]
            } else {
                mark_boundary(nvert, faces)
            };
            *resolved = Some(correct_estimates(
                &estimated, &boundary, residuals, unit, correct_all,
            ));
        }
    }

    /// Borrows the reconstructed integer values (after stage 2). Used to
    /// feed position data into normal estimation.
    #[must_use]
    pub fn quantized_values(&self) -> &[i32] {
        match &self.state {
            State::Generic { residuals }
            | State::Color { residuals, .. }
            | State::Normal { residuals, .. } => residuals,
        }
    }

    /// Stage 4: scale back to the declared output type.
    pub fn dequantize(&self, nvert: usize) -> DecodeResult<AttributeBuffer> {
        match &self.state {
            State::Generic { residuals } => {
                self.dequantize_generic(residuals, nvert * self.components())
            }
            State::Color {
                quantization,
                residuals,
            } => Ok(dequantize_color(
                residuals,
                quantization,
                nvert,
                self.components(),
            )),
            State::Normal {
                prediction,
                residuals,
                resolved,
            } => {
                let unit = self.descriptor.quant_step as i32;
                let normals = match (resolved, prediction) {
                    (Some(normals), _) => normals.clone(),
                    (None, NormalPrediction::Diff) => (0..nvert)
                        .map(|i| to_sphere([residuals[i * 2], residuals[i * 2 + 1]], unit))
                        .collect(),
                    // Estimation without topology leaves nothing to output.
                    (None, _) => vec![Vec3::ZERO; nvert],
                };
                match self.descriptor.value_type {
                    ValueType::Float => Ok(AttributeBuffer::Float(
                        normals.iter().flat_map(|n| [n.x, n.y, n.z]).collect(),
                    )),
                    ValueType::Int16 => Ok(AttributeBuffer::Int16(
                        normals
                            .iter()
                            .flat_map(|n| {
                                [
                                    (n.x * 32767.0) as i16,
                                    (n.y * 32767.0) as i16,
                                    (n.z * 32767.0) as i16,
                                ]
                            })
                            .collect(),
                    )),
                    _ => Err(self.unsupported_type("normal")),
                }
            }
        }
    }

    fn dequantize_generic(&self, residuals: &[i32], len: usize) -> DecodeResult<AttributeBuffer> {
        let q = f64::from(self.descriptor.quant_step);
        let scaled = residuals.iter().take(len).map(|&v| f64::from(v) * q);
        Ok(match self.descriptor.value_type {
            ValueType::Float => AttributeBuffer::Float(scaled.map(|v| v as f32).collect()),
            ValueType::Double => AttributeBuffer::Double(scaled.collect()),
            ValueType::Int32 => AttributeBuffer::Int32(scaled.map(|v| v as i32).collect()),
            ValueType::UInt32 => AttributeBuffer::UInt32(scaled.map(|v| v as u32).collect()),
            ValueType::Int16 => AttributeBuffer::Int16(scaled.map(|v| v as i16).collect()),
            ValueType::UInt16 => AttributeBuffer::UInt16(scaled.map(|v| v as u16).collect()),
            ValueType::Int8 => AttributeBuffer::Int8(scaled.map(|v| v as i8).collect()),
            ValueType::UInt8 => AttributeBuffer::UInt8(scaled.map(|v| v as u8).collect()),
        })
    }
}

fn reconstruct_deltas(
    residuals: &mut [i32],
    nvert: usize,
    components: usize,
    parallel: bool,
    context: Option<&[[u32; 3]]>,
) {
    match context {
        Some(context) if parallel => {
            for (i, refs) in context.iter().enumerate().take(nvert).skip(1) {
                let (a, b, c) = (refs[0] as usize, refs[1] as usize, refs[2] as usize);
                for k in 0..components {
                    let delta = residuals[a * components + k]
                        .wrapping_add(residuals[b * components + k])
                        .wrapping_sub(residuals[c * components + k]);
                    residuals[i * components + k] =
                        residuals[i * components + k].wrapping_add(delta);
                }
            }
        }
        Some(context) => {
            for (i, refs) in context.iter().enumerate().take(nvert).skip(1) {
                let a = refs[0] as usize;
                for k in 0..components {
                    residuals[i * components + k] =
                        residuals[i * components + k].wrapping_add(residuals[a * components + k]);
                }
            }
        }
        None => {
            for i in components..nvert * components {
                residuals[i] = residuals[i].wrapping_add(residuals[i - components]);
            }
        }
    }
}

/// Colors travel in a YCbCr-like differential space; converting back is
/// three additions and the per-channel quantization multipliers, truncated
/// to bytes. Output is tightly packed RGB.
fn dequantize_color(
    residuals: &[i32],
    quantization: &[u8; 4],
    nvert: usize,
    components: usize,
) -> AttributeBuffer {
    let q = |k: usize| i32::from(quantization[k]);
    let mut out = Vec::with_capacity(nvert * 3);
    for i in 0..nvert {
        let e0 = residuals[i * components];
        let e1 = residuals[i * components + 1];
        let e2 = residuals[i * components + 2];
        out.push((e2.wrapping_add(e0).wrapping_mul(q(0)) & 0xff) as u8);
        out.push((e0.wrapping_mul(q(1)) & 0xff) as u8);
        out.push((e1.wrapping_add(e0).wrapping_mul(q(2)) & 0xff) as u8);
    }
    AttributeBuffer::UInt8(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wire::StrategyFlags;

    fn descriptor(codec: AttributeCodec, value_type: ValueType, strategy: u8) -> AttributeDescriptor {
        AttributeDescriptor {
            name: "test".into(),
            codec,
            quant_step: 0.5,
            components: if codec == AttributeCodec::Color { 4 } else { 3 },
            value_type,
            strategy: StrategyFlags::new(strategy),
        }
    }

    #[test]
    fn sequential_delta_reconstruction() {
        let mut residuals = vec![10, 0, -1, 2, 3, -2];
        reconstruct_deltas(&mut residuals, 3, 2, false, None);
        assert_eq!(residuals, vec![10, 0, 9, 2, 12, 0]);
    }

    #[test]
    fn parallelogram_delta_uses_three_references() {
        // Vertex 3 is predicted from vertices 2, 1 and 0: a + b - c.
        let context = [[9, 9, 9], [0, 0, 0], [0, 0, 0], [2, 1, 0]];
        let mut residuals = vec![1, 5, 7, 1];
        reconstruct_deltas(&mut residuals, 4, 1, true, Some(&context));
        // Entries 1 and 2 reference vertex 0 three ways: v += 1 + 1 - 1.
        assert_eq!(residuals[1], 6);
        assert_eq!(residuals[2], 8);
        // Entry 3 reads the already-updated values: 1 + 8 + 6 - 1.
        assert_eq!(residuals[3], 14);
    }

    #[test]
    fn single_reference_delta_without_parallel() {
        let context = [[0, 0, 0], [0, 0, 0], [1, 0, 0]];
        let mut residuals = vec![4, 1, 2];
        reconstruct_deltas(&mut residuals, 3, 1, false, Some(&context));
        assert_eq!(residuals, vec![4, 5, 7]);
    }

    #[test]
    fn generic_dequantize_scales_by_step() {
        let mut d = descriptor(AttributeCodec::Generic, ValueType::Float, 0);
        d.quant_step = 0.25;
        let decoder = AttributeDecoder {
            descriptor: d,
            state: State::Generic {
                residuals: vec![4, -8, 0],
            },
        };
        let buffer = decoder.dequantize(1).unwrap();
        assert_eq!(buffer.as_f32(), Some(&[1.0f32, -2.0, 0.0][..]));
    }

    #[test]
    fn generic_dequantize_integer_output() {
        let mut d = descriptor(AttributeCodec::Generic, ValueType::Int16, 0);
        d.quant_step = 2.0;
        let decoder = AttributeDecoder {
            descriptor: d,
            state: State::Generic {
                residuals: vec![3, -5, 100],
            },
        };
        let buffer = decoder.dequantize(1).unwrap();
        assert_eq!(buffer.as_i16(), Some(&[6i16, -10, 200][..]));
    }

    #[test]
    fn color_dequantize_differential_channels() {
        let residuals = vec![10, 2, 3, 0, 20, -1, 1, 0];
        let qc = [1u8, 1, 1, 1];
        let buffer = dequantize_color(&residuals, &qc, 2, 4);
        // r = e2 + e0, g = e0, b = e1 + e0, all mod 256.
        assert_eq!(buffer.as_u8(), Some(&[13u8, 10, 12, 21, 20, 19][..]));
    }

    #[test]
    fn color_dequantize_applies_channel_multipliers() {
        let residuals = vec![16, 0, 0, 0];
        let qc = [4u8, 8, 16, 1];
        let buffer = dequantize_color(&residuals, &qc, 1, 4);
        // 16*4 = 64, 16*8 = 128, 16*16 = 256 wraps to 0.
        assert_eq!(buffer.as_u8(), Some(&[64u8, 128, 0][..]));
    }

    #[test]
    fn color_rejects_non_byte_output() {
        let mut decoder =
            AttributeDecoder::new(descriptor(AttributeCodec::Color, ValueType::Float, 0));
        let data = [0u8; 16];
        let mut cursor = ByteCursor::new(&data);
        let err = decoder
            .decode(
                1,
                &mut cursor,
                EntropyScheme::Raw,
                &DecodeLimits::for_testing(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnsupportedAttributeType { codec: "color", .. }
        ));
    }

    #[test]
    fn normal_rejects_unsigned_output() {
        let mut decoder =
            AttributeDecoder::new(descriptor(AttributeCodec::Normal, ValueType::UInt32, 0));
        let data = [0u8; 16];
        let mut cursor = ByteCursor::new(&data);
        let err = decoder
            .decode(
                1,
                &mut cursor,
                EntropyScheme::Raw,
                &DecodeLimits::for_testing(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnsupportedAttributeType {
                codec: "normal",
                ..
            }
        ));
    }

    #[test]
    fn normal_diff_dequantize_unit_length() {
        let mut d = descriptor(AttributeCodec::Normal, ValueType::Float, 0);
        d.quant_step = 512.0;
        let decoder = AttributeDecoder {
            descriptor: d,
            state: State::Normal {
                prediction: NormalPrediction::Diff,
                residuals: vec![0, 0, 512, 0],
                resolved: None,
            },
        };
        let buffer = decoder.dequantize(2).unwrap();
        let values = buffer.as_f32().unwrap();
        assert_eq!(&values[0..3], &[0.0, 0.0, 1.0]);
        assert_eq!(&values[3..6], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn estimated_normals_resolve_from_topology() {
        // One CCW triangle in the z = 0 plane with zero corrections: every
        // vertex resolves to the +Z face normal.
        let mut d = descriptor(AttributeCodec::Normal, ValueType::Float, 0);
        d.quant_step = 512.0;
        let mut decoder = AttributeDecoder {
            descriptor: d,
            state: State::Normal {
                prediction: NormalPrediction::Estimated,
                residuals: vec![0; 6],
                resolved: None,
            },
        };
        let positions = [0, 0, 0, 10, 0, 0, 0, 10, 0];
        let faces = [0u32, 1, 2];
        decoder.post_delta(3, &positions, &faces);
        let buffer = decoder.dequantize(3).unwrap();
        let values = buffer.as_f32().unwrap();
        assert_eq!(values, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn post_delta_leaves_other_codecs_untouched() {
        let mut decoder = AttributeDecoder {
            descriptor: descriptor(AttributeCodec::Generic, ValueType::Float, 0),
            state: State::Generic {
                residuals: vec![1, 2, 3],
            },
        };
        decoder.post_delta(1, &[], &[]);
        assert_eq!(decoder.quantized_values(), &[1, 2, 3]);
    }

    #[test]
    fn normal_prediction_tags() {
        assert_eq!(
            NormalPrediction::from_tag(0).unwrap(),
            NormalPrediction::Diff
        );
        assert_eq!(
            NormalPrediction::from_tag(1).unwrap(),
            NormalPrediction::Estimated
        );
        assert_eq!(
            NormalPrediction::from_tag(2).unwrap(),
            NormalPrediction::Border
        );
        assert!(matches!(
            NormalPrediction::from_tag(9).unwrap_err(),
            DecodeError::UnknownNormalPrediction { tag: 9 }
        ));
    }
}
