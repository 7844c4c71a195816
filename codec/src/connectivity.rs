//! Triangle connectivity reconstruction from a traversal-code stream.
//!
//! Faces arrive as a sequence of codes over the CLERS alphabet plus an
//! explicit bitstream of split vertex indices. The decoder maintains a front
//! of edges bounding the already-reconstructed region; each code tells it
//! how the next face attaches to that front. No explicit adjacency is ever
//! transmitted.

use bitstream::BitReader;
use wire::{ByteCursor, EntropyScheme};

use crate::error::{DecodeResult, TopologyError};
use crate::limits::DecodeLimits;
use crate::tunstall::decode_block;

const VERTEX: u8 = 0;
const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const END: u8 = 3;
const BOUNDARY: u8 = 4;
const DELAY: u8 = 5;
const SPLIT: u8 = 6;

/// Output of connectivity decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connectivity {
    /// Face index buffer, three vertex ids per face.
    pub faces: Vec<u32>,
    /// Per-vertex prediction context: three reference vertex ids used by
    /// parallelogram-style delta prediction. Entry 0 is never consulted.
    pub prediction: Vec<[u32; 3]>,
    /// Number of vertex ids actually assigned during traversal.
    pub vertex_count: u32,
}

/// A front edge record. `v0 == -1` marks a soft-deleted record; `prev` and
/// `next` are indexes into the same arena.
#[derive(Debug, Clone, Copy)]
struct FrontEdge {
    v0: i32,
    v1: i32,
    v2: i32,
    prev: usize,
    next: usize,
}

const fn ilog2(mut value: u32) -> u32 {
    let mut k = 0;
    while value > 1 {
        value >>= 1;
        k += 1;
    }
    k
}

/// Decodes the connectivity section at the cursor: the maximum front size
/// hint, the Tunstall-coded traversal codes, and the split-index bitstream.
///
/// `face_range_ends` holds the exclusive end offset of each group's face
/// range, already validated as non-decreasing and bounded by the total face
/// count. The traversal-code cursor and the vertex counter persist across
/// ranges; the front itself restarts per range.
pub fn decode_connectivity(
    cursor: &mut ByteCursor<'_>,
    scheme: EntropyScheme,
    limits: &DecodeLimits,
    nvert: u32,
    nface: u32,
    face_range_ends: &[u32],
) -> DecodeResult<Connectivity> {
    let max_front = cursor.read_u32()?;
    let clers = decode_block(cursor, scheme, limits)?;
    let words = cursor.read_bit_section()?;

    let mut traversal = Traversal {
        clers: &clers,
        cler_pos: 0,
        bits: BitReader::new(&words),
        nvert,
        split_bits: ilog2(nvert) + 1,
        front_capacity: (max_front as usize).min(3 * nface as usize + 3),
        faces: vec![0u32; nface as usize * 3],
        prediction: vec![[0u32; 3]; nvert as usize],
        vertex_count: 0,
    };

    let mut start = 0u32;
    for &end in face_range_ends {
        traversal.decode_range(start, end)?;
        start = end;
    }

    Ok(Connectivity {
        faces: traversal.faces,
        prediction: traversal.prediction,
        vertex_count: traversal.vertex_count,
    })
}

struct Traversal<'a> {
    clers: &'a [u8],
    cler_pos: usize,
    bits: BitReader<'a>,
    nvert: u32,
    split_bits: u32,
    front_capacity: usize,
    faces: Vec<u32>,
    prediction: Vec<[u32; 3]>,
    vertex_count: u32,
}

impl Traversal<'_> {
    fn next_code(&mut self) -> DecodeResult<u8> {
        let code = *self
            .clers
            .get(self.cler_pos)
            .ok_or(TopologyError::CodesExhausted)?;
        self.cler_pos += 1;
        Ok(code)
    }

    /// Consumes the next code only if it is a SPLIT lookahead.
    fn take_split_lookahead(&mut self) -> bool {
        if self.clers.get(self.cler_pos) == Some(&SPLIT) {
            self.cler_pos += 1;
            true
        } else {
            false
        }
    }

    fn read_split_index(&mut self) -> DecodeResult<u32> {
        let vertex = self.bits.read(self.split_bits)?;
        self.check_vertex(vertex)?;
        Ok(vertex)
    }

    fn check_vertex(&self, vertex: u32) -> DecodeResult<()> {
        if vertex >= self.nvert {
            return Err(TopologyError::VertexOutOfRange {
                vertex,
                nvert: self.nvert,
            }
            .into());
        }
        Ok(())
    }

    /// Assigns the next sequential vertex id with the given prediction
    /// context.
    fn new_vertex(&mut self, context: [u32; 3]) -> DecodeResult<u32> {
        let vertex = self.vertex_count;
        self.check_vertex(vertex)?;
        self.prediction[vertex as usize] = context;
        self.vertex_count += 1;
        Ok(vertex)
    }

    #[allow(clippy::too_many_lines)]
    fn decode_range(&mut self, start_face: u32, end_face: u32) -> DecodeResult<()> {
        let mut out = start_face as usize * 3;
        let end = end_face as usize * 3;

        let mut front: Vec<FrontEdge> = Vec::with_capacity(self.front_capacity);
        let mut fifo: Vec<usize> = Vec::new();
        let mut fifo_pos = 0usize;
        let mut delayed: Vec<usize> = Vec::new();
        let mut new_edge: Option<usize> = None;

        while out < end {
            if new_edge.is_none() && fifo_pos >= fifo.len() && delayed.is_empty() {
                // Seed a fresh triangle. Vertices are sequential unless the
                // 3-bit split mask says they arrive as explicit indices.
                let mut last = self.vertex_count.wrapping_sub(1);
                let split = if self.take_split_lookahead() {
                    self.bits.read(3)?
                } else {
                    0
                };

                let mut vindex = [0u32; 3];
                for (k, slot) in vindex.iter_mut().enumerate() {
                    let v = if split & (1 << k) != 0 {
                        self.read_split_index()?
                    } else {
                        let v = self.new_vertex([last; 3])?;
                        last = v;
                        v
                    };
                    *slot = v;
                    self.faces[out] = v;
                    out += 1;
                }

                let e = front.len();
                fifo.push(e);
                front.push(FrontEdge {
                    v0: vindex[1] as i32,
                    v1: vindex[2] as i32,
                    v2: vindex[0] as i32,
                    prev: e + 2,
                    next: e + 1,
                });
                fifo.push(e + 1);
                front.push(FrontEdge {
                    v0: vindex[2] as i32,
                    v1: vindex[0] as i32,
                    v2: vindex[1] as i32,
                    prev: e,
                    next: e + 2,
                });
                fifo.push(e + 2);
                front.push(FrontEdge {
                    v0: vindex[0] as i32,
                    v1: vindex[1] as i32,
                    v2: vindex[2] as i32,
                    prev: e + 1,
                    next: e,
                });
                continue;
            }

            let edge = if let Some(e) = new_edge.take() {
                e
            } else if fifo_pos < fifo.len() {
                let e = fifo[fifo_pos];
                fifo_pos += 1;
                e
            } else if let Some(e) = delayed.pop() {
                e
            } else {
                return Err(TopologyError::NoEdgeToResolve.into());
            };

            if front[edge].v0 < 0 {
                continue; // soft-deleted
            }

            let code = self.next_code()?;
            if code == BOUNDARY {
                continue;
            }

            let FrontEdge {
                v0,
                v1,
                v2,
                prev,
                next,
            } = front[edge];
            let ne = front.len();

            let opposite = match code {
                VERTEX => {
                    let opposite = if self.take_split_lookahead() {
                        self.read_split_index()? as i32
                    } else {
                        self.new_vertex([v1 as u32, v0 as u32, v2 as u32])? as i32
                    };

                    front[prev].next = ne;
                    front[next].prev = ne + 1;
                    front.push(FrontEdge {
                        v0,
                        v1: opposite,
                        v2: v1,
                        prev,
                        next: ne + 1,
                    });
                    fifo.push(ne + 1);
                    front.push(FrontEdge {
                        v0: opposite,
                        v1,
                        v2: v0,
                        prev: ne,
                        next,
                    });
                    new_edge = Some(ne);
                    opposite
                }
                LEFT => {
                    let prev_prev = front[prev].prev;
                    front[prev_prev].next = ne;
                    front[next].prev = ne;
                    let opposite = front[prev].v0;
                    front.push(FrontEdge {
                        v0: opposite,
                        v1,
                        v2: v0,
                        prev: prev_prev,
                        next,
                    });
                    front[prev].v0 = -1;
                    new_edge = Some(ne);
                    opposite
                }
                RIGHT => {
                    let next_next = front[next].next;
                    front[next_next].prev = ne;
                    front[prev].next = ne;
                    let opposite = front[next].v1;
                    front.push(FrontEdge {
                        v0,
                        v1: opposite,
                        v2: v1,
                        prev,
                        next: next_next,
                    });
                    front[next].v0 = -1;
                    new_edge = Some(ne);
                    opposite
                }
                DELAY => {
                    delayed.push(edge);
                    new_edge = None;
                    continue;
                }
                END => {
                    let prev_prev = front[prev].prev;
                    let next_next = front[next].next;
                    front[prev_prev].next = next_next;
                    front[next_next].prev = prev_prev;
                    let opposite = front[prev].v0;
                    front[prev].v0 = -1;
                    front[next].v0 = -1;
                    new_edge = None;
                    opposite
                }
                code => return Err(TopologyError::InvalidCode { code }.into()),
            };

            self.check_vertex(v0 as u32)?;
            self.check_vertex(v1 as u32)?;
            self.check_vertex(opposite as u32)?;
            self.faces[out] = v1 as u32;
            self.faces[out + 1] = v0 as u32;
            self.faces[out + 2] = opposite as u32;
            out += 3;
        }
        Ok(())
    }
}
