//! Decoder for compact compressed triangle meshes and point clouds.
//!
//! A stream carries a small header, optional face groups, entropy-coded
//! connectivity and one entropy-coded section per vertex attribute.
//! Decoding reconstructs the triangle index through a front-edge traversal
//! and rebuilds attribute values from quantized deltas.
//!
//! # Design Principles
//!
//! - **Untrusted input**: every declared size is checked against limits
//!   before allocation, and every vertex reference is validated.
//! - **Deterministic output**: the same bytes decode to the same geometry
//!   on every platform.
//! - **No hidden state**: a decode call owns all of its working memory;
//!   nothing persists between calls.
//!
//! # Example
//!
//! ```no_run
//! # fn read_stream() -> Vec<u8> { Vec::new() }
//! let data = read_stream();
//! let geometry = codec::decode(&data)?;
//! if let Some(index) = &geometry.index {
//!     println!("{} faces", index.len() / 3);
//! }
//! # Ok::<(), codec::DecodeError>(())
//! ```

pub mod attributes;
pub mod connectivity;
pub mod decoder;
pub mod error;
pub mod geometry;
pub mod limits;
pub mod normals;
pub mod residuals;
pub mod tunstall;

pub use attributes::{AttributeDecoder, NormalPrediction};
pub use connectivity::{decode_connectivity, Connectivity};
pub use decoder::{decode, Decoder};
pub use error::{DecodeError, DecodeResult, TopologyError};
pub use geometry::{AttributeBuffer, Geometry};
pub use limits::DecodeLimits;
pub use tunstall::Tunstall;
