//! Reading and rewriting of EA IFF 85 style chunk containers: RIFF/WAVE,
//! Broadcast Wave and AIFF/AIFF-C.
//!
//! A [`Container`] is scanned once into its chunk headers. Chunk payloads stay
//! in the backing store; fetch a chunk's bytes with [`Container::chunk_bytes`]
//! and decode them with the matching [`chunks::ChunkCodec`].

pub mod chunks;
pub mod container;
pub mod error;
pub mod extended;
pub mod file;
pub mod fourcc;
pub mod header;
pub mod modifier;
pub mod strings;
mod prelude;

pub use chunks::{ChunkCodec, DecodedChunk};
pub use container::{Container, ContainerFamily, SizeCheck};
pub use error::{ChunkError, Result};
pub use fourcc::FourCC;
pub use header::{ChunkHeader, ContainerHeader, Endian};
pub use modifier::ContainerMutator;

/// Chunk id and size field.
pub const HEADER_SIZE: usize = 8;
/// Format tag following a container header's size field.
pub const FORMAT_SIZE: usize = 4;
/// Container id, size field and format tag.
pub const CONTAINER_HEADER_SIZE: usize = HEADER_SIZE + FORMAT_SIZE;
