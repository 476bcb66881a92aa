//! Error types for chunk decoding, scanning and container mutation.

use thiserror::Error;

use crate::fourcc::FourCC;

/// Result type for chunk operations.
pub type Result<T> = std::result::Result<T, ChunkError>;

/// Errors raised while reading or editing a chunk container.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// Fewer than 12 bytes were available for the container header.
    #[error("container header requires {} bytes, got {available}", crate::CONTAINER_HEADER_SIZE)]
    TruncatedContainer {
        /// Number of bytes actually available.
        available: usize,
    },

    /// Fewer than 8 bytes were available for a chunk header.
    #[error("chunk header requires {} bytes, got {available}", crate::HEADER_SIZE)]
    TruncatedHeader {
        /// Number of bytes actually available.
        available: usize,
    },

    /// A chunk payload is shorter than the fixed region of its type.
    #[error("{kind} payload requires at least {required} bytes, got {available}")]
    TruncatedPayload {
        /// Human readable chunk kind.
        kind: &'static str,
        /// Minimum payload size of the kind.
        required: usize,
        /// Payload bytes actually available.
        available: usize,
    },

    /// A serialized payload is longer than the 32-bit size field can state.
    #[error("{kind} payload of {len} bytes does not fit a chunk size field")]
    PayloadTooLarge {
        /// Human readable chunk kind.
        kind: &'static str,
        /// Payload length in bytes.
        len: usize,
    },

    /// A derived field value does not fit the width of its field.
    #[error("{field} of {value} does not fit its field")]
    FieldOverflow {
        /// Name of the field.
        field: &'static str,
        /// The value that was computed.
        value: u64,
    },

    /// No chunk with the given identifier exists in the container.
    #[error("chunk not found: {id}")]
    ChunkNotFound {
        /// Identifier that was looked up.
        id: FourCC,
    },

    /// No chunk starts at the given offset.
    #[error("no chunk starts at offset {start_pos}")]
    ChunkNotFoundAt {
        /// Offset that was looked up.
        start_pos: u64,
    },

    /// More than one chunk carries the identifier, so it does not name a single chunk.
    #[error("chunk id {id} matches {count} chunks, select one by start position")]
    AmbiguousChunkId {
        /// Identifier that was looked up.
        id: FourCC,
        /// Number of matching chunks.
        count: usize,
    },

    /// The container id is neither `RIFF` nor `FORM`.
    #[error("unknown container id: {id}")]
    UnknownContainer {
        /// Identifier found at offset 0.
        id: FourCC,
    },

    /// I/O error from the backing store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML in a metadata chunk.
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
}
