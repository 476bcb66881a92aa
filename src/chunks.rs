use rayon::prelude::*;

use crate::container::Container;
use crate::header::pad;
use crate::prelude::*;

mod bext;
mod comm;
mod fmt;
mod ixml;
pub use bext::{BroadcastExtensionChunk, Loudness};
pub use comm::CommonChunk;
pub use fmt::{FORMAT_EXTENSIBLE, FORMAT_IEEE_FLOAT, FORMAT_PCM, FormatChunk, PcmFormatChunk};
pub use ixml::{IxmlDocument, MetadataXmlChunk};

/// Decoding and encoding of one chunk kind.
///
/// `decode` takes the chunk's full byte range, header included. The header
/// size field is read in the given byte order; payload fields use the fixed
/// order of the chunk kind.
pub trait ChunkCodec: Sized {
    /// Chunk kind named in errors.
    const KIND: &'static str;
    /// Identifier that selects this codec in [`DecodedChunk::decode`].
    const ID: FourCC;
    /// Size of the fixed payload region. Shorter payloads fail to decode.
    const MIN_PAYLOAD: usize;

    fn decode(data: &[u8], endian: Endian) -> Result<Self>;

    /// The header as decoded or encoded. A decoded header keeps the size
    /// it was read with.
    fn header(&self) -> &ChunkHeader;

    fn payload(&self) -> Vec<u8>;

    /// Header, payload and pad byte. The size field is taken from the
    /// serialized payload, not from [`Self::header`].
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = self.payload();
        let header = ChunkHeader::encode(
            self.header().id(),
            payload_size(Self::KIND, payload.len())?,
            self.header().endian(),
        );

        let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len() + 1);
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend(payload);
        pad(&mut bytes);
        Ok(bytes)
    }
}

/// Payload length as a chunk size field value.
pub(crate) fn payload_size(kind: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| ChunkError::PayloadTooLarge { kind, len })
}

/// Splits chunk bytes into the header and the payload it declares.
///
/// The payload ends at the declared size or at the end of `data`, whichever
/// comes first, so a trailing pad byte is never part of it.
pub(crate) fn split_chunk<'d>(
    data: &'d [u8],
    endian: Endian,
    kind: &'static str,
    min_payload: usize,
) -> Result<(ChunkHeader, &'d [u8])> {
    let header = ChunkHeader::decode(data, 0, endian)?;
    let end = HEADER_SIZE
        .saturating_add(header.size() as usize)
        .min(data.len());
    let payload = &data[HEADER_SIZE..end];

    if payload.len() < min_payload {
        return Err(ChunkError::TruncatedPayload {
            kind,
            required: min_payload,
            available: payload.len(),
        });
    }

    Ok((header, payload))
}

/// A chunk decoded into the type matching its identifier.
#[derive(Debug, Clone)]
pub enum DecodedChunk {
    Format(FormatChunk),
    PcmFormat(PcmFormatChunk),
    Common(CommonChunk),
    BroadcastExtension(BroadcastExtensionChunk),
    MetadataXml(MetadataXmlChunk),
    Unknown { header: ChunkHeader, data: Vec<u8> },
}

impl DecodedChunk {
    /// Decodes chunk bytes by their identifier. Unrecognized chunks keep
    /// their payload bytes.
    pub fn decode(data: &[u8], endian: Endian) -> Result<Self> {
        let id = ChunkHeader::decode(data, 0, endian)?.id();

        Ok(if id == FormatChunk::ID {
            let (_, payload) = split_chunk(data, endian, FormatChunk::KIND, 0)?;
            if payload.len() >= PcmFormatChunk::MIN_PAYLOAD {
                DecodedChunk::PcmFormat(PcmFormatChunk::decode(data, endian)?)
            } else {
                DecodedChunk::Format(FormatChunk::decode(data, endian)?)
            }
        } else if id == CommonChunk::ID {
            DecodedChunk::Common(CommonChunk::decode(data, endian)?)
        } else if id == BroadcastExtensionChunk::ID {
            DecodedChunk::BroadcastExtension(BroadcastExtensionChunk::decode(data, endian)?)
        } else if id == MetadataXmlChunk::ID {
            DecodedChunk::MetadataXml(MetadataXmlChunk::decode(data, endian)?)
        } else {
            let (header, payload) = split_chunk(data, endian, "unknown", 0)?;
            DecodedChunk::Unknown {
                header,
                data: payload.to_vec(),
            }
        })
    }

    pub fn header(&self) -> &ChunkHeader {
        match self {
            DecodedChunk::Format(c) => c.header(),
            DecodedChunk::PcmFormat(c) => c.header(),
            DecodedChunk::Common(c) => c.header(),
            DecodedChunk::BroadcastExtension(c) => c.header(),
            DecodedChunk::MetadataXml(c) => c.header(),
            DecodedChunk::Unknown { header, .. } => header,
        }
    }

    pub fn id(&self) -> FourCC {
        self.header().id()
    }
}

impl Container {
    /// Decodes every listed chunk out of an in-memory image of the container.
    ///
    /// Chunk ranges never overlap, so they are decoded in parallel. Results
    /// keep the header order.
    pub fn decode_chunks(&self, image: &[u8]) -> Vec<Result<DecodedChunk>> {
        self.headers
            .par_iter()
            .map(|header| {
                let start = (header.start_pos() as usize).min(image.len());
                let end = (header.end_pos() as usize).min(image.len());
                DecodedChunk::decode(&image[start..end], self.endian)
            })
            .collect()
    }
}
