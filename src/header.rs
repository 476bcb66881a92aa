use std::fmt;

use crate::prelude::*;

/// Byte order of the size fields in a container.
///
/// RIFF/WAVE and BWF use little-endian sizes, AIFF/AIFF-C big-endian.
/// Chunk identifiers are never affected by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub fn read_u32<Rd: Read>(self, reader: &mut Rd) -> std::io::Result<u32> {
        match self {
            Endian::Little => reader.read_u32::<LittleEndian>(),
            Endian::Big => reader.read_u32::<BigEndian>(),
        }
    }

    pub fn write_u32<W: Write>(self, writer: &mut W, value: u32) -> std::io::Result<()> {
        match self {
            Endian::Little => writer.write_u32::<LittleEndian>(value),
            Endian::Big => writer.write_u32::<BigEndian>(value),
        }
    }

    pub fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            Endian::Little => value.to_le_bytes(),
            Endian::Big => value.to_be_bytes(),
        }
    }

    pub fn u32_from(self, bytes: [u8; 4]) -> u32 {
        match self {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        }
    }
}

/// Chunk header: identifier, payload size, start offset and size byte order.
///
/// `size` excludes the 8 header bytes and the optional pad byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    id: FourCC,
    size: u32,
    start_pos: u64,
    endian: Endian,
}

impl ChunkHeader {
    /// Builds a header for serialization. The start position is zero.
    pub fn encode(id: FourCC, size: u32, endian: Endian) -> Self {
        ChunkHeader {
            id,
            size,
            start_pos: 0,
            endian,
        }
    }

    /// Decodes the first 8 bytes of `bytes`.
    pub fn decode(bytes: &[u8], start_pos: u64, endian: Endian) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ChunkError::TruncatedHeader {
                available: bytes.len(),
            });
        }
        let id = FourCC::new([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let size = endian.u32_from([bytes[4], bytes[5], bytes[6], bytes[7]]);

        Ok(ChunkHeader {
            id,
            size,
            start_pos,
            endian,
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[..4].copy_from_slice(self.id.as_bytes());
        bytes[4..].copy_from_slice(&self.endian.u32_bytes(self.size));
        bytes
    }

    pub fn id(&self) -> FourCC {
        self.id
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn start_pos(&self) -> u64 {
        self.start_pos
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Header, payload and pad byte: `size + 8`, rounded up to even.
    pub fn full_size(&self) -> u64 {
        let size = self.size as u64 + HEADER_SIZE as u64;
        size + (size & 1)
    }

    /// True when an odd payload is followed by a pad byte.
    pub fn has_padding(&self) -> bool {
        self.size % 2 != 0
    }

    /// Offset of the first payload byte.
    pub fn payload_pos(&self) -> u64 {
        self.start_pos + HEADER_SIZE as u64
    }

    /// Offset right after this chunk, where the next one starts.
    pub fn end_pos(&self) -> u64 {
        self.start_pos + self.full_size()
    }

    pub(crate) fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    pub(crate) fn set_start_pos(&mut self, start_pos: u64) {
        self.start_pos = start_pos;
    }
}

impl fmt::Display for ChunkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {} Size: {} FullSize: {} StartPos: {} HasPadding: {}",
            self.id,
            self.size,
            self.full_size(),
            self.start_pos,
            self.has_padding()
        )
    }
}

/// The 12-byte header opening a container: a chunk header plus a format tag.
///
/// Its size covers the format tag and every contained chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    header: ChunkHeader,
    format: FourCC,
}

impl ContainerHeader {
    pub fn encode(id: FourCC, size: u32, format: FourCC, endian: Endian) -> Self {
        ContainerHeader {
            header: ChunkHeader::encode(id, size, endian),
            format,
        }
    }

    pub fn decode(bytes: &[u8], endian: Endian) -> Result<Self> {
        if bytes.len() < CONTAINER_HEADER_SIZE {
            return Err(ChunkError::TruncatedContainer {
                available: bytes.len(),
            });
        }
        let header = ChunkHeader::decode(&bytes[..HEADER_SIZE], 0, endian)?;
        let format = FourCC::new([bytes[8], bytes[9], bytes[10], bytes[11]]);

        Ok(ContainerHeader { header, format })
    }

    pub fn to_bytes(&self) -> [u8; CONTAINER_HEADER_SIZE] {
        let mut bytes = [0u8; CONTAINER_HEADER_SIZE];
        bytes[..HEADER_SIZE].copy_from_slice(&self.header.to_bytes());
        bytes[HEADER_SIZE..].copy_from_slice(self.format.as_bytes());
        bytes
    }

    pub fn format(&self) -> FourCC {
        self.format
    }

    pub fn chunk_header(&self) -> &ChunkHeader {
        &self.header
    }

    pub fn id(&self) -> FourCC {
        self.header.id()
    }

    pub fn size(&self) -> u32 {
        self.header.size()
    }

    pub fn endian(&self) -> Endian {
        self.header.endian()
    }

    /// Total byte length of the container on disk.
    pub fn full_size(&self) -> u64 {
        self.header.full_size()
    }

    pub(crate) fn set_size(&mut self, size: u32) {
        self.header.set_size(size);
    }
}

impl fmt::Display for ContainerHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {} Size: {} FullSize: {} StartPos: {} Format: {}",
            self.header.id,
            self.header.size,
            self.full_size(),
            self.header.start_pos,
            self.format
        )
    }
}

/// Appends a zero pad byte when `data` has odd length.
pub fn pad(data: &mut Vec<u8>) {
    if data.len() % 2 != 0 {
        data.push(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip_in_both_orders() {
        for endian in [Endian::Little, Endian::Big] {
            for size in [0u32, 1, 12, 0x0102_0304, u32::MAX] {
                let header = ChunkHeader::encode(FourCC::from_text("test"), size, endian);
                let decoded = ChunkHeader::decode(&header.to_bytes(), 0, endian).unwrap();
                assert_eq!(decoded.id(), FourCC::from_text("test"));
                assert_eq!(decoded.size(), size);
            }
        }
    }

    #[test]
    fn id_is_text_order_in_both_families() {
        let little = ChunkHeader::encode(FourCC::FMT, 16, Endian::Little).to_bytes();
        let big = ChunkHeader::encode(FourCC::FMT, 16, Endian::Big).to_bytes();
        assert_eq!(&little[..4], b"fmt ");
        assert_eq!(&big[..4], b"fmt ");
        assert_eq!(&little[4..], &[16, 0, 0, 0]);
        assert_eq!(&big[4..], &[0, 0, 0, 16]);
    }

    #[test]
    fn full_size_rounds_to_even() {
        for size in [1u32, 3, 13, 601] {
            let header = ChunkHeader::encode(FourCC::DATA, size, Endian::Little);
            assert_eq!(header.full_size(), size as u64 + 9);
            assert!(header.has_padding());
        }
        for size in [0u32, 2, 12, 602] {
            let header = ChunkHeader::encode(FourCC::DATA, size, Endian::Little);
            assert_eq!(header.full_size(), size as u64 + 8);
            assert!(!header.has_padding());
        }
        let header = ChunkHeader::encode(FourCC::DATA, u32::MAX, Endian::Little);
        assert_eq!(header.full_size(), u32::MAX as u64 + 9);
    }

    #[test]
    fn short_header_is_rejected() {
        let err = ChunkHeader::decode(&[0u8; 7], 0, Endian::Little).unwrap_err();
        assert!(matches!(err, ChunkError::TruncatedHeader { available: 7 }));
    }

    #[test]
    fn container_header_round_trip() {
        let header = ContainerHeader::encode(FourCC::FORM, 4, FourCC::AIFF, Endian::Big);
        let bytes = header.to_bytes();
        assert_eq!(&bytes, b"FORM\0\0\0\x04AIFF");

        let decoded = ContainerHeader::decode(&bytes, Endian::Big).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.format(), FourCC::AIFF);
        assert_eq!(decoded.full_size(), 12);
    }

    #[test]
    fn short_container_header_is_rejected() {
        let err = ContainerHeader::decode(&[0u8; 11], Endian::Little).unwrap_err();
        assert!(matches!(err, ChunkError::TruncatedContainer { available: 11 }));
    }

    #[test]
    fn pad_only_odd() {
        let mut odd = vec![1, 2, 3];
        pad(&mut odd);
        assert_eq!(odd, vec![1, 2, 3, 0]);
        let mut even = vec![1, 2];
        pad(&mut even);
        assert_eq!(even, vec![1, 2]);
    }
}
