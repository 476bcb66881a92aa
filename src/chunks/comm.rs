use std::fmt;

use super::{ChunkCodec, split_chunk};
use crate::extended;
use crate::prelude::*;

// Plain AIFF prefix: channels, frames, sample size, 80-bit sample rate.
const COMMON_PREFIX_SIZE: usize = 18;
const MAX_NAME_LEN: usize = 255;

/// AIFF / AIFF-C common chunk `COMM`, describing the samples of `SSND`.
///
/// All numeric fields are big-endian. The compression type and the Pascal
/// string naming it exist only in AIFF-C.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonChunk {
    header: ChunkHeader,
    pub channels: i16,
    pub sample_frames: u32,
    pub sample_size: i16,
    sample_rate: [u8; 10],
    pub compression_type: Option<FourCC>,
    compression_name: Vec<u8>,
}

impl CommonChunk {
    /// AIFF-C common chunk. Names longer than 255 bytes are cut.
    pub fn encode(
        channels: i16,
        sample_frames: u32,
        sample_size: i16,
        sample_rate: u64,
        compression_type: FourCC,
        compression_name: &str,
    ) -> Self {
        let mut chunk = CommonChunk {
            header: ChunkHeader::encode(FourCC::COMM, 0, Endian::Big),
            channels,
            sample_frames,
            sample_size,
            sample_rate: extended::to_bits(sample_rate),
            compression_type: Some(compression_type),
            compression_name: Vec::new(),
        };
        chunk.set_compression_name(compression_name);
        chunk.header = ChunkHeader::encode(FourCC::COMM, chunk.payload_len() as u32, Endian::Big);
        chunk
    }

    /// Plain AIFF common chunk with the 18-byte layout.
    pub fn encode_aiff(channels: i16, sample_frames: u32, sample_size: i16, sample_rate: u64) -> Self {
        CommonChunk {
            header: ChunkHeader::encode(FourCC::COMM, COMMON_PREFIX_SIZE as u32, Endian::Big),
            channels,
            sample_frames,
            sample_size,
            sample_rate: extended::to_bits(sample_rate),
            compression_type: None,
            compression_name: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u64 {
        extended::from_bits(self.sample_rate)
    }

    pub fn set_sample_rate(&mut self, sample_rate: u64) {
        self.sample_rate = extended::to_bits(sample_rate);
    }

    /// The sample rate as stored, in 80-bit extended precision.
    pub fn sample_rate_bits(&self) -> [u8; 10] {
        self.sample_rate
    }

    pub fn compression_name(&self) -> String {
        String::from_utf8_lossy(&self.compression_name).into_owned()
    }

    pub fn compression_name_bytes(&self) -> &[u8] {
        &self.compression_name
    }

    pub fn set_compression_name(&mut self, name: &str) {
        let bytes = name.as_bytes();
        self.compression_name = bytes[..bytes.len().min(MAX_NAME_LEN)].to_vec();
    }

    fn payload_len(&self) -> usize {
        match self.compression_type {
            None => COMMON_PREFIX_SIZE,
            Some(_) => COMMON_PREFIX_SIZE + 4 + pascal_len(self.compression_name.len()),
        }
    }
}

/// Length byte, name and the pad byte keeping `1 + len + pad` even.
fn pascal_len(name_len: usize) -> usize {
    1 + name_len + (name_len + 1) % 2
}

impl ChunkCodec for CommonChunk {
    const KIND: &'static str = "common";
    const ID: FourCC = FourCC::COMM;
    const MIN_PAYLOAD: usize = COMMON_PREFIX_SIZE;

    /// The 18-byte prefix is required. The AIFF-C tail is read as far as the
    /// payload goes: a missing compression type or name is absent, not an error.
    fn decode(data: &[u8], endian: Endian) -> Result<Self> {
        let (header, payload) = split_chunk(data, endian, Self::KIND, Self::MIN_PAYLOAD)?;
        let mut cursor = Cursor::new(payload);

        let channels = cursor.read_i16::<BigEndian>()?;
        let sample_frames = cursor.read_u32::<BigEndian>()?;
        let sample_size = cursor.read_i16::<BigEndian>()?;
        let mut sample_rate = [0u8; 10];
        cursor.read_exact(&mut sample_rate)?;

        let mut compression_type = None;
        let mut compression_name = Vec::new();
        let mut tag = [0u8; 4];
        if cursor.read_exact(&mut tag).is_ok() {
            compression_type = Some(FourCC::new(tag));
            if let Ok(len) = cursor.read_u8() {
                cursor.take(len as u64).read_to_end(&mut compression_name)?;
            }
        }

        Ok(CommonChunk {
            header,
            channels,
            sample_frames,
            sample_size,
            sample_rate,
            compression_type,
            compression_name,
        })
    }

    fn header(&self) -> &ChunkHeader {
        &self.header
    }

    fn payload(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.payload_len());
        data.extend_from_slice(&self.channels.to_be_bytes());
        data.extend_from_slice(&self.sample_frames.to_be_bytes());
        data.extend_from_slice(&self.sample_size.to_be_bytes());
        data.extend_from_slice(&self.sample_rate);

        if let Some(compression_type) = self.compression_type {
            data.extend_from_slice(compression_type.as_bytes());
            data.push(self.compression_name.len() as u8);
            data.extend_from_slice(&self.compression_name);
            if self.compression_name.len() % 2 == 0 {
                data.push(0);
            }
        }
        data
    }
}

impl fmt::Display for CommonChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Channels: {}", self.channels)?;
        writeln!(f, "Sample frames: {}", self.sample_frames)?;
        writeln!(f, "Sample size: {}", self.sample_size)?;
        write!(f, "Sample rate: {}", self.sample_rate())?;
        if let Some(compression_type) = self.compression_type {
            write!(f, "\nCompression type: {}", compression_type)?;
            write!(f, "\nCompression name: {}", self.compression_name())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_of(len: usize) -> String {
        "abcdefghijklmnopqrstuvwxyz".chars().cycle().take(len).collect()
    }

    #[test]
    fn aifc_round_trip_with_various_name_lengths() {
        for len in [0usize, 1, 14, 255] {
            let name = name_of(len);
            let chunk = CommonChunk::encode(2, 1_000_000, 24, 48000, FourCC::from_text("sowt"), &name);
            let bytes = chunk.to_bytes().unwrap();
            assert_eq!(bytes.len() % 2, 0, "name length {len}");

            let decoded = CommonChunk::decode(&bytes, Endian::Big).unwrap();
            assert_eq!(decoded.channels, 2);
            assert_eq!(decoded.sample_frames, 1_000_000);
            assert_eq!(decoded.sample_size, 24);
            assert_eq!(decoded.sample_rate(), 48000);
            assert_eq!(decoded.compression_type, Some(FourCC::from_text("sowt")));
            assert_eq!(decoded.compression_name(), name);
            assert_eq!(decoded.header().size() as usize, bytes.len() - 8);
        }
    }

    #[test]
    fn long_names_are_cut_to_255_bytes() {
        let chunk = CommonChunk::encode(1, 0, 16, 44100, FourCC::NONE, &name_of(257));
        assert_eq!(chunk.compression_name_bytes().len(), 255);

        let decoded = CommonChunk::decode(&chunk.to_bytes().unwrap(), Endian::Big).unwrap();
        assert_eq!(decoded.compression_name_bytes().len(), 255);
        assert_eq!(decoded.compression_name(), name_of(255));
    }

    #[test]
    fn pascal_string_padding() {
        // Even name length: length byte + name is odd, one pad byte follows.
        let even = CommonChunk::encode(1, 0, 16, 44100, FourCC::NONE, "not compressed").payload();
        assert_eq!(even.len(), 18 + 4 + 1 + 14 + 1);
        assert_eq!(even[22], 14);
        assert_eq!(*even.last().unwrap(), 0);

        let odd = CommonChunk::encode(1, 0, 16, 44100, FourCC::NONE, "abc").payload();
        assert_eq!(odd.len(), 18 + 4 + 1 + 3);
    }

    #[test]
    fn big_endian_layout() {
        let bytes = CommonChunk::encode_aiff(2, 0x0102_0304, 16, 44100).to_bytes().unwrap();
        assert_eq!(&bytes[..8], b"COMM\0\0\0\x12");
        assert_eq!(&bytes[8..10], &[0, 2]);
        assert_eq!(&bytes[10..14], &[1, 2, 3, 4]);
        assert_eq!(&bytes[14..16], &[0, 16]);
        assert_eq!(&bytes[16..26], &[0x40, 0x0E, 0xAC, 0x44, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn plain_aiff_has_no_compression() {
        let chunk = CommonChunk::encode_aiff(1, 10, 8, 22050);
        let decoded = CommonChunk::decode(&chunk.to_bytes().unwrap(), Endian::Big).unwrap();
        assert_eq!(decoded, chunk);
        assert_eq!(decoded.compression_type, None);
    }

    #[test]
    fn short_prefix_is_rejected() {
        let mut bytes = b"COMM\0\0\0\x11".to_vec();
        bytes.extend_from_slice(&[0u8; 17]);
        let err = CommonChunk::decode(&bytes, Endian::Big).unwrap_err();
        assert!(matches!(
            err,
            ChunkError::TruncatedPayload { kind: "common", required: 18, available: 17 }
        ));
    }

    // Older writers produce shorter tails: these must keep decoding.
    #[test]
    fn short_name_is_absent_not_corrupt() {
        let full = CommonChunk::encode(1, 0, 16, 44100, FourCC::NONE, "not compressed").payload();

        let cut = &full[..18 + 4 + 1 + 5];
        let mut bytes = ChunkHeader::encode(FourCC::COMM, cut.len() as u32, Endian::Big)
            .to_bytes()
            .to_vec();
        bytes.extend_from_slice(cut);
        let decoded = CommonChunk::decode(&bytes, Endian::Big).unwrap();
        assert_eq!(decoded.compression_name(), "not c");

        let no_name = &full[..18 + 4];
        let mut bytes = ChunkHeader::encode(FourCC::COMM, no_name.len() as u32, Endian::Big)
            .to_bytes()
            .to_vec();
        bytes.extend_from_slice(no_name);
        let decoded = CommonChunk::decode(&bytes, Endian::Big).unwrap();
        assert_eq!(decoded.compression_type, Some(FourCC::NONE));
        assert_eq!(decoded.compression_name(), "");
    }
}
