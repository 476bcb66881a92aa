use std::fmt;

use byteorder::ByteOrder;

use super::{ChunkCodec, split_chunk};
use crate::prelude::*;

// Format tags
pub const FORMAT_PCM: u16 = 1;
pub const FORMAT_IEEE_FLOAT: u16 = 3;
pub const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

const FORMAT_PAYLOAD_SIZE: usize = 14;
const PCM_PAYLOAD_SIZE: usize = FORMAT_PAYLOAD_SIZE + 2;

/// Sample format description, chunk `fmt `. All fields little-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatChunk {
    header: ChunkHeader,
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
}

impl FormatChunk {
    pub fn encode(format_tag: u16, channels: u16, sample_rate: u32, byte_rate: u32, block_align: u16) -> Self {
        FormatChunk {
            header: ChunkHeader::encode(FourCC::FMT, FORMAT_PAYLOAD_SIZE as u32, Endian::Little),
            format_tag,
            channels,
            sample_rate,
            byte_rate,
            block_align,
        }
    }

    pub fn is_pcm(&self) -> bool {
        self.format_tag == FORMAT_PCM
    }

    pub fn is_float(&self) -> bool {
        self.format_tag == FORMAT_IEEE_FLOAT
    }

    /// The real format is in the extension that follows the PCM fields.
    pub fn is_extensible(&self) -> bool {
        self.format_tag == FORMAT_EXTENSIBLE
    }

    fn format_name(&self) -> &'static str {
        match self.format_tag {
            FORMAT_PCM => "PCM",
            FORMAT_IEEE_FLOAT => "IEEE float",
            FORMAT_EXTENSIBLE => "extensible",
            _ => "other",
        }
    }

    fn write_fields(&self, data: &mut [u8]) {
        LittleEndian::write_u16(&mut data[0..2], self.format_tag);
        LittleEndian::write_u16(&mut data[2..4], self.channels);
        LittleEndian::write_u32(&mut data[4..8], self.sample_rate);
        LittleEndian::write_u32(&mut data[8..12], self.byte_rate);
        LittleEndian::write_u16(&mut data[12..14], self.block_align);
    }
}

impl ChunkCodec for FormatChunk {
    const KIND: &'static str = "format";
    const ID: FourCC = FourCC::FMT;
    const MIN_PAYLOAD: usize = FORMAT_PAYLOAD_SIZE;

    fn decode(data: &[u8], endian: Endian) -> Result<Self> {
        let (header, payload) = split_chunk(data, endian, Self::KIND, Self::MIN_PAYLOAD)?;
        let mut cursor = Cursor::new(payload);

        Ok(FormatChunk {
            header,
            format_tag: cursor.read_u16::<LittleEndian>()?,
            channels: cursor.read_u16::<LittleEndian>()?,
            sample_rate: cursor.read_u32::<LittleEndian>()?,
            byte_rate: cursor.read_u32::<LittleEndian>()?,
            block_align: cursor.read_u16::<LittleEndian>()?,
        })
    }

    fn header(&self) -> &ChunkHeader {
        &self.header
    }

    fn payload(&self) -> Vec<u8> {
        let mut data = vec![0u8; FORMAT_PAYLOAD_SIZE];
        self.write_fields(&mut data);
        data
    }
}

impl fmt::Display for FormatChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Format: {} ({})", self.format_tag, self.format_name())?;
        writeln!(f, "Channels: {}", self.channels)?;
        writeln!(f, "Sample rate: {}", self.sample_rate)?;
        writeln!(f, "Byte rate: {}", self.byte_rate)?;
        write!(f, "Block align: {}", self.block_align)
    }
}

/// A format chunk carrying the PCM bits-per-sample field after the base fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmFormatChunk {
    pub format: FormatChunk,
    pub bits_per_sample: u16,
}

impl PcmFormatChunk {
    pub fn encode(
        format_tag: u16,
        channels: u16,
        sample_rate: u32,
        byte_rate: u32,
        block_align: u16,
        bits_per_sample: u16,
    ) -> Self {
        let mut format = FormatChunk::encode(format_tag, channels, sample_rate, byte_rate, block_align);
        format.header = ChunkHeader::encode(FourCC::FMT, PCM_PAYLOAD_SIZE as u32, Endian::Little);

        PcmFormatChunk {
            format,
            bits_per_sample,
        }
    }

    /// Derives byte rate and block align for interleaved integer PCM.
    /// Fails when either does not fit its field.
    pub fn pcm(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Result<Self> {
        let frame = u64::from(channels) * u64::from(bits_per_sample.div_ceil(8));
        let block_align = u16::try_from(frame).map_err(|_| ChunkError::FieldOverflow {
            field: "block align",
            value: frame,
        })?;

        let rate = u64::from(sample_rate) * frame;
        let byte_rate = u32::try_from(rate).map_err(|_| ChunkError::FieldOverflow {
            field: "byte rate",
            value: rate,
        })?;

        Ok(Self::encode(FORMAT_PCM, channels, sample_rate, byte_rate, block_align, bits_per_sample))
    }
}

impl ChunkCodec for PcmFormatChunk {
    const KIND: &'static str = "PCM format";
    const ID: FourCC = FourCC::FMT;
    const MIN_PAYLOAD: usize = PCM_PAYLOAD_SIZE;

    fn decode(data: &[u8], endian: Endian) -> Result<Self> {
        let format = FormatChunk::decode(data, endian)?;
        let (_, payload) = split_chunk(data, endian, Self::KIND, Self::MIN_PAYLOAD)?;
        let bits_per_sample = LittleEndian::read_u16(&payload[FORMAT_PAYLOAD_SIZE..PCM_PAYLOAD_SIZE]);

        Ok(PcmFormatChunk {
            format,
            bits_per_sample,
        })
    }

    fn header(&self) -> &ChunkHeader {
        &self.format.header
    }

    fn payload(&self) -> Vec<u8> {
        let mut data = vec![0u8; PCM_PAYLOAD_SIZE];
        self.format.write_fields(&mut data);
        LittleEndian::write_u16(&mut data[FORMAT_PAYLOAD_SIZE..], self.bits_per_sample);
        data
    }
}

impl fmt::Display for PcmFormatChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.format)?;
        write!(f, "Bits per sample: {}", self.bits_per_sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_layout() {
        let chunk = FormatChunk::encode(FORMAT_PCM, 2, 44100, 176400, 4);
        let bytes = chunk.to_bytes().unwrap();

        assert_eq!(bytes.len(), 8 + 14);
        assert_eq!(&bytes[..8], b"fmt \x0e\0\0\0");
        assert_eq!(&bytes[8..10], &[1, 0]);
        assert_eq!(&bytes[10..12], &[2, 0]);
        assert_eq!(&bytes[12..16], &44100u32.to_le_bytes());
        assert_eq!(&bytes[16..20], &176400u32.to_le_bytes());
        assert_eq!(&bytes[20..22], &[4, 0]);
    }

    #[test]
    fn format_round_trip() {
        let chunk = FormatChunk::encode(FORMAT_IEEE_FLOAT, 6, 96000, 2304000, 24);
        let decoded = FormatChunk::decode(&chunk.to_bytes().unwrap(), Endian::Little).unwrap();
        assert_eq!(decoded, chunk);
        assert!(!decoded.is_pcm());
        assert!(decoded.is_float());
        assert!(decoded.to_string().starts_with("Format: 3 (IEEE float)"));
    }

    #[test]
    fn pcm_round_trip() {
        let chunk = PcmFormatChunk::pcm(2, 48000, 24).unwrap();
        assert_eq!(chunk.format.block_align, 6);
        assert_eq!(chunk.format.byte_rate, 288000);

        let bytes = chunk.to_bytes().unwrap();
        assert_eq!(bytes.len(), 8 + 16);
        let decoded = PcmFormatChunk::decode(&bytes, Endian::Little).unwrap();
        assert_eq!(decoded, chunk);
        assert_eq!(decoded.header().size(), 16);
    }

    #[test]
    fn pcm_needs_bits_per_sample() {
        let base = FormatChunk::encode(FORMAT_PCM, 1, 8000, 8000, 1).to_bytes().unwrap();
        assert!(FormatChunk::decode(&base, Endian::Little).is_ok());

        let err = PcmFormatChunk::decode(&base, Endian::Little).unwrap_err();
        assert!(matches!(
            err,
            ChunkError::TruncatedPayload { required: 16, available: 14, .. }
        ));
    }

    #[test]
    fn short_format_payload_is_rejected() {
        let mut bytes = FormatChunk::encode(FORMAT_PCM, 1, 8000, 8000, 1).to_bytes().unwrap();
        bytes.truncate(8 + 10);
        let err = FormatChunk::decode(&bytes, Endian::Little).unwrap_err();
        assert!(matches!(
            err,
            ChunkError::TruncatedPayload { kind: "format", required: 14, available: 10 }
        ));
    }

    #[test]
    fn decoded_size_is_kept_and_rederived_on_encode() {
        // A real 18-byte fmt chunk with a cbSize extension.
        let mut bytes = b"fmt \x12\0\0\0".to_vec();
        bytes.extend_from_slice(&PcmFormatChunk::pcm(1, 22050, 16).unwrap().payload());
        bytes.extend_from_slice(&[0, 0]);

        let decoded = PcmFormatChunk::decode(&bytes, Endian::Little).unwrap();
        assert_eq!(decoded.header().size(), 18);
        assert_eq!(decoded.bits_per_sample, 16);
        assert_eq!(&decoded.to_bytes().unwrap()[4..8], &16u32.to_le_bytes());
    }

    #[test]
    fn pcm_fields_that_overflow_are_errors() {
        // 8192 channels of 64-bit samples is a 65536 byte frame.
        let err = PcmFormatChunk::pcm(8192, 48000, 64).unwrap_err();
        assert!(matches!(
            err,
            ChunkError::FieldOverflow { field: "block align", value: 65536 }
        ));

        // The frame fits, the byte rate does not.
        let err = PcmFormatChunk::pcm(8, u32::MAX, 32).unwrap_err();
        assert!(matches!(err, ChunkError::FieldOverflow { field: "byte rate", .. }));

        let widest = PcmFormatChunk::pcm(8191, 8000, 64).unwrap();
        assert_eq!(widest.format.block_align, 65528);
        assert_eq!(widest.format.byte_rate, 8000 * 65528);
    }

    #[test]
    fn extensible_tag() {
        let chunk = FormatChunk::encode(FORMAT_EXTENSIBLE, 2, 48000, 192000, 4);
        assert!(chunk.is_extensible());
        assert!(!chunk.is_pcm());
        assert!(chunk.to_string().starts_with("Format: 65534 (extensible)"));
    }
}
