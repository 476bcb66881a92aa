use std::fmt;
use std::ops::Range;

use byteorder::ByteOrder;

use super::{ChunkCodec, split_chunk};
use crate::prelude::*;
use crate::strings::{fixed_field, trim_nulls};

// Field offsets within the fixed region
const DESCRIPTION: Range<usize> = 0..256;
const ORIGINATOR: Range<usize> = 256..288;
const ORIGINATOR_REFERENCE: Range<usize> = 288..320;
const ORIGINATION_DATE: Range<usize> = 320..330;
const ORIGINATION_TIME: Range<usize> = 330..338;
const TIME_REFERENCE_LOW: Range<usize> = 338..342;
const TIME_REFERENCE_HIGH: Range<usize> = 342..346;
const VERSION: Range<usize> = 346..348;
const UMID: Range<usize> = 348..412;
const LOUDNESS: Range<usize> = 412..422;

const FIXED_SIZE: usize = 602;

/// Loudness metrics added in version 2, each in hundredths of a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loudness {
    pub value: i16,
    pub range: i16,
    pub max_true_peak_level: i16,
    pub max_momentary_loudness: i16,
    pub max_short_term_loudness: i16,
}

impl Loudness {
    fn read(data: &[u8]) -> Self {
        Loudness {
            value: LittleEndian::read_i16(&data[0..2]),
            range: LittleEndian::read_i16(&data[2..4]),
            max_true_peak_level: LittleEndian::read_i16(&data[4..6]),
            max_momentary_loudness: LittleEndian::read_i16(&data[6..8]),
            max_short_term_loudness: LittleEndian::read_i16(&data[8..10]),
        }
    }

    fn write(&self, data: &mut [u8]) {
        LittleEndian::write_i16(&mut data[0..2], self.value);
        LittleEndian::write_i16(&mut data[2..4], self.range);
        LittleEndian::write_i16(&mut data[4..6], self.max_true_peak_level);
        LittleEndian::write_i16(&mut data[6..8], self.max_momentary_loudness);
        LittleEndian::write_i16(&mut data[8..10], self.max_short_term_loudness);
    }
}

/// Broadcast Wave `bext` chunk.
///
/// The fixed region is always 602 bytes. What it carries depends on
/// `version`:
///
/// - 0: text fields and time reference, 254 reserved bytes
/// - 1: adds the UMID, 190 reserved bytes
/// - 2 and later: adds loudness, 180 reserved bytes
///
/// Fields the version does not carry may be set but are written as zero.
/// Decoding reads every field whatever the version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastExtensionChunk {
    header: ChunkHeader,
    description: [u8; 256],
    originator: [u8; 32],
    originator_reference: [u8; 32],
    origination_date: [u8; 10],
    origination_time: [u8; 8],
    time_reference: u64,
    version: u16,
    umid: [u8; 64],
    loudness: Loudness,
    coding_history: Vec<u8>,
}

impl BroadcastExtensionChunk {
    pub fn new(version: u16) -> Self {
        BroadcastExtensionChunk {
            header: ChunkHeader::encode(FourCC::BEXT, FIXED_SIZE as u32, Endian::Little),
            description: [0; 256],
            originator: [0; 32],
            originator_reference: [0; 32],
            origination_date: [0; 10],
            origination_time: [0; 8],
            time_reference: 0,
            version,
            umid: [0; 64],
            loudness: Loudness::default(),
            coding_history: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn encode(
        version: u16,
        description: &str,
        originator: &str,
        originator_reference: &str,
        origination_date: &str,
        origination_time: &str,
        time_reference: u64,
        coding_history: &str,
    ) -> Self {
        let mut chunk = Self::new(version);
        chunk.set_description(description);
        chunk.set_originator(originator);
        chunk.set_originator_reference(originator_reference);
        chunk.set_origination_date(origination_date);
        chunk.set_origination_time(origination_time);
        chunk.time_reference = time_reference;
        chunk.set_coding_history(coding_history);
        chunk
    }

    pub fn description(&self) -> String {
        trim_nulls(&self.description)
    }

    pub fn set_description(&mut self, text: &str) {
        self.description = fixed_field(text);
    }

    pub fn originator(&self) -> String {
        trim_nulls(&self.originator)
    }

    pub fn set_originator(&mut self, text: &str) {
        self.originator = fixed_field(text);
    }

    pub fn originator_reference(&self) -> String {
        trim_nulls(&self.originator_reference)
    }

    pub fn set_originator_reference(&mut self, text: &str) {
        self.originator_reference = fixed_field(text);
    }

    /// `yyyy-mm-dd`
    pub fn origination_date(&self) -> String {
        trim_nulls(&self.origination_date)
    }

    pub fn set_origination_date(&mut self, text: &str) {
        self.origination_date = fixed_field(text);
    }

    /// `hh:mm:ss`
    pub fn origination_time(&self) -> String {
        trim_nulls(&self.origination_time)
    }

    pub fn set_origination_time(&mut self, text: &str) {
        self.origination_time = fixed_field(text);
    }

    /// Samples since midnight of the first sample.
    pub fn time_reference(&self) -> u64 {
        self.time_reference
    }

    pub fn set_time_reference(&mut self, samples: u64) {
        self.time_reference = samples;
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn set_version(&mut self, version: u16) {
        self.version = version;
    }

    pub fn umid(&self) -> &[u8; 64] {
        &self.umid
    }

    pub fn set_umid(&mut self, umid: [u8; 64]) {
        self.umid = umid;
    }

    pub fn loudness(&self) -> Loudness {
        self.loudness
    }

    pub fn set_loudness(&mut self, loudness: Loudness) {
        self.loudness = loudness;
    }

    /// Whether `version` puts the UMID on the wire.
    pub fn has_umid(&self) -> bool {
        self.version >= 1
    }

    /// Whether `version` puts the loudness metrics on the wire.
    pub fn has_loudness(&self) -> bool {
        self.version >= 2
    }

    pub fn coding_history(&self) -> String {
        trim_nulls(&self.coding_history)
    }

    pub fn coding_history_bytes(&self) -> &[u8] {
        &self.coding_history
    }

    pub fn set_coding_history(&mut self, text: &str) {
        self.coding_history = text.as_bytes().to_vec();
    }
}

impl ChunkCodec for BroadcastExtensionChunk {
    const KIND: &'static str = "broadcast extension";
    const ID: FourCC = FourCC::BEXT;
    const MIN_PAYLOAD: usize = FIXED_SIZE;

    fn decode(data: &[u8], endian: Endian) -> Result<Self> {
        let (header, payload) = split_chunk(data, endian, Self::KIND, Self::MIN_PAYLOAD)?;

        let mut chunk = BroadcastExtensionChunk::new(LittleEndian::read_u16(&payload[VERSION]));
        chunk.header = header;
        chunk.description.copy_from_slice(&payload[DESCRIPTION]);
        chunk.originator.copy_from_slice(&payload[ORIGINATOR]);
        chunk.originator_reference.copy_from_slice(&payload[ORIGINATOR_REFERENCE]);
        chunk.origination_date.copy_from_slice(&payload[ORIGINATION_DATE]);
        chunk.origination_time.copy_from_slice(&payload[ORIGINATION_TIME]);

        let low = LittleEndian::read_u32(&payload[TIME_REFERENCE_LOW]) as u64;
        let high = LittleEndian::read_u32(&payload[TIME_REFERENCE_HIGH]) as u64;
        chunk.time_reference = (high << 32) | low;

        chunk.umid.copy_from_slice(&payload[UMID]);
        chunk.loudness = Loudness::read(&payload[LOUDNESS]);
        chunk.coding_history = payload[FIXED_SIZE..].to_vec();

        trace!("decoded bext version {}", chunk.version);
        Ok(chunk)
    }

    fn header(&self) -> &ChunkHeader {
        &self.header
    }

    fn payload(&self) -> Vec<u8> {
        let mut data = vec![0u8; FIXED_SIZE + self.coding_history.len()];

        data[DESCRIPTION].copy_from_slice(&self.description);
        data[ORIGINATOR].copy_from_slice(&self.originator);
        data[ORIGINATOR_REFERENCE].copy_from_slice(&self.originator_reference);
        data[ORIGINATION_DATE].copy_from_slice(&self.origination_date);
        data[ORIGINATION_TIME].copy_from_slice(&self.origination_time);
        LittleEndian::write_u32(&mut data[TIME_REFERENCE_LOW], self.time_reference as u32);
        LittleEndian::write_u32(&mut data[TIME_REFERENCE_HIGH], (self.time_reference >> 32) as u32);
        LittleEndian::write_u16(&mut data[VERSION], self.version);

        // The reserved tail after the last carried field stays zero.
        if self.has_umid() {
            data[UMID].copy_from_slice(&self.umid);
        }
        if self.has_loudness() {
            self.loudness.write(&mut data[LOUDNESS]);
        }

        data[FIXED_SIZE..].copy_from_slice(&self.coding_history);
        data
    }
}

impl fmt::Display for BroadcastExtensionChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Description: {}", self.description())?;
        writeln!(f, "Originator: {}", self.originator())?;
        writeln!(f, "Originator reference: {}", self.originator_reference())?;
        writeln!(f, "Origination date: {}", self.origination_date())?;
        writeln!(f, "Origination time: {}", self.origination_time())?;
        writeln!(f, "Time reference: {}", self.time_reference)?;
        write!(f, "Version: {}", self.version)?;
        if self.has_loudness() {
            write!(
                f,
                "\nLoudness: {} LU range {} true peak {} momentary {} short term {}",
                self.loudness.value,
                self.loudness.range,
                self.loudness.max_true_peak_level,
                self.loudness.max_momentary_loudness,
                self.loudness.max_short_term_loudness
            )?;
        }
        if !self.coding_history.is_empty() {
            write!(f, "\nCoding history: {}", self.coding_history())?;
        }
        Ok(())
    }
}
