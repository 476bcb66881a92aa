use std::fmt;
use std::str::FromStr;

use crate::strings::trim_nulls;

/// A four character code identifying a chunk or a container format.
///
/// The bytes are kept in text order, so the numeric value is always the
/// big-endian reading of the four bytes regardless of the container family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FourCC([u8; 4]);

impl FourCC {
    pub const RIFF: FourCC = FourCC(*b"RIFF");
    pub const WAVE: FourCC = FourCC(*b"WAVE");
    pub const FMT: FourCC = FourCC(*b"fmt ");
    pub const DATA: FourCC = FourCC(*b"data");
    pub const BEXT: FourCC = FourCC(*b"bext");
    pub const IXML: FourCC = FourCC(*b"iXML");
    pub const FORM: FourCC = FourCC(*b"FORM");
    pub const AIFF: FourCC = FourCC(*b"AIFF");
    pub const AIFC: FourCC = FourCC(*b"AIFC");
    pub const COMM: FourCC = FourCC(*b"COMM");
    pub const SSND: FourCC = FourCC(*b"SSND");
    pub const NONE: FourCC = FourCC(*b"NONE");

    pub const fn new(bytes: [u8; 4]) -> Self {
        FourCC(bytes)
    }

    /// Builds a code from text. Shorter text is padded with spaces,
    /// longer text is cut after four bytes.
    pub fn from_text(text: &str) -> Self {
        let mut bytes = [b' '; 4];
        for (dst, src) in bytes.iter_mut().zip(text.bytes()) {
            *dst = src;
        }
        FourCC(bytes)
    }

    pub const fn from_u32(value: u32) -> Self {
        FourCC(value.to_be_bytes())
    }

    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for FourCC {
    fn from(bytes: [u8; 4]) -> Self {
        FourCC(bytes)
    }
}

impl From<&[u8; 4]> for FourCC {
    fn from(bytes: &[u8; 4]) -> Self {
        FourCC(*bytes)
    }
}

impl FromStr for FourCC {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FourCC::from_text(s))
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&trim_nulls(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_space_padded() {
        assert_eq!(FourCC::from_text("fmt"), FourCC::FMT);
        assert_eq!(FourCC::from_text("iXML"), FourCC::IXML);
        assert_eq!(FourCC::from_text("bextra"), FourCC::BEXT);
        assert_eq!(FourCC::from_text("").as_bytes(), b"    ");
    }

    #[test]
    fn numeric_value_is_big_endian() {
        assert_eq!(FourCC::RIFF.to_u32(), 0x5249_4646);
        assert_eq!(FourCC::from_u32(0x5249_4646), FourCC::RIFF);
    }

    #[test]
    fn display_drops_nul_bytes() {
        assert_eq!(FourCC::new(*b"ab\0\0").to_string(), "ab");
        assert_eq!(FourCC::FMT.to_string(), "fmt ");
    }
}
