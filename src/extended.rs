//! 80-bit IEEE 754 extended precision conversion for the AIFF sample rate.
//!
//! Layout, big-endian: 1 sign bit, 15 bit biased exponent, 64 bit mantissa
//! with an explicit integer bit. Only non-negative integral magnitudes are
//! supported.

const EXPONENT_BIAS: i32 = 16383;
const EXPONENT_MASK: u16 = 0x7FFF;

/// Encodes `value` into the 10-byte extended precision layout.
pub fn to_bits(value: u64) -> [u8; 10] {
    let mut bytes = [0u8; 10];
    if value == 0 {
        return bytes;
    }

    // Shift the highest set bit into the explicit integer bit position.
    let bit_length = 64 - value.leading_zeros();
    let mantissa = value << value.leading_zeros();
    let exponent = (bit_length as i32 - 1 + EXPONENT_BIAS) as u16;

    bytes[..2].copy_from_slice(&exponent.to_be_bytes());
    bytes[2..].copy_from_slice(&mantissa.to_be_bytes());
    bytes
}

/// Decodes the 10-byte layout into an unsigned integer, truncating any fraction.
///
/// Negative values, infinities and NaN decode to 0. Magnitudes beyond
/// `u64::MAX` saturate.
pub fn from_bits(bytes: [u8; 10]) -> u64 {
    let sign_exponent = u16::from_be_bytes([bytes[0], bytes[1]]);
    if sign_exponent == 0 || sign_exponent & !EXPONENT_MASK != 0 {
        return 0;
    }

    let biased = sign_exponent & EXPONENT_MASK;
    if biased == EXPONENT_MASK {
        return 0;
    }

    let mut mantissa = [0u8; 8];
    mantissa.copy_from_slice(&bytes[2..]);
    // The integer bit is taken as 1, the value is (1 + frac) * 2^exp.
    let significand = u64::from_be_bytes(mantissa) | 1 << 63;

    let exponent = biased as i32 - EXPONENT_BIAS;
    match exponent {
        e if e < 0 => 0,
        e if e > 63 => u64::MAX,
        e => significand >> (63 - e),
    }
}
