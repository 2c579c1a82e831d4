//! ECMA-335 compressed integers (II.23.2), used for blob length prefixes and inside signatures.

use crate::{Error, Result};

/// Largest value representable as a compressed unsigned integer.
pub const MAX_COMPRESSED_UINT: u32 = 0x1FFF_FFFF;

/// Appends `value` as a compressed unsigned integer.
///
/// - Values `< 0x80`: 1 byte
/// - Values `< 0x4000`: 2 bytes (with high bit set)
/// - Values `<= 0x1FFF_FFFF`: 4 bytes (with high 2 bits set)
///
/// # Errors
///
/// Returns [`Error::SignatureEncoding`] if `value` exceeds [`MAX_COMPRESSED_UINT`].
pub fn write_compressed_uint(value: u32, buffer: &mut Vec<u8>) -> Result<()> {
    if value < 0x80 {
        buffer.push(value as u8);
    } else if value < 0x4000 {
        buffer.push(0x80 | (value >> 8) as u8);
        buffer.push(value as u8);
    } else if value <= MAX_COMPRESSED_UINT {
        buffer.push(0xC0 | (value >> 24) as u8);
        buffer.push((value >> 16) as u8);
        buffer.push((value >> 8) as u8);
        buffer.push(value as u8);
    } else {
        return Err(Error::SignatureEncoding(format!(
            "Value 0x{value:08X} is too large for a compressed unsigned integer"
        )));
    }

    Ok(())
}

/// Appends `value` as a compressed signed integer.
///
/// The value is rotated left by one bit inside the width the encoding selects, so the sign
/// ends up in the least significant bit.
///
/// # Errors
///
/// Returns [`Error::SignatureEncoding`] if `value` is outside `-2^28 ..= 2^28 - 1`.
pub fn write_compressed_int(value: i32, buffer: &mut Vec<u8>) -> Result<()> {
    let sign = u32::from(value < 0);
    let bits = value as u32;

    // The width is chosen from the signed range, not from the rotated value
    if (-0x40..=0x3F).contains(&value) {
        buffer.push((((bits << 1) & 0x7E) | sign) as u8);
    } else if (-0x2000..=0x1FFF).contains(&value) {
        let encoded = ((bits << 1) & 0x3FFE) | sign;
        buffer.push(0x80 | (encoded >> 8) as u8);
        buffer.push(encoded as u8);
    } else if (-0x1000_0000..=0x0FFF_FFFF).contains(&value) {
        let encoded = ((bits << 1) & 0x1FFF_FFFE) | sign;
        buffer.push(0xC0 | (encoded >> 24) as u8);
        buffer.push((encoded >> 16) as u8);
        buffer.push((encoded >> 8) as u8);
        buffer.push(encoded as u8);
    } else {
        return Err(Error::SignatureEncoding(format!(
            "Value {value} is out of range for a compressed signed integer"
        )));
    }

    Ok(())
}

/// Reads a compressed unsigned integer from the start of `data`.
///
/// Returns the value and the number of bytes consumed, or `None` if `data` is truncated or
/// does not start with a valid encoding.
#[must_use]
pub fn read_compressed_uint(data: &[u8]) -> Option<(u32, usize)> {
    let first = u32::from(*data.first()?);

    if first & 0x80 == 0 {
        return Some((first, 1));
    }

    if first & 0xC0 == 0x80 {
        let second = u32::from(*data.get(1)?);
        return Some((((first & 0x3F) << 8) | second, 2));
    }

    if first & 0xE0 == 0xC0 {
        let rest = data.get(1..4)?;
        let value = ((first & 0x1F) << 24)
            | (u32::from(rest[0]) << 16)
            | (u32::from(rest[1]) << 8)
            | u32::from(rest[2]);
        return Some((value, 4));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uint(value: u32) -> Vec<u8> {
        let mut buffer = Vec::new();
        write_compressed_uint(value, &mut buffer).unwrap();
        buffer
    }

    fn int(value: i32) -> Vec<u8> {
        let mut buffer = Vec::new();
        write_compressed_int(value, &mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_compressed_uint_ecma_samples() {
        // II.23.2 examples
        assert_eq!(uint(0x03), vec![0x03]);
        assert_eq!(uint(0x7F), vec![0x7F]);
        assert_eq!(uint(0x80), vec![0x80, 0x80]);
        assert_eq!(uint(0x2E57), vec![0xAE, 0x57]);
        assert_eq!(uint(0x3FFF), vec![0xBF, 0xFF]);
        assert_eq!(uint(0x4000), vec![0xC0, 0x00, 0x40, 0x00]);
        assert_eq!(uint(0x1FFF_FFFF), vec![0xDF, 0xFF, 0xFF, 0xFF]);

        let mut buffer = Vec::new();
        assert!(write_compressed_uint(0x2000_0000, &mut buffer).is_err());
    }

    #[test]
    fn test_compressed_int_ecma_samples() {
        // II.23.2 examples
        assert_eq!(int(3), vec![0x06]);
        assert_eq!(int(-3), vec![0x7B]);
        assert_eq!(int(64), vec![0x80, 0x80]);
        assert_eq!(int(-64), vec![0x01]);
        assert_eq!(int(8192), vec![0xC0, 0x00, 0x40, 0x00]);
        assert_eq!(int(-8192), vec![0x80, 0x01]);
        assert_eq!(int(268_435_455), vec![0xDF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(int(-268_435_456), vec![0xC0, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_read_compressed_uint() {
        assert_eq!(read_compressed_uint(&[0x03]), Some((3, 1)));
        assert_eq!(read_compressed_uint(&[0xAE, 0x57]), Some((0x2E57, 2)));
        assert_eq!(
            read_compressed_uint(&[0xC0, 0x00, 0x40, 0x00]),
            Some((0x4000, 4))
        );
        assert_eq!(read_compressed_uint(&[0xC0, 0x00]), None);
        assert_eq!(read_compressed_uint(&[]), None);
    }
}
