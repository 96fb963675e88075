#![doc = r#"
Variable-length quantities.

Delta-times and meta event lengths in a MIDI file are written as big-endian
groups of 7 bits. Every byte but the last has its high bit set.

```text
        0  -> 00
      127  -> 7F
      128  -> 81 00
    16383  -> FF 7F
    16384  -> 81 80 00
0x0FFFFFFF -> FF FF FF 7F
```
"#]

use thiserror::Error;

/// The largest value a Standard MIDI File allows in a variable-length quantity.
pub const MAX_VLQ: u32 = 0x0FFF_FFFF;

/// Errors encoding or decoding a variable-length quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VlqError {
    /// Negative values have no representation. These usually signal out of order events upstream.
    #[error("Cannot encode negative value {0}")]
    Negative(i64),
    /// The value needs more than four bytes.
    #[error("Value {0} exceeds the maximum of 0x0FFFFFFF")]
    TooLarge(u64),
    /// The input ended while the continuation bit was still set.
    #[error("Variable-length quantity is not terminated")]
    Unterminated,
    /// More than four bytes were read before the terminating byte.
    #[error("Variable-length quantity is longer than four bytes")]
    Overlong,
}

/// Encodes `value`, appending the bytes to `buf`.
pub fn write_vlq(buf: &mut Vec<u8>, value: u32) -> Result<(), VlqError> {
    if value > MAX_VLQ {
        return Err(VlqError::TooLarge(value as u64));
    }
    let mut groups = [0u8; 4];
    let mut len = 0;
    let mut rest = value;
    loop {
        groups[len] = (rest & 0x7F) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        let continuation = if i == 0 { 0x00 } else { 0x80 };
        buf.push(groups[i] | continuation);
    }
    Ok(())
}

/// Encodes a signed value, rejecting anything negative or beyond [`MAX_VLQ`].
pub fn encode_vlq(value: i64) -> Result<Vec<u8>, VlqError> {
    if value < 0 {
        return Err(VlqError::Negative(value));
    }
    let value = u32::try_from(value).map_err(|_| VlqError::TooLarge(value as u64))?;
    let mut buf = Vec::with_capacity(4);
    write_vlq(&mut buf, value)?;
    Ok(buf)
}

/// Decodes a quantity from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_vlq(bytes: &[u8]) -> Result<(u32, usize), VlqError> {
    let mut value: u32 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        if i == 4 {
            return Err(VlqError::Overlong);
        }
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if bytes.len() >= 4 {
        Err(VlqError::Overlong)
    } else {
        Err(VlqError::Unterminated)
    }
}

#[test]
fn encode_boundaries() {
    use pretty_assertions::assert_eq;
    assert_eq!(encode_vlq(0).unwrap(), vec![0x00]);
    assert_eq!(encode_vlq(0x40).unwrap(), vec![0x40]);
    assert_eq!(encode_vlq(127).unwrap(), vec![0x7F]);
    assert_eq!(encode_vlq(128).unwrap(), vec![0x81, 0x00]);
    assert_eq!(encode_vlq(0x2000).unwrap(), vec![0xC0, 0x00]);
    assert_eq!(encode_vlq(16383).unwrap(), vec![0xFF, 0x7F]);
    assert_eq!(encode_vlq(16384).unwrap(), vec![0x81, 0x80, 0x00]);
    assert_eq!(encode_vlq(2_097_151).unwrap(), vec![0xFF, 0xFF, 0x7F]);
    assert_eq!(encode_vlq(2_097_152).unwrap(), vec![0x81, 0x80, 0x80, 0x00]);
    assert_eq!(
        encode_vlq(MAX_VLQ as i64).unwrap(),
        vec![0xFF, 0xFF, 0xFF, 0x7F]
    );
}

#[test]
fn round_trip_values() {
    for v in [
        0u32, 1, 127, 128, 480, 1920, 16383, 16384, 2_097_151, 2_097_152, 100_000_000, MAX_VLQ,
    ] {
        let bytes = encode_vlq(v as i64).unwrap();
        assert_eq!(decode_vlq(&bytes).unwrap(), (v, bytes.len()));
    }
}

#[test]
fn rejects_out_of_range() {
    assert_eq!(encode_vlq(-1), Err(VlqError::Negative(-1)));
    assert_eq!(
        encode_vlq(MAX_VLQ as i64 + 1),
        Err(VlqError::TooLarge(MAX_VLQ as u64 + 1))
    );
    let mut buf = Vec::new();
    assert!(write_vlq(&mut buf, u32::MAX).is_err());
    assert!(buf.is_empty());
}

#[test]
fn decode_stops_at_terminator() {
    // trailing bytes belong to the next event
    assert_eq!(decode_vlq(&[0x81, 0x00, 0x90, 0x3C]).unwrap(), (128, 2));
    assert_eq!(decode_vlq(&[0x81, 0x80]), Err(VlqError::Unterminated));
    assert_eq!(decode_vlq(&[]), Err(VlqError::Unterminated));
    assert_eq!(
        decode_vlq(&[0x80, 0x80, 0x80, 0x80, 0x00]),
        Err(VlqError::Overlong)
    );
}
