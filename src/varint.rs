//! LEB128 unsigned and ZigZag-LEB128 signed integer encoding.

use bytes::{BufMut, BytesMut};
use snafu::OptionExt;

use crate::error::{Result, TruncatedSnafu, VarintOverflowSnafu};

/// Continuation bit: set means "more bytes follow".
const CONTINUATION: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7f;

/// Values in the 32-bit unsigned range fit in at most 5 LEB128 bytes
/// (`ceil(32 / 7) == 5`). Encoders producing row counts, lengths, and indices
/// all stay within this range.
const MAX_U32_VARINT_BYTES: usize = 5;

/// A wider bound used only to keep the zig-zag reader (64-bit domain) from
/// shifting past the width of a `u64` on malformed input; the spec places no
/// normative cap here beyond the terminator, this is a defensive backstop.
const MAX_WIDE_VARINT_BYTES: usize = 10;

pub fn write_uvarint(buf: &mut BytesMut, mut value: u32) {
    loop {
        let byte = (value & PAYLOAD_MASK as u32) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            break;
        }
        buf.put_u8(byte | CONTINUATION);
    }
}

/// Decode a LEB128-encoded `u32`, returning `(value, bytes_read)`.
pub fn read_uvarint(input: &[u8]) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    for i in 0..MAX_U32_VARINT_BYTES {
        let byte = *input.get(i).context(TruncatedSnafu {
            where_: "varint".to_string(),
        })?;
        value |= ((byte & PAYLOAD_MASK) as u32) << (7 * i);
        if byte & CONTINUATION == 0 {
            return Ok((value, i + 1));
        }
    }
    VarintOverflowSnafu.fail()
}

fn write_uvarint64(buf: &mut BytesMut, mut value: u64) {
    loop {
        let byte = (value & PAYLOAD_MASK as u64) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            break;
        }
        buf.put_u8(byte | CONTINUATION);
    }
}

fn read_uvarint64(input: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for i in 0..MAX_WIDE_VARINT_BYTES {
        let byte = *input.get(i).context(TruncatedSnafu {
            where_: "varint".to_string(),
        })?;
        value |= ((byte & PAYLOAD_MASK) as u64) << (7 * i);
        if byte & CONTINUATION == 0 {
            return Ok((value, i + 1));
        }
    }
    VarintOverflowSnafu.fail()
}

/// Map a signed 64-bit integer to an unsigned one so that small-magnitude
/// values (positive or negative) stay small, per `n ↦ (n<<1) ^ (n>>63)`.
fn zigzag_encode(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

fn zigzag_decode(u: u64) -> i64 {
    ((u >> 1) as i64) ^ -((u & 1) as i64)
}

pub fn write_zigzag_varint(buf: &mut BytesMut, value: i64) {
    write_uvarint64(buf, zigzag_encode(value));
}

/// Decode a ZigZag-LEB128-encoded `i64`, returning `(value, bytes_read)`.
pub fn read_zigzag_varint(input: &[u8]) -> Result<(i64, usize)> {
    let (u, n) = read_uvarint64(input)?;
    Ok((zigzag_decode(u), n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn single_byte_for_small_values() {
        let mut buf = BytesMut::new();
        write_uvarint(&mut buf, 100);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf[0], 100);
    }

    #[test]
    fn truncated_input_errors() {
        let buf = [0x80u8];
        assert!(read_uvarint(&buf).is_err());
    }

    #[test]
    fn overflow_beyond_five_bytes() {
        let buf = [0x80u8, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert!(read_uvarint(&buf).is_err());
    }

    proptest! {
        #[test]
        fn roundtrip_uvarint(value: u32) {
            let mut buf = BytesMut::new();
            write_uvarint(&mut buf, value);
            let (decoded, n) = read_uvarint(&buf).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(n, buf.len());
        }

        #[test]
        fn roundtrip_zigzag_varint(value: i64) {
            let mut buf = BytesMut::new();
            write_zigzag_varint(&mut buf, value);
            let (decoded, n) = read_zigzag_varint(&buf).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(n, buf.len());
        }
    }
}
