//! Varint encoding (LEB128)
//!
//! Format:
//! - Each byte: [continuation_bit:1][data:7]
//! - If continuation_bit=1, more bytes follow
//! - Little-endian group order, 1-10 bytes per u64

use crate::{IndexError, Result};

/// Longest encoding of a u64
pub const MAX_VARINT_LEN: usize = 10;

/// Exact number of bytes `encode_varint(value)` produces
#[inline]
pub fn varint_size(value: u64) -> usize {
    // 7 payload bits per byte, at least one byte for zero
    let bits = 64 - value.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

/// Append the encoding of `value` to `out`, returning the number of bytes written
#[inline]
pub fn encode_varint_into(mut value: u64, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if value != 0 {
            byte |= 0x80;
        }

        out.push(byte);

        if value == 0 {
            break;
        }
    }
    out.len() - start
}

/// Encode a u64 as a standalone byte vector
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(varint_size(value));
    encode_varint_into(value, &mut bytes);
    bytes
}

/// Decode a u64 from the front of `bytes`
///
/// Returns: (decoded_value, bytes_consumed). Never reads past `bytes.len()`;
/// a continuation chain that runs off the end is `TruncatedInput`.
#[inline]
pub fn decode_varint(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;

    for (pos, &byte) in bytes.iter().enumerate() {
        let payload = (byte & 0x7F) as u64;

        // The 10th byte may only carry the single remaining bit
        if shift == 63 && payload > 1 {
            return Err(IndexError::VarintOverflow);
        }
        value |= payload << shift;

        if byte & 0x80 == 0 {
            return Ok((value, pos + 1));
        }

        shift += 7;
        if shift > 63 {
            return Err(IndexError::VarintOverflow);
        }
    }

    Err(IndexError::TruncatedInput)
}
