//! Fixed-width scalar codecs: fixed 32/64 and the IEEE-754 bit-casts over
//! them.

use bytes::BufMut;

use crate::error::{DecodeError, DecodeErrorKind};

/// Encodes `value` as exactly 4 little-endian bytes.
#[inline]
pub fn encode_fixed32<B: BufMut>(value: u32, buf: &mut B) {
    buf.put_u32_le(value);
}

/// Decodes 4 little-endian bytes from `buf` at `offset`.
///
/// Fails at the passed offset if fewer than 4 bytes remain.
#[inline]
pub fn decode_fixed32(buf: &[u8], offset: usize) -> Result<(u32, usize), DecodeError> {
    match buf.get(offset..offset + 4) {
        Some(raw) => {
            let value = u32::from_le_bytes(raw.try_into().expect("slice is 4 bytes"));
            Ok((value, offset + 4))
        }
        None => Err(DecodeError::new(
            DecodeErrorKind::UnexpectedEndOfBuffer,
            offset,
        )),
    }
}

/// Encodes `value` as exactly 8 little-endian bytes.
#[inline]
pub fn encode_fixed64<B: BufMut>(value: u64, buf: &mut B) {
    buf.put_u64_le(value);
}

/// Decodes 8 little-endian bytes from `buf` at `offset`.
///
/// Fails at the passed offset if fewer than 8 bytes remain.
#[inline]
pub fn decode_fixed64(buf: &[u8], offset: usize) -> Result<(u64, usize), DecodeError> {
    match buf.get(offset..offset + 8) {
        Some(raw) => {
            let value = u64::from_le_bytes(raw.try_into().expect("slice is 8 bytes"));
            Ok((value, offset + 8))
        }
        None => Err(DecodeError::new(
            DecodeErrorKind::UnexpectedEndOfBuffer,
            offset,
        )),
    }
}

/// Encodes `value`'s bit pattern over the fixed32 codec.
///
/// NaN payloads pass through untouched.
#[inline]
pub fn encode_float<B: BufMut>(value: f32, buf: &mut B) {
    encode_fixed32(value.to_bits(), buf);
}

/// Decodes a 32-bit IEEE-754 value over the fixed32 codec.
#[inline]
pub fn decode_float(buf: &[u8], offset: usize) -> Result<(f32, usize), DecodeError> {
    let (bits, next) = decode_fixed32(buf, offset)?;
    Ok((f32::from_bits(bits), next))
}

/// Encodes `value`'s bit pattern over the fixed64 codec.
///
/// NaN payloads pass through untouched.
#[inline]
pub fn encode_double<B: BufMut>(value: f64, buf: &mut B) {
    encode_fixed64(value.to_bits(), buf);
}

/// Decodes a 64-bit IEEE-754 value over the fixed64 codec.
#[inline]
pub fn decode_double(buf: &[u8], offset: usize) -> Result<(f64, usize), DecodeError> {
    let (bits, next) = decode_fixed64(buf, offset)?;
    Ok((f64::from_bits(bits), next))
}
