//! Length-delimited codecs: opaque bytes and UTF-8 strings.

use bytes::{BufMut, Bytes};

use crate::error::{DecodeError, DecodeErrorKind};
use crate::leb128::encode_varint;
use crate::wire::decode_len;

/// Encodes a varint length prefix followed by the raw payload.
///
/// An empty payload is the single byte `0x00`.
#[inline]
pub fn encode_bytes<B: BufMut>(value: &[u8], buf: &mut B) {
    encode_varint(value.len() as u64, buf);
    buf.put_slice(value);
}

/// Decodes a length-delimited payload from `buf` at `offset`.
///
/// Propagates length-prefix failures and fails at the passed offset when
/// the payload extends past the buffer; on success consumes exactly the
/// prefix plus `length` bytes.
pub fn decode_bytes(buf: &[u8], offset: usize) -> Result<(Bytes, usize), DecodeError> {
    let (len, after) = decode_len(buf, offset)?;
    if buf.len() - after < len {
        return Err(DecodeError::new(
            DecodeErrorKind::UnexpectedEndOfBuffer,
            offset,
        ));
    }
    let payload = Bytes::copy_from_slice(&buf[after..after + len]);
    Ok((payload, after + len))
}

/// Encodes a string as a length-delimited UTF-8 payload.
#[inline]
pub fn encode_string<B: BufMut>(value: &str, buf: &mut B) {
    encode_bytes(value.as_bytes(), buf);
}

/// Decodes a length-delimited UTF-8 string from `buf` at `offset`.
///
/// Framing failures follow [`decode_bytes`]; payloads that are not valid
/// UTF-8 fail with [`DecodeErrorKind::InvalidUtf8`] at the passed offset.
pub fn decode_string(buf: &[u8], offset: usize) -> Result<(String, usize), DecodeError> {
    let (payload, next) = decode_bytes(buf, offset)?;
    match String::from_utf8(payload.into()) {
        Ok(value) => Ok((value, next)),
        Err(_) => Err(DecodeError::new(DecodeErrorKind::InvalidUtf8, offset)),
    }
}
