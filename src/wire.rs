//! Wire format plumbing: field keys, wire types, and unknown-field skipping.
//!
//! Follows the encoding rules from
//! <https://protobuf.dev/programming-guides/encoding> under the "Message
//! Structure" section, restricted to wire types 0 (VARINT), 1 (I64),
//! 2 (LEN), and 5 (I32). The deprecated group wire types 3 and 4 are
//! recognized but rejected wherever a field would use them.

use bytes::BufMut;

use crate::error::{DecodeError, DecodeErrorKind};
use crate::leb128::{decode_varint, encode_varint, encoded_varint_len};

/// Minimum value of a field number.
pub const MINIMUM_FIELD_NUMBER: u32 = 1;
/// Maximum value of a field number.
pub const MAXIMUM_FIELD_NUMBER: u32 = (1 << 29) - 1;
/// Field numbers 19000..=19999 are reserved by the protobuf spec.
pub const RESERVED_FIELD_NUMBERS: std::ops::RangeInclusive<u32> = 19000..=19999;

/// Denotes the framing of a field in an encoded message.
///
/// Messages are a series of key-value records; the key carries a field
/// number and a [`WireType`], and the [`WireType`] says how many bytes the
/// value occupies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum WireType {
    /// Variable length integer.
    Varint = 0,
    /// 64-bit little-endian value.
    I64 = 1,
    /// Length-prefixed payload: strings, bytes, nested messages, packed
    /// repeated fields.
    Len = 2,
    /// Group start (deprecated, rejected).
    SGroup = 3,
    /// Group end (deprecated, rejected).
    EGroup = 4,
    /// 32-bit little-endian value.
    I32 = 5,
}

impl WireType {
    /// Maximum raw value a [`WireType`] can hold.
    const MAX_VAL: u8 = WireType::I32 as u8;

    /// Try to decode a [`WireType`] from the provided raw value.
    #[inline]
    const fn try_from_val(value: u8) -> Result<Self, DecodeErrorKind> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::SGroup),
            4 => Ok(WireType::EGroup),
            5 => Ok(WireType::I32),
            _ => Err(DecodeErrorKind::InvalidWireType { value }),
        }
    }

    /// Return the raw value for this [`WireType`].
    #[inline]
    pub const fn into_val(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for WireType {
    type Error = DecodeErrorKind;

    #[inline]
    fn try_from(value: u8) -> Result<Self, DecodeErrorKind> {
        WireType::try_from_val(value)
    }
}

/// Encodes a field key, `(number << 3) | wire_type`, as a varint.
#[inline]
pub fn encode_key<B: BufMut>(number: u32, wire_type: WireType, buf: &mut B) -> usize {
    let key = (u64::from(number) << 3) | u64::from(wire_type.into_val());
    encode_varint(key, buf)
}

/// The number of bytes [`encode_key`] writes for `number`.
///
/// The wire type lives in the low 3 bits and never changes the length.
#[inline]
pub fn encoded_key_len(number: u32) -> usize {
    encoded_varint_len(u64::from(number) << 3)
}

/// Decodes a field key from `buf` at `offset`.
///
/// Returns the field number, the wire type, and the offset just past the
/// key. The field number is returned as `u64`: numbers past the descriptor
/// range cannot match any field and fall out as unknown, they are not a
/// wire error. Field number zero and raw wire types 6/7 are rejected with
/// the error positioned just past the key varint.
pub fn decode_key(buf: &[u8], offset: usize) -> Result<(u64, WireType, usize), DecodeError> {
    let (key, after) = decode_varint(buf, offset)?;

    let number = key >> 3;
    if number == 0 {
        return Err(DecodeError::new(DecodeErrorKind::InvalidFieldNumber, after));
    }

    let wire_type = WireType::try_from_val((key & 0b111) as u8)
        .map_err(|kind| DecodeError::new(kind, after))?;

    Ok((number, wire_type, after))
}

/// Decodes the length prefix of a LEN-framed value, checking that it fits
/// in `usize`.
///
/// Bounds against the buffer are the caller's concern; the relevant offset
/// for that check differs per call site.
#[inline]
pub fn decode_len(buf: &[u8], offset: usize) -> Result<(usize, usize), DecodeError> {
    let (len, after) = decode_varint(buf, offset)?;
    let len = usize::try_from(len)
        .map_err(|_| DecodeError::new(DecodeErrorKind::LengthOverflow { value: len }, offset))?;
    Ok((len, after))
}

/// Skips over a field value based on its wire type, returning the offset
/// just past it.
///
/// Decoders stay forward compatible by skipping fields they do not know
/// about. Group wire types cannot be skipped and fail with
/// [`DecodeErrorKind::DeprecatedGroupEncoding`]; truncated values fail at
/// the offset that was passed in.
pub fn skip_field(buf: &[u8], offset: usize, wire_type: WireType) -> Result<usize, DecodeError> {
    let skip_len = match wire_type {
        WireType::Varint => {
            let (_, next) = decode_varint(buf, offset)?;
            return Ok(next);
        }
        WireType::I64 => 8,
        WireType::I32 => 4,
        WireType::Len => {
            let (len, after) = decode_len(buf, offset)?;
            if buf.len() - after < len {
                return Err(DecodeError::new(
                    DecodeErrorKind::UnexpectedEndOfBuffer,
                    offset,
                ));
            }
            return Ok(after + len);
        }
        WireType::SGroup | WireType::EGroup => {
            return Err(DecodeError::new(
                DecodeErrorKind::DeprecatedGroupEncoding,
                offset,
            ));
        }
    };

    if buf.len() - offset < skip_len {
        return Err(DecodeError::new(
            DecodeErrorKind::UnexpectedEndOfBuffer,
            offset,
        ));
    }
    Ok(offset + skip_len)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn proptest_key_roundtrips() {
        fn arb_number() -> impl Strategy<Value = u32> {
            MINIMUM_FIELD_NUMBER..=MAXIMUM_FIELD_NUMBER
        }

        fn arb_wiretype() -> impl Strategy<Value = WireType> {
            prop_oneof![
                Just(WireType::Varint),
                Just(WireType::I64),
                Just(WireType::Len),
                Just(WireType::I32),
            ]
        }

        fn test(number: u32, wire_type: WireType) {
            let mut buf = Vec::with_capacity(16);
            let written = encode_key(number, wire_type, &mut buf);
            assert_eq!(written, encoded_key_len(number));

            let (rnd_number, rnd_wire_type, next) = decode_key(&buf, 0).unwrap();
            assert_eq!(u64::from(number), rnd_number);
            assert_eq!(wire_type, rnd_wire_type);
            assert_eq!(next, buf.len());
        }

        let strat = (arb_number(), arb_wiretype());
        proptest!(|((number, wire_type) in strat)| test(number, wire_type))
    }

    #[test]
    fn all_raw_wire_type_values() {
        for i in u8::MIN..=u8::MAX {
            let wire_type = WireType::try_from(i);
            match (i, wire_type) {
                (0, Ok(WireType::Varint))
                | (1, Ok(WireType::I64))
                | (2, Ok(WireType::Len))
                | (3, Ok(WireType::SGroup))
                | (4, Ok(WireType::EGroup))
                | (5, Ok(WireType::I32)) => (),
                (6.., Err(DecodeErrorKind::InvalidWireType { .. })) => (),
                other => panic!("unexpected value {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_field_number_zero() {
        // key = (0 << 3) | VARINT
        let err = decode_key(&[0x00], 0).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::InvalidFieldNumber);
        assert_eq!(err.offset(), 1);
    }

    #[test]
    fn rejects_invalid_raw_wire_type() {
        // key = (1 << 3) | 7
        let err = decode_key(&[0x0f], 0).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::InvalidWireType { value: 7 });
    }

    #[test]
    fn skip_field_varint() {
        let next = skip_field(&[42, 99], 0, WireType::Varint).unwrap();
        assert_eq!(next, 1);

        let next = skip_field(&[0x80, 0x01, 99], 0, WireType::Varint).unwrap();
        assert_eq!(next, 2);
    }

    #[test]
    fn skip_field_fixed() {
        let next = skip_field(&[1, 2, 3, 4, 99], 0, WireType::I32).unwrap();
        assert_eq!(next, 4);

        let next = skip_field(&[1, 2, 3, 4, 5, 6, 7, 8, 99], 0, WireType::I64).unwrap();
        assert_eq!(next, 8);

        let err = skip_field(&[1, 2, 3], 0, WireType::I64).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::UnexpectedEndOfBuffer);
        assert_eq!(err.offset(), 0);
    }

    #[test]
    fn skip_field_len() {
        // length=3, payload, then one trailing byte
        let next = skip_field(&[3, 1, 2, 3, 99], 0, WireType::Len).unwrap();
        assert_eq!(next, 4);

        // empty payload
        let next = skip_field(&[0, 99], 0, WireType::Len).unwrap();
        assert_eq!(next, 1);

        // length promises more bytes than remain
        let err = skip_field(&[5, 1, 2], 0, WireType::Len).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::UnexpectedEndOfBuffer);
    }

    #[test]
    fn skip_field_rejects_groups() {
        assert!(skip_field(&[0], 0, WireType::SGroup).is_err());
        assert!(skip_field(&[0], 0, WireType::EGroup).is_err());
    }
}
