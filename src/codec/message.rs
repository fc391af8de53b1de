//! Schema-directed message encoding and decoding.
//!
//! Encoding walks the descriptor in declaration order and writes every set
//! slot; lengths of LEN frames are computed up front so nested messages and
//! packed payloads are written straight into the output buffer. Decoding is
//! a single-pass cursor over the input: read a key, resolve the field,
//! dispatch to the scalar codec, commit into the message.

use std::sync::Arc;

use bytes::BufMut;
use log::debug;

use crate::codec::{delimited, scalar};
use crate::descriptor::{FieldDescriptor, FieldType, MessageDescriptor};
use crate::error::{DecodeError, DecodeErrorKind, MutationError};
use crate::leb128::{
    decode_signed_varint, decode_varint, encode_signed_varint, encode_varint,
    encoded_signed_varint_len, encoded_varint_len,
};
use crate::message::{Message, Value};
use crate::wire::{self, WireType};

/// Encodes `message` to a fresh byte vector.
///
/// Encoding cannot fail on a message mutated through its checked API. A
/// slot whose value does not match the descriptor, a repeated sequence with
/// foreign elements, a packed flag on a LEN-framed field, or a nested
/// message bound to the wrong descriptor is a programmer error and panics.
pub fn encode_message(message: &Message) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_message_len(message));
    encode_message_into(message, &mut buf);
    buf
}

/// Encodes `message` into `buf`. Panic conditions match [`encode_message`].
pub fn encode_message_into<B: BufMut>(message: &Message, buf: &mut B) {
    for fd in message.descriptor().fields() {
        let Some(value) = message.get(fd.name()) else {
            continue;
        };

        if !fd.is_repeated() {
            wire::encode_key(fd.number(), fd.field_type().wire_type(), buf);
            encode_scalar(fd, value, buf);
            continue;
        }

        let rv = match value {
            Value::Repeated(rv) if rv.elem_type() == fd.field_type() => rv,
            _ => panic!(
                "repeated field '{}' holds a value that is not a {} sequence",
                fd.name(),
                fd.field_type()
            ),
        };

        if fd.is_packed() {
            assert!(
                fd.field_type().packable(),
                "packed encoding is not supported for {} field '{}'",
                fd.field_type(),
                fd.name()
            );
            wire::encode_key(fd.number(), WireType::Len, buf);
            let payload_len: usize = rv.iter().map(|elem| encoded_scalar_len(fd, elem)).sum();
            encode_varint(payload_len as u64, buf);
            for elem in rv {
                encode_scalar(fd, elem, buf);
            }
        } else {
            for elem in rv {
                wire::encode_key(fd.number(), fd.field_type().wire_type(), buf);
                encode_scalar(fd, elem, buf);
            }
        }
    }
}

/// The number of bytes [`encode_message`] produces for `message`.
pub fn encoded_message_len(message: &Message) -> usize {
    let mut len = 0;
    for fd in message.descriptor().fields() {
        let Some(value) = message.get(fd.name()) else {
            continue;
        };

        if !fd.is_repeated() {
            len += wire::encoded_key_len(fd.number()) + encoded_scalar_len(fd, value);
            continue;
        }

        let rv = match value {
            Value::Repeated(rv) => rv,
            _ => panic!(
                "repeated field '{}' holds a value that is not a {} sequence",
                fd.name(),
                fd.field_type()
            ),
        };

        if fd.is_packed() {
            let payload_len: usize = rv.iter().map(|elem| encoded_scalar_len(fd, elem)).sum();
            len += wire::encoded_key_len(fd.number())
                + encoded_varint_len(payload_len as u64)
                + payload_len;
        } else {
            for elem in rv {
                len += wire::encoded_key_len(fd.number()) + encoded_scalar_len(fd, elem);
            }
        }
    }
    len
}

/// Encodes one scalar value, without its key, according to `fd`'s type.
fn encode_scalar<B: BufMut>(fd: &FieldDescriptor, value: &Value, buf: &mut B) {
    match (fd.field_type(), value) {
        (FieldType::Int, Value::Int(v)) => {
            encode_signed_varint(*v, buf);
        }
        (FieldType::UInt, Value::UInt(v)) => {
            encode_varint(*v, buf);
        }
        (FieldType::Bool, Value::Bool(v)) => {
            encode_varint(u64::from(*v), buf);
        }
        (FieldType::Double, Value::Double(v)) => scalar::encode_double(*v, buf),
        (FieldType::Float, Value::Float(v)) => scalar::encode_float(*v, buf),
        (FieldType::String, Value::String(v)) => delimited::encode_string(v, buf),
        (FieldType::Bytes, Value::Bytes(v)) => delimited::encode_bytes(v, buf),
        (FieldType::Message, Value::Message(m)) => {
            let nested = fd
                .nested_descriptor()
                .expect("message field validated at descriptor construction");
            assert!(
                Arc::ptr_eq(m.descriptor(), nested),
                "message in field '{}' is bound to a foreign descriptor",
                fd.name()
            );
            let body_len = encoded_message_len(m);
            encode_varint(body_len as u64, buf);
            encode_message_into(m, buf);
        }
        (field_type, _) => panic!(
            "field '{}' holds a value that does not match its type {field_type}",
            fd.name()
        ),
    }
}

/// The number of bytes [`encode_scalar`] writes for `value`.
fn encoded_scalar_len(fd: &FieldDescriptor, value: &Value) -> usize {
    match (fd.field_type(), value) {
        (FieldType::Int, Value::Int(v)) => encoded_signed_varint_len(*v),
        (FieldType::UInt, Value::UInt(v)) => encoded_varint_len(*v),
        (FieldType::Bool, Value::Bool(_)) => 1,
        (FieldType::Double, Value::Double(_)) => 8,
        (FieldType::Float, Value::Float(_)) => 4,
        (FieldType::String, Value::String(v)) => encoded_varint_len(v.len() as u64) + v.len(),
        (FieldType::Bytes, Value::Bytes(v)) => encoded_varint_len(v.len() as u64) + v.len(),
        (FieldType::Message, Value::Message(m)) => {
            let body_len = encoded_message_len(m);
            encoded_varint_len(body_len as u64) + body_len
        }
        (field_type, _) => panic!(
            "field '{}' holds a value that does not match its type {field_type}",
            fd.name()
        ),
    }
}

/// Decodes a message bound to `desc` from the whole of `buf`.
///
/// Returns the message and the consumed length. The first malformation
/// fails the entire decode; no partial message is returned.
pub fn decode_message(
    buf: &[u8],
    desc: &Arc<MessageDescriptor>,
) -> Result<(Message, usize), DecodeError> {
    decode_message_at(buf, 0, desc)
}

/// Decodes a message bound to `desc` from `buf`, starting at `offset` and
/// running to the end of the buffer.
pub fn decode_message_at(
    buf: &[u8],
    offset: usize,
    desc: &Arc<MessageDescriptor>,
) -> Result<(Message, usize), DecodeError> {
    let mut message = Message::new(Arc::clone(desc));
    let mut offset = offset;

    while offset < buf.len() {
        let (number, wire_type, after_key) = wire::decode_key(buf, offset)?;
        offset = after_key;

        // Field numbers past the u32 range cannot appear in any descriptor;
        // they fall through the lookup and are skipped like any other
        // unknown field.
        let field_index = u32::try_from(number)
            .ok()
            .and_then(|number| desc.index_by_number(number));
        let Some(field_index) = field_index else {
            debug!("skipping unknown field {number} ({wire_type:?})");
            offset = wire::skip_field(buf, offset, wire_type)?;
            continue;
        };

        let fd = &desc.fields()[field_index];
        let expected = fd.field_type().wire_type();

        if !fd.is_repeated() {
            if wire_type != expected {
                debug!(
                    "field '{}' arrived as {wire_type:?}, descriptor says {expected:?}",
                    fd.name()
                );
                return Err(DecodeError::new(
                    DecodeErrorKind::WireTypeMismatch {
                        expected,
                        actual: wire_type,
                    },
                    offset,
                ));
            }
            let (value, next) = decode_scalar(fd, buf, offset)?;
            commit(message.set(fd.name(), value), offset)?;
            offset = next;
        } else if wire_type == WireType::Len && fd.field_type().packable() {
            // A LEN frame on a packable element type is a packed payload,
            // whether or not the descriptor asks for packed encoding.
            offset = decode_packed(fd, buf, offset, &mut message)?;
        } else if wire_type == expected {
            let (value, next) = decode_scalar(fd, buf, offset)?;
            commit(message.push(fd.name(), value), offset)?;
            offset = next;
        } else {
            debug!(
                "repeated field '{}' arrived as {wire_type:?}, descriptor says {expected:?}",
                fd.name()
            );
            return Err(DecodeError::new(
                DecodeErrorKind::WireTypeMismatch {
                    expected,
                    actual: wire_type,
                },
                offset,
            ));
        }
    }

    Ok((message, offset))
}

/// Decodes one packed payload into `message`, returning the offset past it.
///
/// The overrun check keeps the cursor from ever passing the frame end, so
/// the loop exits exactly on the element boundary or fails.
fn decode_packed(
    fd: &FieldDescriptor,
    buf: &[u8],
    offset: usize,
    message: &mut Message,
) -> Result<usize, DecodeError> {
    let (len, after_len) = wire::decode_len(buf, offset)?;
    if buf.len() - after_len < len {
        return Err(DecodeError::new(
            DecodeErrorKind::UnexpectedEndOfBuffer,
            after_len,
        ));
    }

    let payload_end = after_len + len;
    let mut pos = after_len;
    while pos < payload_end {
        let (value, next) = decode_scalar(fd, buf, pos)?;
        if next > payload_end {
            return Err(DecodeError::new(DecodeErrorKind::PackedElementOverrun, pos));
        }
        commit(message.push(fd.name(), value), pos)?;
        pos = next;
    }
    Ok(payload_end)
}

/// Decodes one scalar value, without its key, according to `fd`'s type.
fn decode_scalar(
    fd: &FieldDescriptor,
    buf: &[u8],
    offset: usize,
) -> Result<(Value, usize), DecodeError> {
    match fd.field_type() {
        FieldType::Int => {
            let (v, next) = decode_signed_varint(buf, offset)?;
            Ok((Value::Int(v), next))
        }
        FieldType::UInt => {
            let (v, next) = decode_varint(buf, offset)?;
            Ok((Value::UInt(v), next))
        }
        FieldType::Bool => {
            let (raw, next) = decode_varint(buf, offset)?;
            if raw > 1 {
                return Err(DecodeError::new(
                    DecodeErrorKind::InvalidBool { value: raw },
                    offset,
                ));
            }
            Ok((Value::Bool(raw == 1), next))
        }
        FieldType::Double => {
            let (v, next) = scalar::decode_double(buf, offset)?;
            Ok((Value::Double(v), next))
        }
        FieldType::Float => {
            let (v, next) = scalar::decode_float(buf, offset)?;
            Ok((Value::Float(v), next))
        }
        FieldType::String => {
            let (v, next) = delimited::decode_string(buf, offset)?;
            Ok((Value::String(v), next))
        }
        FieldType::Bytes => {
            let (v, next) = delimited::decode_bytes(buf, offset)?;
            Ok((Value::Bytes(v), next))
        }
        FieldType::Message => {
            let nested = fd
                .nested_descriptor()
                .expect("message field validated at descriptor construction");
            let (len, after_len) = wire::decode_len(buf, offset)?;
            if buf.len() - after_len < len {
                return Err(DecodeError::new(
                    DecodeErrorKind::UnexpectedEndOfBuffer,
                    offset,
                ));
            }
            // Recurse over the bounded sub-slice; error offsets stay
            // absolute within the outer buffer.
            let end = after_len + len;
            let (nested_message, consumed) = decode_message_at(&buf[..end], after_len, nested)?;
            debug_assert_eq!(consumed, end);
            Ok((Value::Message(nested_message), end))
        }
    }
}

/// Maps an impossible mutation failure into a decode error.
///
/// `decode_scalar` only produces values the field accepts, so a rejection
/// here means the codec and the message model disagree.
fn commit(result: Result<(), MutationError>, offset: usize) -> Result<(), DecodeError> {
    result.map_err(|_| {
        DecodeError::new(
            DecodeErrorKind::ProgrammingError {
                reason: "decoded value rejected by message slot",
            },
            offset,
        )
    })
}
