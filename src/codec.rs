//! Encoding and decoding for the wire format.
//!
//! Encoders write through [`bytes::BufMut`]; decoders read from a byte
//! slice plus a start offset and return `(value, offset_past_value)`, with
//! failures carrying the offset the read started at.

mod delimited;
mod message;
mod scalar;

pub use delimited::{decode_bytes, decode_string, encode_bytes, encode_string};
pub use message::{
    decode_message, decode_message_at, encode_message, encode_message_into, encoded_message_len,
};
pub use scalar::{
    decode_double, decode_fixed32, decode_fixed64, decode_float, encode_double, encode_fixed32,
    encode_fixed64, encode_float,
};
