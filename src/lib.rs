//! Dynamic, descriptor-driven codec for a subset of the
//! [protobuf](https://protobuf.dev) wire format.
//!
//! A schema is built at runtime as a [`MessageDescriptor`], messages are
//! assembled against it with typed mutators, and converted to and from the
//! tag-length-value byte stream. The receiving side needs the same
//! descriptor to decode.
//!
//! ```
//! use protodyn::{FieldDescriptor, FieldType, Message, MessageDescriptor};
//! use protodyn::{decode_message, encode_message};
//!
//! let desc = MessageDescriptor::new(vec![
//!     FieldDescriptor::new("id", 1, FieldType::Int),
//!     FieldDescriptor::new("name", 3, FieldType::String),
//! ])?;
//!
//! let mut message = Message::new(desc.clone());
//! message.set("id", 42i64)?;
//! message.set("name", "answer")?;
//!
//! let bytes = encode_message(&message);
//! let (decoded, consumed) = decode_message(&bytes, &desc)?;
//! assert_eq!(consumed, bytes.len());
//! assert_eq!(decoded.get("id").unwrap().as_i64(), Some(42));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Supported wire types are 0 (VARINT), 1 (I64), 2 (LEN), and 5 (I32); the
//! deprecated group types 3 and 4 are rejected on decode. Unknown fields
//! are skipped and discarded.

pub mod codec;
pub mod descriptor;
pub mod error;
pub mod leb128;
pub mod message;
pub mod wire;

pub use codec::{
    decode_message, decode_message_at, encode_message, encode_message_into, encoded_message_len,
};
pub use descriptor::{FieldDescriptor, FieldType, MessageDescriptor};
pub use error::{DecodeError, DecodeErrorKind, DescriptorError, MutationError};
pub use message::{Message, RepeatedValue, Value};
pub use wire::WireType;
