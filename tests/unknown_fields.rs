//! Decoding tolerance for fields the descriptor has never heard of.

use std::sync::Arc;

use protodyn::leb128::encode_varint;
use protodyn::{
    decode_message, encode_message, FieldDescriptor, FieldType, Message, MessageDescriptor,
    WireType,
};

fn desc_with(fields: Vec<FieldDescriptor>) -> Arc<MessageDescriptor> {
    MessageDescriptor::new(fields).unwrap()
}

fn append_key(buf: &mut Vec<u8>, number: u64, wire_type: WireType) {
    encode_varint((number << 3) | u64::from(wire_type.into_val()), buf);
}

#[test]
fn skips_unknown_varint_field() {
    let desc = desc_with(vec![
        FieldDescriptor::new("id", 1, FieldType::Int),
        FieldDescriptor::new("name", 3, FieldType::String),
    ]);

    let mut message = Message::new(Arc::clone(&desc));
    message.set("id", 7i64).unwrap();
    message.set("name", "ok").unwrap();

    let mut bytes = encode_message(&message);
    append_key(&mut bytes, 99, WireType::Varint);
    encode_varint(150, &mut bytes);

    let (decoded, consumed) = decode_message(&bytes, &desc).unwrap();
    assert_eq!(consumed, bytes.len());
    assert_eq!(decoded.get("id").unwrap().as_i64(), Some(7));
    assert_eq!(decoded.get("name").unwrap().as_str(), Some("ok"));
}

#[test]
fn skips_unknown_len_field() {
    let desc = desc_with(vec![FieldDescriptor::new("id", 1, FieldType::Int)]);

    let mut message = Message::new(Arc::clone(&desc));
    message.set("id", 42i64).unwrap();

    let mut bytes = encode_message(&message);
    append_key(&mut bytes, 50, WireType::Len);
    bytes.push(3);
    bytes.extend_from_slice(b"xyz");

    let (decoded, consumed) = decode_message(&bytes, &desc).unwrap();
    assert_eq!(consumed, bytes.len());
    assert_eq!(decoded.get("id").unwrap().as_i64(), Some(42));
}

#[test]
fn skips_unknown_fixed_width_fields() {
    let desc = desc_with(vec![FieldDescriptor::new("id", 1, FieldType::Int)]);

    let mut bytes = Vec::new();
    append_key(&mut bytes, 12, WireType::I64);
    bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
    append_key(&mut bytes, 13, WireType::I32);
    bytes.extend_from_slice(&[9, 10, 11, 12]);
    // The known field arrives after the noise.
    append_key(&mut bytes, 1, WireType::Varint);
    bytes.push(0x02);

    let (decoded, consumed) = decode_message(&bytes, &desc).unwrap();
    assert_eq!(consumed, bytes.len());
    assert_eq!(decoded.get("id").unwrap().as_i64(), Some(1));
}

#[test]
fn skips_unknown_field_with_huge_number() {
    let desc = desc_with(vec![FieldDescriptor::new("id", 1, FieldType::Int)]);

    let mut bytes = Vec::new();
    // A field number far past the 2^29-1 descriptor range; the key is still
    // a well-formed varint and the field is simply unknown.
    append_key(&mut bytes, u64::from(u32::MAX) + 1, WireType::Varint);
    bytes.push(0x05);
    append_key(&mut bytes, 1, WireType::Varint);
    bytes.push(0x02);

    let (decoded, _) = decode_message(&bytes, &desc).unwrap();
    assert_eq!(decoded.get("id").unwrap().as_i64(), Some(1));
}

#[test]
fn truncated_unknown_field_still_fails() {
    let desc = desc_with(vec![FieldDescriptor::new("id", 1, FieldType::Int)]);

    let mut bytes = Vec::new();
    append_key(&mut bytes, 99, WireType::I64);
    bytes.extend_from_slice(&[1, 2, 3]);

    let err = decode_message(&bytes, &desc).unwrap_err();
    // The skip starts, and fails, just past the key.
    assert_eq!(err.offset(), bytes.len() - 3);
}

#[test]
fn unknown_fields_are_not_preserved_on_reencode() {
    let wide = desc_with(vec![
        FieldDescriptor::new("name", 1, FieldType::String),
        FieldDescriptor::new("age", 2, FieldType::UInt),
        FieldDescriptor::new("email", 3, FieldType::String),
        FieldDescriptor::new("score", 4, FieldType::Int),
    ]);
    let narrow = desc_with(vec![
        FieldDescriptor::new("name", 1, FieldType::String),
        FieldDescriptor::new("age", 2, FieldType::UInt),
    ]);

    let mut message = Message::new(Arc::clone(&wide));
    message.set("name", "Alice").unwrap();
    message.set("age", 30u64).unwrap();
    message.set("email", "alice@example.com").unwrap();
    message.set("score", 100i64).unwrap();
    let wide_bytes = encode_message(&message);

    // The narrow schema reads the fields it knows and drops the rest.
    let (decoded, consumed) = decode_message(&wide_bytes, &narrow).unwrap();
    assert_eq!(consumed, wide_bytes.len());
    assert_eq!(decoded.get("name").unwrap().as_str(), Some("Alice"));
    assert_eq!(decoded.get("age").unwrap().as_u64(), Some(30));

    // Re-encoding emits only the known fields.
    let narrow_bytes = encode_message(&decoded);
    assert!(narrow_bytes.len() < wide_bytes.len());
    let (again, _) = decode_message(&narrow_bytes, &narrow).unwrap();
    assert_eq!(again, decoded);
}
