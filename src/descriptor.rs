//! Runtime schemas: field and message descriptors.
//!
//! A [`MessageDescriptor`] is built once from a literal list of
//! [`FieldDescriptor`]s, validated, and then shared read-only (via `Arc`)
//! by every [`Message`] bound to it.
//!
//! [`Message`]: crate::message::Message

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::DescriptorError;
use crate::wire::{WireType, MAXIMUM_FIELD_NUMBER, RESERVED_FIELD_NUMBERS};

/// The scalar kind of a field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Signed 64-bit integer, zig-zag varint on the wire.
    Int,
    /// Unsigned 64-bit integer, plain varint on the wire.
    UInt,
    /// Boolean, varint 0 or 1 on the wire.
    Bool,
    /// 64-bit IEEE-754, fixed64 on the wire.
    Double,
    /// 32-bit IEEE-754, fixed32 on the wire.
    Float,
    /// UTF-8 string, length-delimited on the wire.
    String,
    /// Opaque byte sequence, length-delimited on the wire.
    Bytes,
    /// Nested message, length-delimited on the wire.
    Message,
}

impl FieldType {
    /// The wire framing of a single scalar of this type.
    pub const fn wire_type(self) -> WireType {
        match self {
            FieldType::Int | FieldType::UInt | FieldType::Bool => WireType::Varint,
            FieldType::Double => WireType::I64,
            FieldType::Float => WireType::I32,
            FieldType::String | FieldType::Bytes | FieldType::Message => WireType::Len,
        }
    }

    /// Whether elements of this type may ride in a packed LEN frame.
    ///
    /// LEN-framed scalars carry their own length prefix and are never
    /// packed.
    pub const fn packable(self) -> bool {
        !matches!(self.wire_type(), WireType::Len)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Int => "int",
            FieldType::UInt => "uint",
            FieldType::Bool => "bool",
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Message => "message",
        };
        f.write_str(name)
    }
}

/// Describes one field of a message: name, number, scalar type, arity, and
/// the nested descriptor for message-typed fields.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    number: u32,
    field_type: FieldType,
    repeated: bool,
    packed: bool,
    nested: Option<Arc<MessageDescriptor>>,
}

impl FieldDescriptor {
    /// Creates a scalar field descriptor.
    pub fn new(name: impl Into<String>, number: u32, field_type: FieldType) -> Self {
        FieldDescriptor {
            name: name.into(),
            number,
            field_type,
            repeated: false,
            packed: false,
            nested: None,
        }
    }

    /// Creates a message-typed field descriptor referencing `nested`.
    pub fn message(
        name: impl Into<String>,
        number: u32,
        nested: Arc<MessageDescriptor>,
    ) -> Self {
        FieldDescriptor {
            name: name.into(),
            number,
            field_type: FieldType::Message,
            repeated: false,
            packed: false,
            nested: Some(nested),
        }
    }

    /// Marks the field as repeated.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Marks the field as packed. Meaningful only on repeated fields; the
    /// flag is ignored for non-repeated ones.
    pub fn packed(mut self) -> Self {
        self.packed = true;
        self
    }

    /// The field's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's number.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The field's scalar type.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Whether the field is repeated.
    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    /// Whether a repeated field encodes in the packed form.
    pub fn is_packed(&self) -> bool {
        self.packed
    }

    /// The nested descriptor of a message-typed field.
    pub fn nested_descriptor(&self) -> Option<&Arc<MessageDescriptor>> {
        self.nested.as_ref()
    }
}

/// An ordered list of field descriptors plus name and number indexes.
///
/// Immutable after construction. [`MessageDescriptor::new`] hands the
/// descriptor out behind an `Arc` because every message, and every nested
/// field referencing it, shares the same instance.
#[derive(Debug)]
pub struct MessageDescriptor {
    fields: Vec<FieldDescriptor>,
    name_to_index: HashMap<String, usize>,
    number_to_index: HashMap<u32, usize>,
}

impl MessageDescriptor {
    /// Validates `fields` and builds the lookup indexes.
    ///
    /// Rejects empty or duplicate names, zero, duplicate, reserved
    /// (19000..=19999) or out-of-range numbers, and nested descriptors that
    /// are missing on message fields or present on scalar ones.
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Arc<Self>, DescriptorError> {
        let mut name_to_index = HashMap::with_capacity(fields.len());
        let mut number_to_index = HashMap::with_capacity(fields.len());

        for (index, fd) in fields.iter().enumerate() {
            if fd.name.is_empty() {
                return Err(DescriptorError::EmptyFieldName);
            }
            if fd.number == 0 {
                return Err(DescriptorError::ZeroFieldNumber {
                    name: fd.name.clone(),
                });
            }
            if fd.number > MAXIMUM_FIELD_NUMBER {
                return Err(DescriptorError::FieldNumberOutOfRange {
                    name: fd.name.clone(),
                    number: fd.number,
                });
            }
            if RESERVED_FIELD_NUMBERS.contains(&fd.number) {
                return Err(DescriptorError::ReservedFieldNumber {
                    name: fd.name.clone(),
                    number: fd.number,
                });
            }
            match (fd.field_type, &fd.nested) {
                (FieldType::Message, None) => {
                    return Err(DescriptorError::MissingNestedDescriptor {
                        name: fd.name.clone(),
                    });
                }
                (FieldType::Message, Some(_)) => (),
                (_, Some(_)) => {
                    return Err(DescriptorError::UnexpectedNestedDescriptor {
                        name: fd.name.clone(),
                    });
                }
                (_, None) => (),
            }
            if name_to_index.insert(fd.name.clone(), index).is_some() {
                return Err(DescriptorError::DuplicateFieldName {
                    name: fd.name.clone(),
                });
            }
            if number_to_index.insert(fd.number, index).is_some() {
                return Err(DescriptorError::DuplicateFieldNumber { number: fd.number });
            }
        }

        Ok(Arc::new(MessageDescriptor {
            fields,
            name_to_index,
            number_to_index,
        }))
    }

    /// The fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// The slot index of the field named `name`, if any.
    pub fn index_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// The slot index of the field numbered `number`, if any.
    pub fn index_by_number(&self, number: u32) -> Option<usize> {
        self.number_to_index.get(&number).copied()
    }

    /// The field named `name`, if any.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index_by_name(name).map(|i| &self.fields[i])
    }

    /// The field numbered `number`, if any.
    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.index_by_number(number).map(|i| &self.fields[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_indexes_in_declaration_order() {
        let desc = MessageDescriptor::new(vec![
            FieldDescriptor::new("id", 1, FieldType::Int),
            FieldDescriptor::new("name", 3, FieldType::String),
            FieldDescriptor::new("tags", 6, FieldType::UInt).repeated(),
        ])
        .unwrap();

        assert_eq!(desc.fields().len(), 3);
        assert_eq!(desc.index_by_name("id"), Some(0));
        assert_eq!(desc.index_by_name("tags"), Some(2));
        assert_eq!(desc.index_by_number(3), Some(1));
        assert_eq!(desc.index_by_name("missing"), None);
        assert_eq!(desc.index_by_number(2), None);
        assert_eq!(desc.field_by_name("name").unwrap().number(), 3);
        assert!(desc.field_by_name("tags").unwrap().is_repeated());
    }

    #[test]
    fn rejects_duplicate_name() {
        let err = MessageDescriptor::new(vec![
            FieldDescriptor::new("a", 1, FieldType::Int),
            FieldDescriptor::new("a", 2, FieldType::Double),
        ])
        .unwrap_err();
        assert_eq!(err, DescriptorError::DuplicateFieldName { name: "a".into() });
    }

    #[test]
    fn rejects_duplicate_number() {
        let err = MessageDescriptor::new(vec![
            FieldDescriptor::new("a", 1, FieldType::Int),
            FieldDescriptor::new("b", 1, FieldType::Double),
        ])
        .unwrap_err();
        assert_eq!(err, DescriptorError::DuplicateFieldNumber { number: 1 });
    }

    #[test]
    fn rejects_zero_field_number() {
        let err =
            MessageDescriptor::new(vec![FieldDescriptor::new("a", 0, FieldType::Int)]).unwrap_err();
        assert_eq!(err, DescriptorError::ZeroFieldNumber { name: "a".into() });
    }

    #[test]
    fn rejects_empty_name() {
        let err =
            MessageDescriptor::new(vec![FieldDescriptor::new("", 1, FieldType::Int)]).unwrap_err();
        assert_eq!(err, DescriptorError::EmptyFieldName);
    }

    #[test]
    fn rejects_reserved_and_out_of_range_numbers() {
        let err = MessageDescriptor::new(vec![FieldDescriptor::new("a", 19000, FieldType::Int)])
            .unwrap_err();
        assert_eq!(
            err,
            DescriptorError::ReservedFieldNumber {
                name: "a".into(),
                number: 19000
            }
        );

        let err = MessageDescriptor::new(vec![FieldDescriptor::new("a", 1 << 29, FieldType::Int)])
            .unwrap_err();
        assert_eq!(
            err,
            DescriptorError::FieldNumberOutOfRange {
                name: "a".into(),
                number: 1 << 29
            }
        );

        // 19999 is still reserved, 20000 is fine again.
        assert!(
            MessageDescriptor::new(vec![FieldDescriptor::new("a", 19999, FieldType::Int)]).is_err()
        );
        assert!(
            MessageDescriptor::new(vec![FieldDescriptor::new("a", 20000, FieldType::Int)]).is_ok()
        );
    }

    #[test]
    fn nested_descriptor_presence_matches_type() {
        let inner = MessageDescriptor::new(vec![FieldDescriptor::new(
            "nested_id",
            1,
            FieldType::Int,
        )])
        .unwrap();

        // Message field without a nested descriptor.
        let err = MessageDescriptor::new(vec![FieldDescriptor::new(
            "inner",
            1,
            FieldType::Message,
        )])
        .unwrap_err();
        assert_eq!(
            err,
            DescriptorError::MissingNestedDescriptor {
                name: "inner".into()
            }
        );

        // Scalar field with one.
        let mut fd = FieldDescriptor::new("id", 1, FieldType::Int);
        fd.nested = Some(Arc::clone(&inner));
        let err = MessageDescriptor::new(vec![fd]).unwrap_err();
        assert_eq!(
            err,
            DescriptorError::UnexpectedNestedDescriptor { name: "id".into() }
        );

        // The proper shape.
        let desc = MessageDescriptor::new(vec![FieldDescriptor::message("inner", 1, inner)])
            .unwrap();
        assert!(desc
            .field_by_name("inner")
            .unwrap()
            .nested_descriptor()
            .is_some());
    }

    #[test]
    fn wire_type_table() {
        assert_eq!(FieldType::Int.wire_type(), WireType::Varint);
        assert_eq!(FieldType::UInt.wire_type(), WireType::Varint);
        assert_eq!(FieldType::Bool.wire_type(), WireType::Varint);
        assert_eq!(FieldType::Double.wire_type(), WireType::I64);
        assert_eq!(FieldType::Float.wire_type(), WireType::I32);
        assert_eq!(FieldType::String.wire_type(), WireType::Len);
        assert_eq!(FieldType::Bytes.wire_type(), WireType::Len);
        assert_eq!(FieldType::Message.wire_type(), WireType::Len);

        assert!(FieldType::Int.packable());
        assert!(FieldType::Bool.packable());
        assert!(FieldType::Double.packable());
        assert!(FieldType::Float.packable());
        assert!(!FieldType::String.packable());
        assert!(!FieldType::Bytes.packable());
        assert!(!FieldType::Message.packable());
    }
}
