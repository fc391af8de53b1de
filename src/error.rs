//! Error types for descriptor construction, message mutation, and decoding.

use core::fmt;

use crate::descriptor::FieldType;
use crate::wire::WireType;

/// The reason a buffer failed to decode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// A varint was truncated, unterminated after ten bytes, or carried
    /// payload bits past the 64-bit range.
    InvalidVarint,
    /// The buffer ended before a fixed-width value or delimited payload.
    UnexpectedEndOfBuffer,
    /// A field key carried field number zero.
    InvalidFieldNumber,
    /// A field key carried a wire-type value outside 0..=5.
    InvalidWireType { value: u8 },
    /// A field used the deprecated SGROUP/EGROUP encoding.
    DeprecatedGroupEncoding,
    /// A known field arrived with a wire type other than its descriptor's.
    WireTypeMismatch { expected: WireType, actual: WireType },
    /// A bool field carried a varint other than 0 or 1.
    InvalidBool { value: u64 },
    /// A string field carried bytes that are not valid UTF-8.
    InvalidUtf8,
    /// A length prefix exceeds platform addressable memory.
    LengthOverflow { value: u64 },
    /// A packed element extended past the end of its payload frame.
    PackedElementOverrun,
    /// An invariant the codec relies on was violated.
    ProgrammingError { reason: &'static str },
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErrorKind::InvalidVarint => {
                write!(f, "invalid varint")
            }
            DecodeErrorKind::UnexpectedEndOfBuffer => {
                write!(f, "unexpected end of buffer")
            }
            DecodeErrorKind::InvalidFieldNumber => {
                write!(f, "field number must not be zero")
            }
            DecodeErrorKind::InvalidWireType { value } => {
                write!(f, "invalid 'wire type' value: {value}")
            }
            DecodeErrorKind::DeprecatedGroupEncoding => {
                write!(f, "deprecated group encoding not supported")
            }
            DecodeErrorKind::WireTypeMismatch { expected, actual } => {
                write!(f, "wire type mismatch: expected {expected:?}, got {actual:?}")
            }
            DecodeErrorKind::InvalidBool { value } => {
                write!(f, "invalid bool value: {value}")
            }
            DecodeErrorKind::InvalidUtf8 => {
                write!(f, "invalid UTF-8 in string field")
            }
            DecodeErrorKind::LengthOverflow { value } => {
                write!(
                    f,
                    "length prefix {value} exceeds platform addressable memory"
                )
            }
            DecodeErrorKind::PackedElementOverrun => {
                write!(f, "packed element extends past the payload frame")
            }
            DecodeErrorKind::ProgrammingError { reason } => {
                write!(f, "programming error: '{reason}'")
            }
        }
    }
}

/// A decode failure together with the byte offset it was detected at.
///
/// The offset convention is part of the interface: varint and key failures
/// report the position the read started at, wire-type mismatches report the
/// offset just past the key, and scalar or packed-element failures report
/// the start of the malformed value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    offset: usize,
}

impl DecodeError {
    pub(crate) fn new(kind: DecodeErrorKind, offset: usize) -> Self {
        DecodeError { kind, offset }
    }

    /// The reason the decode failed.
    pub fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    /// The byte offset the failure was detected at.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)
    }
}

impl std::error::Error for DecodeError {}

/// Errors detected while constructing a [`MessageDescriptor`].
///
/// [`MessageDescriptor`]: crate::descriptor::MessageDescriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// A field had an empty name.
    EmptyFieldName,
    /// A field used number zero.
    ZeroFieldNumber { name: String },
    /// A field number exceeded the protobuf maximum of `2^29 - 1`.
    FieldNumberOutOfRange { name: String, number: u32 },
    /// A field number fell in the reserved range 19000..=19999.
    ReservedFieldNumber { name: String, number: u32 },
    /// Two fields shared a name.
    DuplicateFieldName { name: String },
    /// Two fields shared a number.
    DuplicateFieldNumber { number: u32 },
    /// A message-typed field was declared without a nested descriptor.
    MissingNestedDescriptor { name: String },
    /// A scalar field was declared with a nested descriptor.
    UnexpectedNestedDescriptor { name: String },
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorError::EmptyFieldName => {
                write!(f, "field name must not be empty")
            }
            DescriptorError::ZeroFieldNumber { name } => {
                write!(f, "field '{name}' uses number 0")
            }
            DescriptorError::FieldNumberOutOfRange { name, number } => {
                write!(f, "field '{name}' number {number} exceeds 2^29 - 1")
            }
            DescriptorError::ReservedFieldNumber { name, number } => {
                write!(
                    f,
                    "field '{name}' number {number} is in the reserved range 19000..=19999"
                )
            }
            DescriptorError::DuplicateFieldName { name } => {
                write!(f, "duplicate field name: '{name}'")
            }
            DescriptorError::DuplicateFieldNumber { number } => {
                write!(f, "duplicate field number: {number}")
            }
            DescriptorError::MissingNestedDescriptor { name } => {
                write!(f, "message field '{name}' has no nested descriptor")
            }
            DescriptorError::UnexpectedNestedDescriptor { name } => {
                write!(f, "non-message field '{name}' has a nested descriptor")
            }
        }
    }
}

impl std::error::Error for DescriptorError {}

/// Errors returned by [`Message`] mutators.
///
/// A failed mutation never modifies the message. The error carries no field
/// name; the call site already knows it, and the decode paths log context
/// instead.
///
/// [`Message`]: crate::message::Message
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MutationError {
    /// The named field does not exist in the descriptor.
    UnknownField,
    /// The value's variant does not match the field's type.
    TypeMismatch { expected: FieldType },
    /// A repeated element's variant does not match the element type.
    ElementTypeMismatch { expected: FieldType },
    /// `push` or an indexed accessor was used on a non-repeated field.
    NotRepeated,
    /// The index is past the end of the repeated value.
    IndexOutOfBounds { index: usize, len: usize },
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationError::UnknownField => {
                write!(f, "unknown field name")
            }
            MutationError::TypeMismatch { expected } => {
                write!(f, "value does not match field type {expected}")
            }
            MutationError::ElementTypeMismatch { expected } => {
                write!(f, "element does not match element type {expected}")
            }
            MutationError::NotRepeated => {
                write!(f, "field is not repeated")
            }
            MutationError::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
        }
    }
}

impl std::error::Error for MutationError {}
