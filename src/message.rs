//! The dynamic message model: typed values and descriptor-bound messages.

use std::sync::Arc;

use bytes::Bytes;
use log::debug;

use crate::descriptor::{FieldType, MessageDescriptor};
use crate::error::MutationError;

/// A dynamically typed field value.
///
/// Scalars map one-to-one onto [`FieldType`] variants; repeated fields hold
/// a [`RepeatedValue`]. The `Vec` of slots inside [`Message`] breaks the
/// `Value`/`Message` recursion.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed 64-bit integer.
    Int(i64),
    /// Unsigned 64-bit integer.
    UInt(u64),
    /// Boolean.
    Bool(bool),
    /// 32-bit IEEE-754.
    Float(f32),
    /// 64-bit IEEE-754.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Opaque byte sequence.
    Bytes(Bytes),
    /// Nested message.
    Message(Message),
    /// Homogeneous ordered sequence of values.
    Repeated(RepeatedValue),
}

impl Value {
    /// The [`FieldType`] this value's variant corresponds to, or `None`
    /// for [`Value::Repeated`], which carries its element type itself.
    pub fn scalar_type(&self) -> Option<FieldType> {
        match self {
            Value::Int(_) => Some(FieldType::Int),
            Value::UInt(_) => Some(FieldType::UInt),
            Value::Bool(_) => Some(FieldType::Bool),
            Value::Float(_) => Some(FieldType::Float),
            Value::Double(_) => Some(FieldType::Double),
            Value::String(_) => Some(FieldType::String),
            Value::Bytes(_) => Some(FieldType::Bytes),
            Value::Message(_) => Some(FieldType::Message),
            Value::Repeated(_) => None,
        }
    }

    /// The signed integer, if this is a [`Value::Int`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The unsigned integer, if this is a [`Value::UInt`].
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// The boolean, if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The float, if this is a [`Value::Float`].
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The double, if this is a [`Value::Double`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// The string, if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// The byte sequence, if this is a [`Value::Bytes`].
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// The nested message, if this is a [`Value::Message`].
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Value::Message(v) => Some(v),
            _ => None,
        }
    }

    /// The repeated value, if this is a [`Value::Repeated`].
    pub fn as_repeated(&self) -> Option<&RepeatedValue> {
        match self {
            Value::Repeated(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytes(v)
    }
}

impl From<Message> for Value {
    fn from(v: Message) -> Self {
        Value::Message(v)
    }
}

impl From<RepeatedValue> for Value {
    fn from(v: RepeatedValue) -> Self {
        Value::Repeated(v)
    }
}

/// An ordered sequence of values sharing one element type.
///
/// The element-type invariant is enforced on every mutation, so a
/// `RepeatedValue` pulled out of a [`Message`] is always homogeneous.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatedValue {
    elem_type: FieldType,
    values: Vec<Value>,
}

impl RepeatedValue {
    /// Creates an empty sequence whose elements must be of `elem_type`.
    pub fn new(elem_type: FieldType) -> Self {
        RepeatedValue {
            elem_type,
            values: Vec::new(),
        }
    }

    /// The element type every value in the sequence matches.
    pub fn elem_type(&self) -> FieldType {
        self.elem_type
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The element at `index`, if in bounds.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Iterates over the elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Appends `value`, rejecting variants that do not match the element
    /// type.
    pub fn push(&mut self, value: impl Into<Value>) -> Result<(), MutationError> {
        let value = value.into();
        if value.scalar_type() != Some(self.elem_type) {
            return Err(MutationError::ElementTypeMismatch {
                expected: self.elem_type,
            });
        }
        self.values.push(value);
        Ok(())
    }

    /// Replaces the element at `index`, with the same checks as
    /// [`RepeatedValue::push`] plus bounds.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<(), MutationError> {
        let value = value.into();
        if value.scalar_type() != Some(self.elem_type) {
            return Err(MutationError::ElementTypeMismatch {
                expected: self.elem_type,
            });
        }
        let len = self.values.len();
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(MutationError::IndexOutOfBounds { index, len }),
        }
    }
}

impl<'a> IntoIterator for &'a RepeatedValue {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A descriptor-bound record holding an optional typed value per field.
///
/// Every mutator checks the value against the descriptor before touching
/// the slot; a failed mutation leaves the message untouched. Two messages
/// compare equal when they are bound to the same descriptor instance and
/// hold equal slots.
#[derive(Debug, Clone)]
pub struct Message {
    desc: Arc<MessageDescriptor>,
    slots: Vec<Option<Value>>,
}

impl Message {
    /// Creates an empty message bound to `desc`, with one unset slot per
    /// field.
    pub fn new(desc: Arc<MessageDescriptor>) -> Self {
        let slots = vec![None; desc.fields().len()];
        Message { desc, slots }
    }

    /// The descriptor this message is bound to.
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.desc
    }

    /// The value of the field named `name`, if the field exists and is set.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.desc.index_by_name(name)?;
        self.slots[index].as_ref()
    }

    /// Sets the field named `name` to `value`, overwriting any prior value.
    ///
    /// Non-repeated fields take the matching scalar variant; repeated
    /// fields take a [`Value::Repeated`] whose element type matches.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), MutationError> {
        let value = value.into();
        let Some(index) = self.desc.index_by_name(name) else {
            debug!("set on unknown field '{name}'");
            return Err(MutationError::UnknownField);
        };
        let fd = &self.desc.fields()[index];

        if fd.is_repeated() {
            let matches = matches!(&value, Value::Repeated(rv) if rv.elem_type() == fd.field_type());
            if !matches {
                debug!("set on repeated field '{name}' with non-matching value");
                return Err(MutationError::TypeMismatch {
                    expected: fd.field_type(),
                });
            }
        } else if value.scalar_type() != Some(fd.field_type()) {
            debug!(
                "set on field '{name}' rejects variant that is not {}",
                fd.field_type()
            );
            return Err(MutationError::TypeMismatch {
                expected: fd.field_type(),
            });
        }

        self.slots[index] = Some(value);
        Ok(())
    }

    /// Appends `value` to the repeated field named `name`, initializing the
    /// slot to an empty sequence of the field's element type on first use.
    pub fn push(&mut self, name: &str, value: impl Into<Value>) -> Result<(), MutationError> {
        let value = value.into();
        let Some(index) = self.desc.index_by_name(name) else {
            debug!("push on unknown field '{name}'");
            return Err(MutationError::UnknownField);
        };
        let fd = &self.desc.fields()[index];
        if !fd.is_repeated() {
            debug!("push on non-repeated field '{name}'");
            return Err(MutationError::NotRepeated);
        }
        if value.scalar_type() != Some(fd.field_type()) {
            return Err(MutationError::ElementTypeMismatch {
                expected: fd.field_type(),
            });
        }

        let slot = self.slots[index]
            .get_or_insert_with(|| Value::Repeated(RepeatedValue::new(fd.field_type())));
        match slot {
            Value::Repeated(rv) => rv.push(value),
            // set() only stores Repeated values into repeated slots.
            _ => unreachable!("repeated slot holds a scalar value"),
        }
    }

    /// The `index`th element of the repeated field named `name`.
    ///
    /// Unknown names, non-repeated fields, unset slots, and out-of-bounds
    /// indexes all read as `None`.
    pub fn get_by_index(&self, name: &str, index: usize) -> Option<&Value> {
        let fd = self.desc.field_by_name(name)?;
        if !fd.is_repeated() {
            return None;
        }
        self.get(name)?.as_repeated()?.get(index)
    }

    /// Replaces the `index`th element of the repeated field named `name`.
    pub fn set_by_index(
        &mut self,
        name: &str,
        index: usize,
        value: impl Into<Value>,
    ) -> Result<(), MutationError> {
        let value = value.into();
        let Some(slot_index) = self.desc.index_by_name(name) else {
            debug!("set_by_index on unknown field '{name}'");
            return Err(MutationError::UnknownField);
        };
        let fd = &self.desc.fields()[slot_index];
        if !fd.is_repeated() {
            debug!("set_by_index on non-repeated field '{name}'");
            return Err(MutationError::NotRepeated);
        }
        match &mut self.slots[slot_index] {
            Some(Value::Repeated(rv)) => rv.set(index, value),
            Some(_) => unreachable!("repeated slot holds a scalar value"),
            None => Err(MutationError::IndexOutOfBounds { index, len: 0 }),
        }
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.desc, &other.desc) && self.slots == other.slots
    }
}
