//! Lowering of arbitrary `Serialize` types.
//!
//! Serde's data model stands in for runtime reflection: structs become
//! records (fields skipped by `#[serde(skip)]` never reach the digest, and
//! struct fields still pass through the field filter), enums take the
//! externally tagged shape inside a `Dynamic` wrapper, and `Option` behaves
//! as a reference whose `None` is `Unit`.

use serde::ser::{self, Serialize};

use crate::canonical::{Canonical, ZeroValue};
use crate::errors::IdentityError;
use crate::filter::{FieldFilter, FieldMeta, FieldTag};
use crate::value::{Record, Value};

/// Lowers any `Serialize` value.
pub fn to_value<T: Serialize + ?Sized>(
    value: &T,
    filter: &dyn FieldFilter,
) -> Result<Value, IdentityError> {
    value.serialize(ValueSerializer { filter })
}

/// Adapter giving any `Serialize` type a [`Canonical`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Serde<T>(
    /// The wrapped value.
    pub T,
);

impl<T: Serialize> Canonical for Serde<T> {
    fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        to_value(&self.0, filter)
    }
}

impl<T> ZeroValue for Serde<T> {
    fn zero_value() -> Value {
        Value::Unit
    }
}

#[derive(Clone, Copy)]
struct ValueSerializer<'f> {
    filter: &'f dyn FieldFilter,
}

fn variant(name: &'static str, inner: Value) -> Value {
    Value::Dynamic(Box::new(Value::Map(vec![(Value::Str(name.to_string()), inner)])))
}

impl<'f> ser::Serializer for ValueSerializer<'f> {
    type Ok = Value;
    type Error = IdentityError;
    type SerializeSeq = SeqBuilder<'f>;
    type SerializeTuple = SeqBuilder<'f>;
    type SerializeTupleStruct = SeqBuilder<'f>;
    type SerializeTupleVariant = SeqBuilder<'f>;
    type SerializeMap = MapBuilder<'f>;
    type SerializeStruct = StructBuilder<'f>;
    type SerializeStructVariant = StructBuilder<'f>;

    fn serialize_bool(self, v: bool) -> Result<Value, IdentityError> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, IdentityError> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, IdentityError> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, IdentityError> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, IdentityError> {
        Ok(Value::Int(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, IdentityError> {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| IdentityError::UnsupportedKind("i128"))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, IdentityError> {
        Ok(Value::Uint(u64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, IdentityError> {
        Ok(Value::Uint(u64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, IdentityError> {
        Ok(Value::Uint(u64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, IdentityError> {
        Ok(Value::Uint(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value, IdentityError> {
        u64::try_from(v)
            .map(Value::Uint)
            .map_err(|_| IdentityError::UnsupportedKind("u128"))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, IdentityError> {
        Ok(Value::Float(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, IdentityError> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, IdentityError> {
        Ok(Value::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, IdentityError> {
        Ok(Value::Str(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, IdentityError> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value, IdentityError> {
        Ok(Value::Unit)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, IdentityError> {
        Ok(Value::Ref(Box::new(value.serialize(self)?)))
    }

    fn serialize_unit(self) -> Result<Value, IdentityError> {
        Ok(Value::Unit)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value, IdentityError> {
        Ok(Value::Record(Record::shape(name)))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Value, IdentityError> {
        Ok(Value::Dynamic(Box::new(Value::Str(variant.to_string()))))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, IdentityError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        name: &'static str,
        value: &T,
    ) -> Result<Value, IdentityError> {
        Ok(variant(name, value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder<'f>, IdentityError> {
        Ok(SeqBuilder::new(self, None, len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder<'f>, IdentityError> {
        Ok(SeqBuilder::new(self, None, len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder<'f>, IdentityError> {
        Ok(SeqBuilder::new(self, None, len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder<'f>, IdentityError> {
        Ok(SeqBuilder::new(self, Some(name), len))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder<'f>, IdentityError> {
        Ok(MapBuilder {
            ser: self,
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending: None,
        })
    }

    fn serialize_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<StructBuilder<'f>, IdentityError> {
        Ok(StructBuilder::new(self, name, None))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<StructBuilder<'f>, IdentityError> {
        Ok(StructBuilder::new(self, name, Some(variant)))
    }
}

struct SeqBuilder<'f> {
    ser: ValueSerializer<'f>,
    variant: Option<&'static str>,
    items: Vec<Value>,
}

impl<'f> SeqBuilder<'f> {
    fn new(ser: ValueSerializer<'f>, variant: Option<&'static str>, len: usize) -> Self {
        Self {
            ser,
            variant,
            items: Vec::with_capacity(len),
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), IdentityError> {
        self.items.push(value.serialize(self.ser)?);
        Ok(())
    }

    fn finish(self) -> Value {
        let seq = Value::Seq(self.items);
        match self.variant {
            Some(name) => variant(name, seq),
            None => seq,
        }
    }
}

impl ser::SerializeSeq for SeqBuilder<'_> {
    type Ok = Value;
    type Error = IdentityError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), IdentityError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, IdentityError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SeqBuilder<'_> {
    type Ok = Value;
    type Error = IdentityError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), IdentityError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, IdentityError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SeqBuilder<'_> {
    type Ok = Value;
    type Error = IdentityError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), IdentityError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, IdentityError> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SeqBuilder<'_> {
    type Ok = Value;
    type Error = IdentityError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), IdentityError> {
        self.push(value)
    }

    fn end(self) -> Result<Value, IdentityError> {
        Ok(self.finish())
    }
}

struct MapBuilder<'f> {
    ser: ValueSerializer<'f>,
    entries: Vec<(Value, Value)>,
    pending: Option<Value>,
}

impl ser::SerializeMap for MapBuilder<'_> {
    type Ok = Value;
    type Error = IdentityError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), IdentityError> {
        self.pending = Some(key.serialize(self.ser)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), IdentityError> {
        let key = self
            .pending
            .take()
            .ok_or_else(|| IdentityError::Serialization("map value without key".into()))?;
        self.entries.push((key, value.serialize(self.ser)?));
        Ok(())
    }

    fn end(self) -> Result<Value, IdentityError> {
        Ok(Value::Map(self.entries))
    }
}

struct StructBuilder<'f> {
    ser: ValueSerializer<'f>,
    variant: Option<&'static str>,
    record: Record,
}

impl<'f> StructBuilder<'f> {
    fn new(ser: ValueSerializer<'f>, name: &'static str, variant: Option<&'static str>) -> Self {
        Self {
            ser,
            variant,
            record: Record::shape(name),
        }
    }

    fn push<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), IdentityError> {
        let tag = FieldTag::default();
        let meta = FieldMeta {
            record: self.record.name,
            name: key,
            tag: &tag,
        };
        if self.ser.filter.include(&meta, &Serde(value))? {
            self.record.fields.push((key, value.serialize(self.ser)?));
        }
        Ok(())
    }

    fn finish(self) -> Value {
        let record = Value::Record(self.record);
        match self.variant {
            Some(name) => variant(name, record),
            None => record,
        }
    }
}

impl ser::SerializeStruct for StructBuilder<'_> {
    type Ok = Value;
    type Error = IdentityError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), IdentityError> {
        self.push(key, value)
    }

    fn end(self) -> Result<Value, IdentityError> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for StructBuilder<'_> {
    type Ok = Value;
    type Error = IdentityError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), IdentityError> {
        self.push(key, value)
    }

    fn end(self) -> Result<Value, IdentityError> {
        Ok(self.finish())
    }
}
