//! Closed variant model that every hashable value is lowered into.

/// Canonical shape of a value, independent of its Rust type.
///
/// Two values whose `Value` trees are equal always produce the same
/// digest. `Map` entries and `Record` fields are stored unordered; the
/// canonicalizer sorts them when writing bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The empty value (`()`, JSON `null`, serde `None`).
    Unit,
    /// Boolean.
    Bool(bool),
    /// Signed integer, widened to 64 bits.
    Int(i64),
    /// Unsigned integer, widened to 64 bits.
    Uint(u64),
    /// Floating point number, widened to 64 bits.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Opaque byte string.
    Bytes(Vec<u8>),
    /// Ordered sequence; element order is significant.
    Seq(Vec<Value>),
    /// Unordered key/value mapping.
    Map(Vec<(Value, Value)>),
    /// Composite record holding the fields admitted by the field filter.
    Record(Record),
    /// Dereferenced reference or pointer.
    Ref(Box<Value>),
    /// Dynamically typed wrapper (trait object, variant, JSON value).
    Dynamic(Box<Value>),
    /// A kind with no canonical byte form.
    Opaque(&'static str),
}

impl Value {
    /// Short name of the variant, used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::Ref(_) => "reference",
            Value::Dynamic(_) => "dynamic",
            Value::Opaque(kind) => kind,
        }
    }

    /// Follows `Ref` and `Dynamic` wrappers down to the stored value.
    pub fn resolved(&self) -> &Value {
        let mut current = self;
        while let Value::Ref(inner) | Value::Dynamic(inner) = current {
            current = inner;
        }
        current
    }
}

/// Composite record: a type name plus its admitted fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Type name, kept for diagnostics; it does not enter the digest.
    pub name: &'static str,
    /// Admitted fields, in declaration order.
    pub fields: Vec<(&'static str, Value)>,
}

impl Record {
    /// The empty shape of a record type, used for absent references.
    pub fn shape(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Looks up an admitted field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_strips_wrappers() {
        let value = Value::Ref(Box::new(Value::Dynamic(Box::new(Value::Int(7)))));
        assert_eq!(value.resolved(), &Value::Int(7));
        assert_eq!(value.kind(), "reference");
    }

    #[test]
    fn opaque_kind_names_itself() {
        assert_eq!(Value::Opaque("function").kind(), "function");
    }
}
