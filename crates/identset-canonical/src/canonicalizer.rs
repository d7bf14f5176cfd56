//! Canonical byte encoding of [`Value`] trees.
//!
//! Strategies are tried in a fixed order and the first one that claims a
//! value writes it. Every value starts with a one-byte kind tag, so values of
//! different kinds never share an encoding; references and dynamic wrappers
//! are transparent and write no tag of their own. Integers, signed or not,
//! share one tag and are written as 16-byte big-endian two's complement, so
//! `1u8` and `1i64` are the same value. Strings, byte strings and every
//! container carry a `u64` length prefix so that adjacent values can never
//! run into each other. Map entries are sorted by the string form of their
//! key and record fields by name, so native iteration order never reaches the
//! hash.

use std::cmp::Ordering;

use sha2::digest::DynDigest;

use crate::errors::IdentityError;
use crate::value::{Record, Value};

/// Leading byte of every encoded value.
pub mod tag {
    /// `Value::Unit`.
    pub const UNIT: u8 = 0x00;
    /// `Value::Bool`.
    pub const BOOL: u8 = 0x01;
    /// `Value::Int` and `Value::Uint`.
    pub const INTEGER: u8 = 0x02;
    /// `Value::Float`.
    pub const FLOAT: u8 = 0x03;
    /// `Value::Str`.
    pub const STR: u8 = 0x04;
    /// `Value::Bytes`.
    pub const BYTES: u8 = 0x05;
    /// `Value::Seq`.
    pub const SEQ: u8 = 0x06;
    /// `Value::Map`.
    pub const MAP: u8 = 0x07;
    /// `Value::Record`.
    pub const RECORD: u8 = 0x08;
}

/// Destination for canonical bytes.
pub trait ByteSink {
    /// Appends bytes.
    fn write(&mut self, bytes: &[u8]);
}

impl ByteSink for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

/// Hash primitive accumulating canonical bytes.
pub struct HashState {
    inner: Box<dyn DynDigest>,
}

impl HashState {
    pub(crate) fn new(inner: Box<dyn DynDigest>) -> Self {
        Self { inner }
    }

    /// Consumes the state and returns the digest bytes.
    pub fn finalize(self) -> Vec<u8> {
        self.inner.finalize().into_vec()
    }
}

impl ByteSink for HashState {
    fn write(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }
}

/// Per-kind encoding strategies, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Strings, numbers, booleans, bytes and unit.
    Primitive,
    /// Dereferenced pointers.
    Reference,
    /// Unordered mappings.
    Map,
    /// Composite records.
    Record,
    /// Dynamically typed wrappers.
    Dynamic,
    /// Ordered sequences.
    Sequence,
    /// Everything else; always fails.
    Fallback,
}

/// Dispatch order.
pub const STRATEGIES: [Strategy; 7] = [
    Strategy::Primitive,
    Strategy::Reference,
    Strategy::Map,
    Strategy::Record,
    Strategy::Dynamic,
    Strategy::Sequence,
    Strategy::Fallback,
];

impl Strategy {
    /// Whether this strategy handles `value`.
    pub fn claims(self, value: &Value) -> bool {
        match self {
            Strategy::Primitive => matches!(
                value,
                Value::Unit
                    | Value::Bool(_)
                    | Value::Int(_)
                    | Value::Uint(_)
                    | Value::Float(_)
                    | Value::Str(_)
                    | Value::Bytes(_)
            ),
            Strategy::Reference => matches!(value, Value::Ref(_)),
            Strategy::Map => matches!(value, Value::Map(_)),
            Strategy::Record => matches!(value, Value::Record(_)),
            Strategy::Dynamic => matches!(value, Value::Dynamic(_)),
            Strategy::Sequence => matches!(value, Value::Seq(_)),
            Strategy::Fallback => true,
        }
    }

    /// First strategy in [`STRATEGIES`] that claims `value`.
    pub fn select(value: &Value) -> Strategy {
        STRATEGIES
            .into_iter()
            .find(|s| s.claims(value))
            .unwrap_or(Strategy::Fallback)
    }
}

/// Writes canonical bytes for values. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCanonicalizer;

impl ByteCanonicalizer {
    /// Writes the canonical bytes of `value` into `sink`.
    pub fn write(&self, value: &Value, sink: &mut dyn ByteSink) -> Result<(), IdentityError> {
        let strategy = Strategy::select(value);
        tracing::trace!(kind = value.kind(), ?strategy, "canonicalizing");
        match (strategy, value) {
            (Strategy::Primitive, _) => write_primitive(value, sink),
            (Strategy::Reference, Value::Ref(target)) => self.write(target, sink),
            (Strategy::Dynamic, Value::Dynamic(inner)) => self.write(inner, sink),
            (Strategy::Map, Value::Map(entries)) => self.write_map(entries, sink),
            (Strategy::Record, Value::Record(record)) => self.write_record(record, sink),
            (Strategy::Sequence, Value::Seq(items)) => {
                sink.write(&[tag::SEQ]);
                write_len(items.len(), sink);
                for item in items {
                    self.write(item, sink)?;
                }
                Ok(())
            }
            _ => Err(IdentityError::UnsupportedKind(value.kind())),
        }
    }

    /// Canonical bytes of `value` as a buffer.
    pub fn to_bytes(&self, value: &Value) -> Result<Vec<u8>, IdentityError> {
        let mut buf = Vec::new();
        self.write(value, &mut buf)?;
        Ok(buf)
    }

    fn write_map(
        &self,
        entries: &[(Value, Value)],
        sink: &mut dyn ByteSink,
    ) -> Result<(), IdentityError> {
        let mut keyed = entries
            .iter()
            .map(|(key, value)| {
                let bytes = self.to_bytes(key)?;
                Ok((self.key_string(key, &bytes), bytes, value))
            })
            .collect::<Result<Vec<_>, IdentityError>>()?;
        keyed.sort_by(|a, b| match a.0.cmp(&b.0) {
            Ordering::Equal => a.1.cmp(&b.1),
            other => other,
        });

        sink.write(&[tag::MAP]);
        write_len(keyed.len(), sink);
        for (_, key_bytes, value) in keyed {
            sink.write(&key_bytes);
            self.write(value, sink)?;
        }
        Ok(())
    }

    fn write_record(&self, record: &Record, sink: &mut dyn ByteSink) -> Result<(), IdentityError> {
        let mut fields: Vec<&(&'static str, Value)> = record.fields.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));

        sink.write(&[tag::RECORD]);
        write_len(fields.len(), sink);
        for (name, value) in fields {
            write_bare_str(name, sink);
            self.write(value, sink)?;
        }
        Ok(())
    }

    /// String form used to order map keys.
    fn key_string(&self, key: &Value, canonical: &[u8]) -> String {
        match key.resolved() {
            Value::Str(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Uint(u) => u.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Unit => String::new(),
            _ => hex::encode(canonical),
        }
    }
}

fn write_len(len: usize, sink: &mut dyn ByteSink) {
    sink.write(&(len as u64).to_be_bytes());
}

/// Length-prefixed string without a kind tag; record field names.
fn write_bare_str(s: &str, sink: &mut dyn ByteSink) {
    write_len(s.len(), sink);
    sink.write(s.as_bytes());
}

fn write_integer(i: i128, sink: &mut dyn ByteSink) {
    sink.write(&[tag::INTEGER]);
    sink.write(&i.to_be_bytes());
}

fn write_primitive(value: &Value, sink: &mut dyn ByteSink) -> Result<(), IdentityError> {
    match value {
        Value::Unit => sink.write(&[tag::UNIT]),
        Value::Bool(b) => sink.write(&[tag::BOOL, u8::from(*b)]),
        Value::Int(i) => write_integer(i128::from(*i), sink),
        Value::Uint(u) => write_integer(i128::from(*u), sink),
        Value::Float(f) => {
            sink.write(&[tag::FLOAT]);
            sink.write(&canonical_float(*f).to_be_bytes());
        }
        Value::Str(s) => {
            sink.write(&[tag::STR]);
            write_bare_str(s, sink);
        }
        Value::Bytes(b) => {
            sink.write(&[tag::BYTES]);
            write_len(b.len(), sink);
            sink.write(b);
        }
        other => return Err(IdentityError::UnsupportedKind(other.kind())),
    }
    Ok(())
}

/// Folds `-0.0` into `0.0` and every NaN into one bit pattern.
fn canonical_float(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(value: &Value) -> Vec<u8> {
        ByteCanonicalizer.to_bytes(value).unwrap()
    }

    #[test]
    fn dispatch_order() {
        assert_eq!(Strategy::select(&Value::Int(1)), Strategy::Primitive);
        assert_eq!(
            Strategy::select(&Value::Ref(Box::new(Value::Unit))),
            Strategy::Reference
        );
        assert_eq!(Strategy::select(&Value::Map(vec![])), Strategy::Map);
        assert_eq!(Strategy::select(&Value::Seq(vec![])), Strategy::Sequence);
        assert_eq!(Strategy::select(&Value::Opaque("fn")), Strategy::Fallback);
    }

    #[test]
    fn primitives_are_tagged_big_endian() {
        let mut one = vec![tag::INTEGER];
        one.extend_from_slice(&1i128.to_be_bytes());
        assert_eq!(bytes(&Value::Int(1)), one);
        assert_eq!(bytes(&Value::Uint(1)), one);
        assert_eq!(bytes(&Value::Int(-1))[1..], [0xff; 16]);
        assert_eq!(bytes(&Value::Bool(true)), vec![tag::BOOL, 1]);
        assert_eq!(bytes(&Value::Unit), vec![tag::UNIT]);
        assert_eq!(
            bytes(&Value::Str("ab".into())),
            vec![tag::STR, 0, 0, 0, 0, 0, 0, 0, 2, b'a', b'b']
        );
    }

    #[test]
    fn empty_values_of_different_kinds_differ() {
        let empties = [
            Value::Unit,
            Value::Bool(false),
            Value::Int(0),
            Value::Float(0.0),
            Value::Str(String::new()),
            Value::Bytes(Vec::new()),
            Value::Seq(Vec::new()),
            Value::Map(Vec::new()),
            Value::Record(Record::shape("Empty")),
        ];
        for (i, a) in empties.iter().enumerate() {
            for b in &empties[i + 1..] {
                assert_ne!(bytes(a), bytes(b), "{a:?} and {b:?} share an encoding");
            }
        }
    }

    #[test]
    fn text_and_bytes_differ() {
        assert_ne!(
            bytes(&Value::Str("ab".into())),
            bytes(&Value::Bytes(b"ab".to_vec()))
        );
    }

    #[test]
    fn references_are_transparent() {
        let inner = Value::Str("x".into());
        let wrapped = Value::Ref(Box::new(Value::Dynamic(Box::new(inner.clone()))));
        assert_eq!(bytes(&wrapped), bytes(&inner));
    }

    #[test]
    fn map_order_is_irrelevant() {
        let a = Value::Map(vec![
            (Value::Str("b".into()), Value::Int(2)),
            (Value::Str("a".into()), Value::Int(1)),
        ]);
        let b = Value::Map(vec![
            (Value::Str("a".into()), Value::Int(1)),
            (Value::Str("b".into()), Value::Int(2)),
        ]);
        assert_eq!(bytes(&a), bytes(&b));
    }

    #[test]
    fn map_keys_contribute() {
        let a = Value::Map(vec![(Value::Str("a".into()), Value::Int(1))]);
        let b = Value::Map(vec![(Value::Str("b".into()), Value::Int(1))]);
        assert_ne!(bytes(&a), bytes(&b));
    }

    #[test]
    fn sequence_order_matters_and_is_framed() {
        let ab = Value::Seq(vec![Value::Str("a".into()), Value::Str("b".into())]);
        let ba = Value::Seq(vec![Value::Str("b".into()), Value::Str("a".into())]);
        assert_ne!(bytes(&ab), bytes(&ba));

        let split = Value::Seq(vec![Value::Str("ab".into()), Value::Str("c".into())]);
        let joined = Value::Seq(vec![Value::Str("a".into()), Value::Str("bc".into())]);
        assert_ne!(bytes(&split), bytes(&joined));
    }

    #[test]
    fn record_fields_sorted_by_name() {
        let a = Value::Record(Record {
            name: "P",
            fields: vec![("b", Value::Int(2)), ("a", Value::Int(1))],
        });
        let b = Value::Record(Record {
            name: "Q",
            fields: vec![("a", Value::Int(1)), ("b", Value::Int(2))],
        });
        assert_eq!(bytes(&a), bytes(&b));
    }

    #[test]
    fn float_zero_and_nan_fold() {
        assert_eq!(bytes(&Value::Float(-0.0)), bytes(&Value::Float(0.0)));
        assert_eq!(
            bytes(&Value::Float(f64::NAN)),
            bytes(&Value::Float(-f64::NAN))
        );
    }

    #[test]
    fn opaque_is_unsupported() {
        let nested = Value::Seq(vec![Value::Int(1), Value::Opaque("function")]);
        assert_eq!(
            ByteCanonicalizer.to_bytes(&nested).unwrap_err(),
            IdentityError::UnsupportedKind("function")
        );
    }
}
