//! The capability every identity-bearing type implements.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use crate::errors::IdentityError;
use crate::filter::{FieldFilter, FieldMeta, FieldTag, JSON_OBJECT};
use crate::value::Value;

/// Lowers a value into its canonical [`Value`] shape.
///
/// Records consult `filter` for every field before evaluating it; other
/// types pass it through to their children.
pub trait Canonical {
    /// Builds the canonical shape of `self`.
    fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError>;

    /// Named projection used by `method:<name>` field annotations.
    ///
    /// Returns `None` when the type has no behaviour of that name, which the
    /// record builder reports as a configuration error.
    fn project(
        &self,
        method: &str,
        filter: &dyn FieldFilter,
    ) -> Option<Result<Value, IdentityError>> {
        let _ = (method, filter);
        None
    }
}

/// Shape written in place of an absent reference (`Option::None`) to a type.
pub trait ZeroValue {
    /// Zero value of the type; records use their empty shape.
    fn zero_value() -> Value;
}

macro_rules! primitive {
    ($variant:ident as $wide:ty, $zero:expr; $($t:ty),*) => {
        $(
            impl Canonical for $t {
                fn to_value(&self, _filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
                    Ok(Value::$variant(*self as $wide))
                }
            }

            impl ZeroValue for $t {
                fn zero_value() -> Value {
                    Value::$variant($zero)
                }
            }
        )*
    };
}

primitive!(Int as i64, 0; i8, i16, i32, i64, isize);
primitive!(Uint as u64, 0; u8, u16, u32, u64, usize);
primitive!(Float as f64, 0.0; f32, f64);

impl Canonical for bool {
    fn to_value(&self, _filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        Ok(Value::Bool(*self))
    }
}

impl ZeroValue for bool {
    fn zero_value() -> Value {
        Value::Bool(false)
    }
}

impl Canonical for char {
    fn to_value(&self, _filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        Ok(Value::Str(self.to_string()))
    }
}

impl ZeroValue for char {
    fn zero_value() -> Value {
        Value::Str("\0".to_string())
    }
}

impl Canonical for () {
    fn to_value(&self, _filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        Ok(Value::Unit)
    }
}

impl ZeroValue for () {
    fn zero_value() -> Value {
        Value::Unit
    }
}

impl Canonical for str {
    fn to_value(&self, _filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        Ok(Value::Str(self.to_string()))
    }

    fn project(
        &self,
        method: &str,
        _filter: &dyn FieldFilter,
    ) -> Option<Result<Value, IdentityError>> {
        match method {
            "lowercase" => Some(Ok(Value::Str(self.to_lowercase()))),
            "trim" => Some(Ok(Value::Str(self.trim().to_string()))),
            _ => None,
        }
    }
}

impl ZeroValue for str {
    fn zero_value() -> Value {
        Value::Str(String::new())
    }
}

impl Canonical for String {
    fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        self.as_str().to_value(filter)
    }

    fn project(
        &self,
        method: &str,
        filter: &dyn FieldFilter,
    ) -> Option<Result<Value, IdentityError>> {
        self.as_str().project(method, filter)
    }
}

impl ZeroValue for String {
    fn zero_value() -> Value {
        <str as ZeroValue>::zero_value()
    }
}

fn sequence<'a, T, I>(items: I, filter: &dyn FieldFilter) -> Result<Value, IdentityError>
where
    T: Canonical + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .map(|item| item.to_value(filter))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Seq)
}

impl<T: Canonical> Canonical for [T] {
    fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        sequence(self, filter)
    }
}

impl<T> ZeroValue for [T] {
    fn zero_value() -> Value {
        Value::Seq(Vec::new())
    }
}

impl<T: Canonical, const N: usize> Canonical for [T; N] {
    fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        sequence(self, filter)
    }
}

impl<T: ZeroValue, const N: usize> ZeroValue for [T; N] {
    fn zero_value() -> Value {
        Value::Seq((0..N).map(|_| T::zero_value()).collect())
    }
}

impl<T: Canonical> Canonical for Vec<T> {
    fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        sequence(self, filter)
    }
}

impl<T> ZeroValue for Vec<T> {
    fn zero_value() -> Value {
        Value::Seq(Vec::new())
    }
}

impl<T: Canonical> Canonical for VecDeque<T> {
    fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        sequence(self, filter)
    }
}

impl<T> ZeroValue for VecDeque<T> {
    fn zero_value() -> Value {
        Value::Seq(Vec::new())
    }
}

macro_rules! tuple {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: Canonical),+> Canonical for ($($name,)+) {
            fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
                Ok(Value::Seq(vec![$(self.$idx.to_value(filter)?),+]))
            }
        }

        impl<$($name: ZeroValue),+> ZeroValue for ($($name,)+) {
            fn zero_value() -> Value {
                Value::Seq(vec![$($name::zero_value()),+])
            }
        }
    };
}

tuple!(A.0);
tuple!(A.0, B.1);
tuple!(A.0, B.1, C.2);
tuple!(A.0, B.1, C.2, D.3);

fn mapping<'a, K, V, I>(entries: I, filter: &dyn FieldFilter) -> Result<Value, IdentityError>
where
    K: Canonical + 'a,
    V: Canonical + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)>,
{
    entries
        .into_iter()
        .map(|(k, v)| Ok((k.to_value(filter)?, v.to_value(filter)?)))
        .collect::<Result<Vec<_>, IdentityError>>()
        .map(Value::Map)
}

fn membership<'a, T, I>(members: I, filter: &dyn FieldFilter) -> Result<Value, IdentityError>
where
    T: Canonical + 'a,
    I: IntoIterator<Item = &'a T>,
{
    members
        .into_iter()
        .map(|m| Ok((m.to_value(filter)?, Value::Unit)))
        .collect::<Result<Vec<_>, IdentityError>>()
        .map(Value::Map)
}

impl<K: Canonical, V: Canonical, S> Canonical for HashMap<K, V, S> {
    fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        mapping(self, filter)
    }
}

impl<K, V, S> ZeroValue for HashMap<K, V, S> {
    fn zero_value() -> Value {
        Value::Map(Vec::new())
    }
}

impl<K: Canonical, V: Canonical> Canonical for BTreeMap<K, V> {
    fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        mapping(self, filter)
    }
}

impl<K, V> ZeroValue for BTreeMap<K, V> {
    fn zero_value() -> Value {
        Value::Map(Vec::new())
    }
}

impl<T: Canonical, S> Canonical for HashSet<T, S> {
    fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        membership(self, filter)
    }
}

impl<T, S> ZeroValue for HashSet<T, S> {
    fn zero_value() -> Value {
        Value::Map(Vec::new())
    }
}

impl<T: Canonical> Canonical for BTreeSet<T> {
    fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        membership(self, filter)
    }
}

impl<T> ZeroValue for BTreeSet<T> {
    fn zero_value() -> Value {
        Value::Map(Vec::new())
    }
}

/// `Option` is a nullable reference: `None` resolves to the zero value of
/// the pointee, so `None` and `Some(zero)` share a digest.
impl<T: Canonical + ZeroValue> Canonical for Option<T> {
    fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        let target = match self {
            Some(inner) => inner.to_value(filter)?,
            None => T::zero_value(),
        };
        Ok(Value::Ref(Box::new(target)))
    }

    fn project(
        &self,
        method: &str,
        filter: &dyn FieldFilter,
    ) -> Option<Result<Value, IdentityError>> {
        self.as_ref()?.project(method, filter)
    }
}

impl<T: ZeroValue> ZeroValue for Option<T> {
    fn zero_value() -> Value {
        T::zero_value()
    }
}

macro_rules! pointer {
    ($($ptr:ident),*) => {
        $(
            impl<T: Canonical + ?Sized> Canonical for $ptr<T> {
                fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
                    Ok(Value::Ref(Box::new((**self).to_value(filter)?)))
                }

                fn project(
                    &self,
                    method: &str,
                    filter: &dyn FieldFilter,
                ) -> Option<Result<Value, IdentityError>> {
                    (**self).project(method, filter)
                }
            }

            impl<T: ZeroValue + ?Sized> ZeroValue for $ptr<T> {
                fn zero_value() -> Value {
                    T::zero_value()
                }
            }
        )*
    };
}

pointer!(Box, Rc, Arc);

impl<T: Canonical + ?Sized> Canonical for &T {
    fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        Ok(Value::Ref(Box::new((**self).to_value(filter)?)))
    }

    fn project(
        &self,
        method: &str,
        filter: &dyn FieldFilter,
    ) -> Option<Result<Value, IdentityError>> {
        (**self).project(method, filter)
    }
}

impl<T: ZeroValue + ?Sized> ZeroValue for &T {
    fn zero_value() -> Value {
        T::zero_value()
    }
}

/// An absent trait object has no concrete type to take a zero value from.
impl ZeroValue for dyn Canonical + '_ {
    fn zero_value() -> Value {
        Value::Unit
    }
}

impl Canonical for Value {
    fn to_value(&self, _filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        Ok(self.clone())
    }
}

impl ZeroValue for Value {
    fn zero_value() -> Value {
        Value::Unit
    }
}

impl Canonical for serde_json::Value {
    fn to_value(&self, filter: &dyn FieldFilter) -> Result<Value, IdentityError> {
        use serde_json::Value as Json;

        let inner = match self {
            Json::Null => Value::Unit,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    return Err(IdentityError::UnsupportedKind("json number"));
                }
            }
            Json::String(s) => Value::Str(s.clone()),
            Json::Array(items) => sequence(items, filter)?,
            Json::Object(map) => object(map, filter)?,
        };
        Ok(Value::Dynamic(Box::new(inner)))
    }
}

/// Object members pass through the field filter by key, like record fields.
fn object(
    map: &serde_json::Map<String, serde_json::Value>,
    filter: &dyn FieldFilter,
) -> Result<Value, IdentityError> {
    let tag = FieldTag::default();
    let mut entries = Vec::with_capacity(map.len());
    for (key, member) in map {
        let meta = FieldMeta {
            record: JSON_OBJECT,
            name: key,
            tag: &tag,
        };
        if !filter.include(&meta, member)? {
            tracing::trace!(field = %key, "object member excluded");
            continue;
        }
        entries.push((Value::Str(key.clone()), member.to_value(filter)?));
    }
    Ok(Value::Map(entries))
}

impl ZeroValue for serde_json::Value {
    fn zero_value() -> Value {
        Value::Unit
    }
}
