//! Composite records: field-by-field lowering through the field filter.

use crate::canonical::Canonical;
use crate::errors::IdentityError;
use crate::filter::{FieldFilter, FieldMeta, FieldTag};
use crate::value::{Record, Value};

/// Accumulates the admitted fields of one record.
///
/// Each field's annotation is parsed and the filter consulted *before* the
/// field is evaluated, so excluded fields never contribute anything, not even
/// an error.
pub struct RecordBuilder<'f> {
    name: &'static str,
    filter: &'f dyn FieldFilter,
    fields: Vec<(&'static str, Value)>,
}

impl<'f> RecordBuilder<'f> {
    /// Starts a record of type `name`.
    pub fn new(name: &'static str, filter: &'f dyn FieldFilter) -> Self {
        Self {
            name,
            filter,
            fields: Vec::new(),
        }
    }

    /// Adds one field, honouring its annotation.
    pub fn field<T: Canonical>(
        &mut self,
        name: &'static str,
        annotation: Option<&str>,
        value: &T,
    ) -> Result<&mut Self, IdentityError> {
        let tag = match annotation {
            Some(annotation) => FieldTag::parse(name, annotation)?,
            None => FieldTag::default(),
        };
        let meta = FieldMeta {
            record: self.name,
            name,
            tag: &tag,
        };
        if !self.filter.include(&meta, value)? {
            tracing::trace!(record = self.name, field = name, "field excluded");
            return Ok(self);
        }

        let lowered = match tag.method() {
            Some(method) => value.project(method, self.filter).ok_or_else(|| {
                IdentityError::configuration(
                    name,
                    format!("method:{}", method),
                    format!("type has no behaviour named `{}`", method),
                )
            })??,
            None => value.to_value(self.filter)?,
        };
        self.fields.push((name, lowered));
        Ok(self)
    }

    /// Finishes the record.
    pub fn finish(self) -> Value {
        Value::Record(Record {
            name: self.name,
            fields: self.fields,
        })
    }
}

/// Declares a struct and derives its [`Canonical`](crate::Canonical) and
/// [`ZeroValue`](crate::ZeroValue) implementations.
///
/// A field may carry an annotation after its type: `=> "-"` excludes it from
/// the digest, `=> "method:lowercase"` hashes a named projection instead of
/// the raw value.
///
/// ```rust
/// use identset_canonical::{identity_hex, identity_record};
///
/// identity_record! {
///     #[derive(Debug, Clone)]
///     pub struct Account {
///         pub email: String => "method:lowercase",
///         pub plan: String,
///         pub last_login: u64 => "-",
///     }
/// }
///
/// let a = Account { email: "A@x.io".into(), plan: "pro".into(), last_login: 1 };
/// let b = Account { email: "a@x.io".into(), plan: "pro".into(), last_login: 2 };
/// assert_eq!(identity_hex(&a)?, identity_hex(&b)?);
/// # Ok::<(), identset_canonical::IdentityError>(())
/// ```
#[macro_export]
macro_rules! identity_record {
    (@tag) => {
        ::core::option::Option::None
    };
    (@tag $tag:literal) => {
        ::core::option::Option::Some($tag)
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty $(=> $tag:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::Canonical for $name {
            fn to_value(
                &self,
                filter: &dyn $crate::FieldFilter,
            ) -> ::core::result::Result<$crate::Value, $crate::IdentityError> {
                #[allow(unused_mut)]
                let mut record = $crate::RecordBuilder::new(::core::stringify!($name), filter);
                $(
                    record.field(
                        ::core::stringify!($field),
                        $crate::identity_record!(@tag $($tag)?),
                        &self.$field,
                    )?;
                )*
                ::core::result::Result::Ok(record.finish())
            }
        }

        impl $crate::ZeroValue for $name {
            fn zero_value() -> $crate::Value {
                $crate::Value::Record($crate::Record::shape(::core::stringify!($name)))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::ZeroValue;
    use crate::filter::{IncludeAll, TagFilter};

    identity_record! {
        #[derive(Debug, Clone, Default)]
        struct Row {
            id: u32,
            label: String => "method:trim",
            cache: Vec<u8> => "-",
        }
    }

    identity_record! {
        struct Broken {
            name: String => "method:reverse",
        }
    }

    #[test]
    fn excluded_fields_are_absent_from_record() {
        let row = Row {
            id: 1,
            label: " a ".into(),
            cache: vec![9],
        };
        let Value::Record(record) = row.to_value(&TagFilter).unwrap() else {
            panic!("expected record");
        };
        assert_eq!(record.name, "Row");
        assert_eq!(record.get("id"), Some(&Value::Uint(1)));
        assert_eq!(record.get("label"), Some(&Value::Str("a".into())));
        assert_eq!(record.get("cache"), None);
    }

    #[test]
    fn include_all_keeps_excluded_fields() {
        let Value::Record(record) = Row::default().to_value(&IncludeAll).unwrap() else {
            panic!("expected record");
        };
        assert_eq!(record.fields.len(), 3);
    }

    #[test]
    fn unknown_method_is_configuration_error() {
        let err = Broken {
            name: "x".into(),
        }
        .to_value(&TagFilter)
        .unwrap_err();
        match err {
            IdentityError::Configuration { field, directive, .. } => {
                assert_eq!(field, "name");
                assert_eq!(directive, "method:reverse");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn zero_value_is_empty_shape() {
        assert_eq!(Row::zero_value(), Value::Record(Record::shape("Row")));
    }
}
