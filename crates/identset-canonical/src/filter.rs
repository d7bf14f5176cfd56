//! Field-level inclusion decisions for composite records.
//!
//! A field annotation is a whitespace-separated list of `key:value`
//! directives, or the single literal `-` which excludes the field. The only
//! recognised key is `method`, which replaces the field's value with a named
//! projection provided by the field's type (see [`Canonical::project`]).
//! Anything else is a configuration error.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::canonical::Canonical;
use crate::errors::IdentityError;

/// Annotation literal that excludes a field from the digest.
pub const EXCLUDE: &str = "-";

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*):([A-Za-z_][A-Za-z0-9_]*)$").expect("invalid regex")
});

/// Parsed field annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTag {
    excluded: bool,
    method: Option<String>,
}

impl FieldTag {
    /// Parses the annotation attached to `field`.
    pub fn parse(field: &str, annotation: &str) -> Result<Self, IdentityError> {
        let annotation = annotation.trim();
        if annotation.is_empty() {
            return Ok(Self::default());
        }
        if annotation == EXCLUDE {
            return Ok(Self {
                excluded: true,
                method: None,
            });
        }

        let mut tag = Self::default();
        for token in annotation.split_whitespace() {
            let caps = DIRECTIVE.captures(token).ok_or_else(|| {
                IdentityError::configuration(field, token, "expected `key:value`")
            })?;
            match &caps[1] {
                "method" => {
                    if tag.method.is_some() {
                        return Err(IdentityError::configuration(
                            field,
                            token,
                            "duplicate `method` directive",
                        ));
                    }
                    tag.method = Some(caps[2].to_string());
                }
                other => {
                    return Err(IdentityError::configuration(
                        field,
                        token,
                        format!("unknown directive `{}`", other),
                    ))
                }
            }
        }
        Ok(tag)
    }

    /// True when the annotation is the exclusion marker.
    pub fn excluded(&self) -> bool {
        self.excluded
    }

    /// Projection named by a `method:` directive, if any.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }
}

/// Record name reported for the members of a JSON object.
pub const JSON_OBJECT: &str = "object";

/// Metadata handed to a [`FieldFilter`] for one record field or JSON object member.
#[derive(Debug, Clone, Copy)]
pub struct FieldMeta<'a> {
    /// Record type name, [`JSON_OBJECT`] for JSON object members.
    pub record: &'static str,
    /// Field name or object key.
    pub name: &'a str,
    /// Parsed annotation.
    pub tag: &'a FieldTag,
}

/// Decides, per record field, whether the field enters the digest.
///
/// Members of a `serde_json` object are offered too, keyed by name with an
/// empty annotation, so name-based exclusions reach dynamic documents.
pub trait FieldFilter: Send + Sync {
    /// Returns `Ok(true)` if the field should be canonicalized.
    fn include(&self, field: &FieldMeta<'_>, value: &dyn Canonical) -> Result<bool, IdentityError>;
}

/// Default filter: honours the `-` exclusion marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagFilter;

impl FieldFilter for TagFilter {
    fn include(&self, field: &FieldMeta<'_>, _value: &dyn Canonical) -> Result<bool, IdentityError> {
        Ok(!field.tag.excluded())
    }
}

/// Admits every field, including those marked `-`.
///
/// A debugging override selected by `IdentityConfig::honor_exclusions =
/// false`, for inspecting what an excluded field would contribute. Digests
/// computed with it are not comparable with those of the default
/// [`TagFilter`]. Annotation syntax is still validated.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeAll;

impl FieldFilter for IncludeAll {
    fn include(&self, _field: &FieldMeta<'_>, _value: &dyn Canonical) -> Result<bool, IdentityError> {
        Ok(true)
    }
}

/// Honours `-` and additionally drops the named fields from every record.
#[derive(Debug, Clone, Default)]
pub struct ExcludeFields {
    names: BTreeSet<String>,
}

impl ExcludeFields {
    /// Creates a filter excluding `names`.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl FieldFilter for ExcludeFields {
    fn include(&self, field: &FieldMeta<'_>, _value: &dyn Canonical) -> Result<bool, IdentityError> {
        Ok(!field.tag.excluded() && !self.names.contains(field.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_exclude() {
        assert_eq!(FieldTag::parse("f", "").unwrap(), FieldTag::default());
        assert!(FieldTag::parse("f", "-").unwrap().excluded());
        assert!(FieldTag::parse("f", "  -  ").unwrap().excluded());
    }

    #[test]
    fn method_directive() {
        let tag = FieldTag::parse("email", "method:lowercase").unwrap();
        assert!(!tag.excluded());
        assert_eq!(tag.method(), Some("lowercase"));
    }

    #[test]
    fn malformed_directives_are_configuration_errors() {
        for bad in ["method", "method:", "-- ", "- method:trim", "colour:red", "method:a method:b"] {
            let err = FieldTag::parse("f", bad).unwrap_err();
            assert!(
                matches!(err, IdentityError::Configuration { .. }),
                "{bad:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn exclude_fields_filter() {
        let filter = ExcludeFields::new(["updated_at"]);
        let tag = FieldTag::default();
        let meta = FieldMeta {
            record: "Row",
            name: "updated_at",
            tag: &tag,
        };
        assert!(!filter.include(&meta, &1u8).unwrap());
        let meta = FieldMeta { name: "id", ..meta };
        assert!(filter.include(&meta, &1u8).unwrap());
    }

    #[test]
    fn include_all_ignores_exclusion_marker() {
        let tag = FieldTag::parse("cache", "-").unwrap();
        let meta = FieldMeta {
            record: "Row",
            name: "cache",
            tag: &tag,
        };
        assert!(!TagFilter.include(&meta, &1u8).unwrap());
        assert!(IncludeAll.include(&meta, &1u8).unwrap());
    }
}
