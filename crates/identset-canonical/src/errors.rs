use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that abort an identity computation.
///
/// No partial digest is ever produced: the first error raised while
/// building or writing a value is returned to the caller.
#[derive(Error, Debug, PartialEq)]
pub enum IdentityError {
    /// A field annotation could not be parsed, or it names a behaviour the
    /// field's type does not provide.
    #[error("invalid annotation on field `{field}` ({directive:?}): {reason}")]
    Configuration {
        /// Field carrying the annotation.
        field: String,
        /// Offending directive text.
        directive: String,
        /// What is wrong with it.
        reason: String,
    },
    /// The value kind has no canonical byte form.
    #[error("unsupported kind: {0}")]
    UnsupportedKind(&'static str),
    /// A `Serialize` implementation reported an error.
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// Digest construction failed.
    #[error("digest construction failed: {0}")]
    Validation(#[from] ValidationError),
}

impl IdentityError {
    pub(crate) fn configuration(
        field: impl Into<String>,
        directive: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        IdentityError::Configuration {
            field: field.into(),
            directive: directive.into(),
            reason: reason.into(),
        }
    }
}

impl serde::ser::Error for IdentityError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        IdentityError::Serialization(msg.to_string())
    }
}
