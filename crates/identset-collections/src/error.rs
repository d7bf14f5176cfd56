//! Error types for set operations.

use identset_canonical::{Digest, IdentityError};
use thiserror::Error;

/// Errors that can occur during set lookups.
#[derive(Error, Debug, PartialEq)]
pub enum SetError {
    /// No element with this identity is stored in the set.
    #[error("id: {0} not found")]
    NotFound(Digest),
    /// Computing the identity of the looked-up value failed.
    #[error("identity computation failed: {0}")]
    Identity(#[from] IdentityError),
}
