//! Pluggable identity functions for sets.

use identset_canonical::{Canonical, Digest, IdentityEngine, IdentityError};

/// Maps a value to the digest that decides set membership.
pub trait Identify<T: ?Sized> {
    /// Computes the identity of `value`.
    fn identify(&self, value: &T) -> Result<Digest, IdentityError>;
}

impl<T: Canonical + ?Sized> Identify<T> for IdentityEngine {
    fn identify(&self, value: &T) -> Result<Digest, IdentityError> {
        self.identity(value)
    }
}

/// Wraps a closure as an identity function.
///
/// ```rust
/// use identset_canonical::{DigestAlg, IdentityEngine};
/// use identset_collections::{FnIdentity, Set};
///
/// // Case-insensitive membership for plain strings.
/// let engine = IdentityEngine::new(DigestAlg::Sha256);
/// let by_lowercase = FnIdentity(move |s: &String| engine.identity(&s.to_lowercase()));
/// let mut set = Set::with_identity(by_lowercase);
/// set.add(["Alpha".to_string(), "ALPHA".to_string(), "beta".to_string()])?;
/// assert_eq!(set.len(), 2);
/// # Ok::<(), identset_canonical::IdentityError>(())
/// ```
#[derive(Clone, Copy)]
pub struct FnIdentity<F>(
    /// The identity closure.
    pub F,
);

impl<T, F> Identify<T> for FnIdentity<F>
where
    T: ?Sized,
    F: Fn(&T) -> Result<Digest, IdentityError>,
{
    fn identify(&self, value: &T) -> Result<Digest, IdentityError> {
        (self.0)(value)
    }
}
