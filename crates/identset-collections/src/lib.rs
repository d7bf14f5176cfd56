//! Unique-element collections keyed by structural identity.
//!
//! [`Set`] stores values under the digest computed for them by an
//! [`Identify`] implementation, by default the SHA-512
//! [`IdentityEngine`](identset_canonical::IdentityEngine). Values that are
//! structurally equal collapse into one element even when their types do
//! not implement `Eq` or `Hash`.
//!
//! ```rust
//! use identset_collections::Set;
//!
//! let mut set = Set::from_values(vec![vec![1, 2], vec![3], vec![1, 2]])?;
//! assert_eq!(set.len(), 2);
//! assert_eq!(set.occurrences(&vec![1, 2])?, 2);
//! set.discard(&vec![3])?;
//! assert_eq!(set.into_vec(), [vec![1, 2]]);
//! # Ok::<(), identset_canonical::IdentityError>(())
//! ```
#![deny(missing_docs)]

/// Error types.
pub mod error;
/// Pluggable identity functions.
pub mod identify;
/// The identity-keyed set.
pub mod set;

pub use error::SetError;
pub use identify::{FnIdentity, Identify};
pub use set::{intersection, union, Set};
