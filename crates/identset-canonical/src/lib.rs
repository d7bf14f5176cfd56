//! Structural identity for Rust values.
//!
//! A value is lowered into a closed [`Value`] tree (records, sequences,
//! maps, references, dynamic wrappers, primitives), written as canonical
//! bytes and hashed. Values that are structurally equal always share a
//! digest; map iteration order, record field order and excluded fields never
//! reach the hash.
//!
//! Types opt in through [`Canonical`], either by hand with
//! [`RecordBuilder`], with the [`identity_record!`] macro, or through the
//! [`Serde`] adapter for anything that implements `serde::Serialize`.
//!
#![deny(missing_docs)]

/// The `Canonical` capability and its implementations for std types.
pub mod canonical;
/// Canonical byte encoding and hash sinks.
pub mod canonicalizer;
/// Identity for `chrono` instants.
pub mod datetime;
/// Digest/identifier primitives.
pub mod digest;
/// Identity engine, configuration and default entry points.
pub mod engine;
/// Error types.
pub mod errors;
/// Field annotations and filters.
pub mod filter;
/// Record lowering and the `identity_record!` macro.
pub mod record;
/// Lowering of `Serialize` types.
pub mod serde_bridge;
/// Validation helpers used by identity primitives.
pub mod validation;
/// The closed value model.
pub mod value;

pub use canonical::{Canonical, ZeroValue};
pub use canonicalizer::{ByteCanonicalizer, ByteSink, HashState, Strategy, STRATEGIES};
pub use digest::{Digest, DigestAlg};
pub use engine::{identity, identity_hex, IdentityConfig, IdentityEngine};
pub use errors::IdentityError;
pub use filter::{
    ExcludeFields, FieldFilter, FieldMeta, FieldTag, IncludeAll, TagFilter, EXCLUDE, JSON_OBJECT,
};
pub use record::RecordBuilder;
pub use serde_bridge::Serde;
pub use validation::ValidationError;
pub use value::{Record, Value};
