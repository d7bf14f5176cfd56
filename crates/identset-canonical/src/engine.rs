//! Identity computation: lower, canonicalize, hash.
//!
//! `identity = H(domain || canonical_bytes(value))`, where the domain
//! separator is empty unless configured. A fresh hash state is created for
//! every call, so one engine can be shared across threads.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::canonical::Canonical;
use crate::canonicalizer::{ByteCanonicalizer, ByteSink, HashState};
use crate::digest::{Digest, DigestAlg};
use crate::errors::IdentityError;
use crate::filter::{ExcludeFields, FieldFilter, IncludeAll, TagFilter};
use crate::value::Value;

static DEFAULT_ENGINE: Lazy<IdentityEngine> = Lazy::new(IdentityEngine::default);

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    /// Digest algorithm.
    pub alg: DigestAlg,
    /// Honour `-` field annotations and `exclude_fields`.
    ///
    /// Setting this to false is a debugging override: every field is hashed
    /// (see [`IncludeAll`]) and the resulting digests do not match those of
    /// an engine honouring exclusions.
    pub honor_exclusions: bool,
    /// Field names, and JSON object keys, excluded from every record in
    /// addition to annotations.
    pub exclude_fields: Vec<String>,
    /// Domain separator written before the canonical bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            alg: DigestAlg::default(),
            honor_exclusions: true,
            exclude_fields: Vec::new(),
            domain: None,
        }
    }
}

/// Computes structural identity digests.
#[derive(Clone)]
pub struct IdentityEngine {
    alg: DigestAlg,
    filter: Arc<dyn FieldFilter>,
    domain: Option<Vec<u8>>,
    canonicalizer: ByteCanonicalizer,
}

impl IdentityEngine {
    /// Engine using `alg` and the default [`TagFilter`].
    pub fn new(alg: DigestAlg) -> Self {
        Self {
            alg,
            filter: Arc::new(TagFilter),
            domain: None,
            canonicalizer: ByteCanonicalizer,
        }
    }

    /// Builds an engine from configuration.
    pub fn from_config(config: &IdentityConfig) -> Self {
        let filter: Arc<dyn FieldFilter> = match (config.honor_exclusions, config.exclude_fields.is_empty()) {
            (false, _) => Arc::new(IncludeAll),
            (true, true) => Arc::new(TagFilter),
            (true, false) => Arc::new(ExcludeFields::new(config.exclude_fields.iter().cloned())),
        };
        let engine = Self::new(config.alg).with_filter(filter);
        match &config.domain {
            Some(domain) => engine.with_domain(domain.as_bytes()),
            None => engine,
        }
    }

    /// Replaces the field filter.
    pub fn with_filter(mut self, filter: Arc<dyn FieldFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Sets a domain separator prefixed to the canonical bytes.
    pub fn with_domain(mut self, domain: impl Into<Vec<u8>>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Digest algorithm in use.
    pub fn alg(&self) -> DigestAlg {
        self.alg
    }

    /// Lowers `value` through the engine's field filter.
    pub fn value_of<T: Canonical + ?Sized>(&self, value: &T) -> Result<Value, IdentityError> {
        value.to_value(self.filter.as_ref())
    }

    /// Canonical bytes of `value`, without the domain separator.
    pub fn canonical_bytes<T: Canonical + ?Sized>(&self, value: &T) -> Result<Vec<u8>, IdentityError> {
        let lowered = self.value_of(value)?;
        self.canonicalizer.to_bytes(&lowered)
    }

    /// Structural identity of `value`.
    pub fn identity<T: Canonical + ?Sized>(&self, value: &T) -> Result<Digest, IdentityError> {
        let lowered = self.value_of(value)?;
        self.identity_of_value(&lowered)
    }

    /// Identity of an already lowered value.
    pub fn identity_of_value(&self, value: &Value) -> Result<Digest, IdentityError> {
        let mut state = HashState::new(self.alg.hasher());
        if let Some(domain) = &self.domain {
            state.write(domain);
        }
        self.canonicalizer.write(value, &mut state)?;
        let digest = Digest::new(self.alg, hex::encode(state.finalize()))?;
        tracing::debug!(alg = %self.alg, kind = value.kind(), digest = %digest, "identity computed");
        Ok(digest)
    }
}

impl Default for IdentityEngine {
    fn default() -> Self {
        Self::new(DigestAlg::default())
    }
}

impl fmt::Debug for IdentityEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityEngine")
            .field("alg", &self.alg)
            .field("domain", &self.domain.as_ref().map(|d| String::from_utf8_lossy(d)))
            .finish_non_exhaustive()
    }
}

/// Identity of `value` with the default engine (SHA-512, `-` honoured).
pub fn identity<T: Canonical + ?Sized>(value: &T) -> Result<Digest, IdentityError> {
    DEFAULT_ENGINE.identity(value)
}

/// Hex identity of `value` with the default engine.
pub fn identity_hex<T: Canonical + ?Sized>(value: &T) -> Result<String, IdentityError> {
    identity(value).map(|digest| digest.hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_length_follows_algorithm() {
        assert_eq!(identity_hex("x").unwrap().len(), 128);
        let engine = IdentityEngine::new(DigestAlg::Sha256);
        assert_eq!(engine.identity("x").unwrap().hex.len(), 64);
    }

    #[test]
    fn domain_changes_digest() {
        let plain = IdentityEngine::new(DigestAlg::Sha256);
        let separated = plain.clone().with_domain("identset:v1\0");
        assert_ne!(
            plain.identity(&42u32).unwrap(),
            separated.identity(&42u32).unwrap()
        );
    }

    #[test]
    fn config_defaults_and_parsing() {
        let config: IdentityConfig =
            serde_json::from_str(r#"{"alg":"sha-256","exclude_fields":["updated_at"]}"#).unwrap();
        assert_eq!(config.alg, DigestAlg::Sha256);
        assert!(config.honor_exclusions);
        assert_eq!(config.domain, None);
        assert_eq!(IdentityEngine::from_config(&config).alg(), DigestAlg::Sha256);

        assert!(serde_json::from_str::<IdentityConfig>(r#"{"algo":"sha-256"}"#).is_err());
    }

    #[test]
    fn unit_matches_known_vector() {
        // `()` is its kind tag alone, so this is SHA-256 of a single zero byte.
        let engine = IdentityEngine::new(DigestAlg::Sha256);
        assert_eq!(
            engine.identity(&()).unwrap().hex,
            "6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d"
        );
    }

    #[test]
    fn computed_digests_pass_validation() {
        for alg in [DigestAlg::Sha256, DigestAlg::Sha512] {
            let digest = IdentityEngine::new(alg).identity("x").unwrap();
            assert_eq!(Digest::new(alg, digest.hex.clone()).unwrap(), digest);
        }
        let err: IdentityError = Digest::new(DigestAlg::Sha256, "xyz").unwrap_err().into();
        assert!(matches!(err, IdentityError::Validation(_)));
    }
}
