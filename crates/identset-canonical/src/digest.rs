use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::digest::DynDigest;
use sha2::{Sha256, Sha512};

use crate::validation::ValidationError;

static HEX_256: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-f]{64}$").expect("invalid regex"));
static HEX_512: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{128}$").expect("invalid regex"));

/// Supported digest algorithms for identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum DigestAlg {
    /// SHA-256, 64 hex characters.
    #[serde(rename = "sha-256")]
    Sha256,
    /// SHA-512, 128 hex characters (the default).
    #[default]
    #[serde(rename = "sha-512")]
    Sha512,
}

impl DigestAlg {
    /// Fresh hash state for this algorithm.
    pub(crate) fn hasher(self) -> Box<dyn DynDigest> {
        match self {
            DigestAlg::Sha256 => Box::new(Sha256::default()),
            DigestAlg::Sha512 => Box::new(Sha512::default()),
        }
    }

    /// Length of the hex encoding of a digest.
    pub fn hex_len(self) -> usize {
        match self {
            DigestAlg::Sha256 => 64,
            DigestAlg::Sha512 => 128,
        }
    }

    /// Parses the serialized name (`sha-256`, `sha-512`).
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        match name {
            "sha-256" | "sha256" => Ok(DigestAlg::Sha256),
            "sha-512" | "sha512" => Ok(DigestAlg::Sha512),
            _ => Err(ValidationError::PatternMismatch {
                field: "digest_alg",
                value: name.to_string(),
            }),
        }
    }
}

impl fmt::Display for DigestAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestAlg::Sha256 => write!(f, "sha-256"),
            DigestAlg::Sha512 => write!(f, "sha-512"),
        }
    }
}

/// Identity of a value: algorithm plus lowercase hex digest.
///
/// Ordered and hashable so it can key maps and be sorted for set equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest {
    /// Digest algorithm.
    pub alg: DigestAlg,
    /// Lowercase hex digest bytes.
    pub hex: String,
}

impl Digest {
    /// Constructs a validated digest.
    pub fn new(alg: DigestAlg, hex: impl Into<String>) -> Result<Self, ValidationError> {
        let hex = hex.into();
        let re = match alg {
            DigestAlg::Sha256 => &HEX_256,
            DigestAlg::Sha512 => &HEX_512,
        };
        if !re.is_match(&hex) {
            return Err(ValidationError::PatternMismatch {
                field: "digest",
                value: hex,
            });
        }
        Ok(Digest { alg, hex })
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.hex
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_length_per_algorithm() {
        let hex64 = "a".repeat(64);
        assert!(Digest::new(DigestAlg::Sha256, hex64.clone()).is_ok());
        assert!(Digest::new(DigestAlg::Sha512, hex64).is_err());
        assert!(Digest::new(DigestAlg::Sha512, "b".repeat(128)).is_ok());
        assert!(Digest::new(DigestAlg::Sha256, "A".repeat(64)).is_err());
    }

    #[test]
    fn alg_names() {
        assert_eq!(DigestAlg::parse("sha-256").unwrap(), DigestAlg::Sha256);
        assert_eq!(DigestAlg::default(), DigestAlg::Sha512);
        assert_eq!(DigestAlg::Sha512.to_string(), "sha-512");
        assert!(DigestAlg::parse("md5").is_err());
    }
}
