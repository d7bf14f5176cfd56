//! Subcommand implementations and shared plumbing.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use identset_canonical::{DigestAlg, IdentityConfig, IdentityEngine, IdentityError};
use thiserror::Error;

pub mod canonicalize;
pub mod dedupe;
pub mod identity;

/// Errors surfaced by subcommands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("expected a JSON array, found {0}")]
    NotAnArray(&'static str),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Engine selection shared by every subcommand.
pub struct EngineOptions {
    pub alg: Option<DigestAlg>,
    pub config: Option<PathBuf>,
}

impl EngineOptions {
    /// Builds the engine: config file first, then `--alg` on top.
    pub fn engine(&self) -> Result<IdentityEngine, CliError> {
        let mut config = match &self.config {
            Some(path) => {
                let text = read_file(path)?;
                serde_json::from_str::<IdentityConfig>(&text).map_err(|source| CliError::Config {
                    path: path.display().to_string(),
                    source,
                })?
            }
            None => IdentityConfig::default(),
        };
        if let Some(alg) = self.alg {
            config.alg = alg;
        }
        tracing::debug!(?config, "identity engine configured");
        Ok(IdentityEngine::from_config(&config))
    }
}

/// Reads and parses a JSON document from a file, or stdin when no path is given.
pub fn read_json(input: Option<&Path>) -> Result<serde_json::Value, CliError> {
    let text = match input {
        Some(path) => read_file(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|source| CliError::Read {
                    path: "stdin".to_string(),
                    source,
                })?;
            buffer
        }
    };
    Ok(serde_json::from_str(&text)?)
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}
