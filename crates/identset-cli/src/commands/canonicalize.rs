//! Canonicalize command implementation.

use std::path::PathBuf;

use super::{read_json, CliError, EngineOptions};

pub fn run(options: &EngineOptions, input: Option<PathBuf>) -> Result<(), CliError> {
    let engine = options.engine()?;
    let value = read_json(input.as_deref())?;
    let bytes = engine.canonical_bytes(&value)?;

    println!("{}", hex::encode(bytes));
    Ok(())
}
