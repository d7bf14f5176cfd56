//! Identity command implementation.

use std::path::PathBuf;

use serde_json::json;

use super::{read_json, CliError, EngineOptions};
use crate::output::format_json;

pub fn run(options: &EngineOptions, input: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let engine = options.engine()?;
    let value = read_json(input.as_deref())?;
    let digest = engine.identity(&value)?;

    if json {
        println!("{}", format_json(&json!({ "alg": digest.alg, "hex": digest.hex })));
    } else {
        println!("{}", digest);
    }
    Ok(())
}
