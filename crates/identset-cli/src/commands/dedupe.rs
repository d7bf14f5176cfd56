//! Dedupe command implementation.

use std::path::PathBuf;

use identset_collections::Set;
use serde_json::{json, Value};

use super::{read_json, CliError, EngineOptions};
use crate::output::{format_json, kind_name};

pub fn run(options: &EngineOptions, input: Option<PathBuf>, counts: bool) -> Result<(), CliError> {
    let engine = options.engine()?;
    let elements = match read_json(input.as_deref())? {
        Value::Array(elements) => elements,
        other => return Err(CliError::NotAnArray(kind_name(&other))),
    };

    let total = elements.len();
    let set = Set::from_values_with(engine, elements)?;
    tracing::info!(total, unique = set.len(), "deduplicated");

    let report = if counts {
        Value::Array(
            set.entries()
                .map(|(_, value, occurrences)| json!({ "value": value, "occurrences": occurrences }))
                .collect(),
        )
    } else {
        Value::Array(set.into_vec())
    };
    println!("{}", format_json(&report));
    Ok(())
}
