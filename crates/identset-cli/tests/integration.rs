//! Integration tests for CLI commands.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::json;
use tempfile::TempDir;

fn write_input(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().to_string()
}

fn run_cli(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_identset"))
        .args(args)
        .output()
        .expect("Failed to execute CLI");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    (output.status.success(), stdout, stderr)
}

fn run_cli_stdin(args: &[&str], stdin: &str) -> (bool, String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_identset"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    (output.status.success(), stdout, stderr)
}

#[test]
fn test_identity_is_key_order_independent() {
    let dir = TempDir::new().unwrap();
    let a = write_input(&dir, "a.json", r#"{"b":1,"a":[true,"x"]}"#);
    let b = write_input(&dir, "b.json", r#"{"a":[true,"x"],"b":1}"#);

    let (success, stdout_a, _) = run_cli(&["identity", &a, "--alg", "sha-256"]);
    assert!(success);
    assert_eq!(
        stdout_a.trim(),
        "9f12a72024edfc37634a7ec120e17afefa67707a3c8e4ce03ede3816a5b678d8"
    );

    let (success, stdout_b, _) = run_cli(&["identity", &b, "--alg", "sha-256"]);
    assert!(success);
    assert_eq!(stdout_a, stdout_b);
}

#[test]
fn test_identity_defaults_to_sha512_json_output() {
    let (success, stdout, _) = run_cli_stdin(&["identity", "--json"], "[1, 2, 3]");
    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["alg"], "sha-512");
    assert_eq!(parsed["hex"].as_str().unwrap().len(), 128);
}

#[test]
fn test_config_file_selects_algorithm() {
    let dir = TempDir::new().unwrap();
    let config = write_input(&dir, "identity.json", r#"{"alg":"sha-256"}"#);
    let input = write_input(&dir, "doc.json", r#""hello""#);

    let (success, stdout, _) = run_cli(&["identity", &input, "--config", &config]);
    assert!(success);
    assert_eq!(stdout.trim().len(), 64);

    // --alg wins over the config file.
    let (success, stdout, _) = run_cli(&["identity", &input, "--config", &config, "--alg", "sha-512"]);
    assert!(success);
    assert_eq!(stdout.trim().len(), 128);
}

#[test]
fn test_canonicalize_prints_hex_bytes() {
    let (success, stdout, _) = run_cli_stdin(&["canonicalize"], "true");
    assert!(success);
    assert_eq!(stdout.trim(), "0101");

    let (success, stdout, _) = run_cli_stdin(&["canonicalize"], r#""ab""#);
    assert!(success);
    assert_eq!(stdout.trim(), "0400000000000000026162");
}

#[test]
fn test_dedupe_keeps_first_occurrence_order() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        &dir,
        "items.json",
        r#"[{"a":1,"b":2}, 3, {"b":2,"a":1}, "x", 3, 3]"#,
    );

    let (success, stdout, _) = run_cli(&["dedupe", &input]);
    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed, json!([{"a": 1, "b": 2}, 3, "x"]));

    let (success, stdout, _) = run_cli(&["dedupe", &input, "--counts"]);
    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(
        parsed,
        json!([
            {"value": {"a": 1, "b": 2}, "occurrences": 2},
            {"value": 3, "occurrences": 3},
            {"value": "x", "occurrences": 1},
        ])
    );
}

#[test]
fn test_dedupe_rejects_non_array() {
    let (success, _, stderr) = run_cli_stdin(&["dedupe"], r#"{"a":1}"#);
    assert!(!success);
    assert!(stderr.contains("Error: expected a JSON array, found object"));
}

#[test]
fn test_invalid_json_fails() {
    let (success, _, stderr) = run_cli_stdin(&["identity"], "{not json");
    assert!(!success);
    assert!(stderr.contains("Error: invalid JSON"));
}

#[test]
fn test_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.json");
    assert!(!Path::new(&missing).exists());

    let (success, _, stderr) = run_cli(&["identity", &missing.to_string_lossy()]);
    assert!(!success);
    assert!(stderr.contains("failed to read"));
}

#[test]
fn test_unknown_config_key_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_input(&dir, "bad.json", r#"{"algorithm":"sha-256"}"#);
    let (success, _, stderr) = run_cli_stdin(&["identity", "--config", &config], "1");
    assert!(!success);
    assert!(stderr.contains("invalid config"));
}

#[test]
fn test_dedupe_keeps_empty_values_of_every_kind() {
    let (success, stdout, _) = run_cli_stdin(&["dedupe"], r#"["", 0, [], {}, 0.0, "", {}]"#);
    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed, json!(["", 0, [], {}, 0.0]));
}

#[test]
fn test_config_exclude_fields_applies_to_json() {
    let dir = TempDir::new().unwrap();
    let config = write_input(&dir, "identity.json", r#"{"exclude_fields":["updated_at"]}"#);
    let a = write_input(&dir, "a.json", r#"{"id":1,"updated_at":"2020"}"#);
    let b = write_input(&dir, "b.json", r#"{"id":1,"updated_at":"2024"}"#);

    let (success, digest_a, _) = run_cli(&["identity", &a, "--config", &config]);
    assert!(success);
    let (success, digest_b, _) = run_cli(&["identity", &b, "--config", &config]);
    assert!(success);
    assert_eq!(digest_a, digest_b);

    let (_, plain_a, _) = run_cli(&["identity", &a]);
    let (_, plain_b, _) = run_cli(&["identity", &b]);
    assert_ne!(plain_a, plain_b);

    let items = write_input(
        &dir,
        "items.json",
        r#"[{"id":1,"updated_at":"2020"},{"id":1,"updated_at":"2024"},{"id":2,"updated_at":"2020"}]"#,
    );
    let (success, stdout, _) = run_cli(&["dedupe", &items, "--config", &config, "--counts"]);
    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed[0]["occurrences"], 2);
    assert_eq!(parsed[0]["value"]["updated_at"], "2020");
    assert_eq!(parsed[1]["value"]["id"], 2);
    assert_eq!(parsed.as_array().unwrap().len(), 2);
}
