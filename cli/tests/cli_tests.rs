//! CLI binary integration tests using assert_cmd + predicates.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin("jsonschema-form").expect("binary should exist")
}

fn simple_schema() -> String {
    serde_json::json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "minLength": 2 },
            "age": { "type": "integer" },
            "joined": { "type": "string", "format": "date-time" }
        },
        "required": ["name"]
    })
    .to_string()
}

// ── Compile ─────────────────────────────────────────────────────────────────

#[test]
fn test_compile_to_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("schema.json");
    let output = dir.path().join("form.json");
    fs::write(&input, simple_schema()).unwrap();

    cmd()
        .args(["compile", input.to_str().unwrap()])
        .args(["-o", output.to_str().unwrap()])
        .assert()
        .success();

    let content = fs::read_to_string(&output).expect("output file should exist");
    let model: serde_json::Value = serde_json::from_str(&content).expect("output should be valid JSON");
    assert_eq!(model["layout"][0]["dataPointer"], "/name");
    assert_eq!(model["template"]["type"], "group");
    assert!(model["dataMap"]["/age"].is_object());
}

#[test]
fn test_compile_reports_layout_diagnostics() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("schema.json");
    let layout = dir.path().join("layout.json");
    fs::write(&input, simple_schema()).unwrap();
    fs::write(&layout, r#"["name", "missing"]"#).unwrap();

    cmd()
        .args(["compile", input.to_str().unwrap()])
        .args(["--layout", layout.to_str().unwrap()])
        .args(["--format", "compact"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Warning:"))
        .stdout(predicate::str::contains("\"dataPointer\":\"/name\""));
}

// ── Format ──────────────────────────────────────────────────────────────────

#[test]
fn test_format_fix_errors() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("schema.json");
    let data = dir.path().join("data.json");
    fs::write(&input, simple_schema()).unwrap();
    fs::write(&data, r#"{"name": "Ada", "age": "36", "joined": "2020-01-01"}"#).unwrap();

    let output = cmd()
        .args(["format", input.to_str().unwrap(), data.to_str().unwrap()])
        .args(["--fix-errors", "--format", "compact"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let formatted: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        formatted,
        serde_json::json!({ "name": "Ada", "age": 36, "joined": "2020-01-01T00:00:00Z" })
    );
}

// ── Validate ────────────────────────────────────────────────────────────────

#[test]
fn test_validate_success() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("schema.json");
    let data = dir.path().join("data.json");
    fs::write(&input, simple_schema()).unwrap();
    fs::write(&data, r#"{"name": "Ada"}"#).unwrap();

    cmd()
        .args(["validate", input.to_str().unwrap(), data.to_str().unwrap()])
        .args(["--format", "compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_validate_failure_uses_messages() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("schema.json");
    let data = dir.path().join("data.json");
    let messages = dir.path().join("messages.json");
    fs::write(&input, simple_schema()).unwrap();
    fs::write(&data, r#"{"name": "A"}"#).unwrap();
    fs::write(&messages, r#"{"minLength": "Too short"}"#).unwrap();

    cmd()
        .args(["validate", input.to_str().unwrap(), data.to_str().unwrap()])
        .args(["--messages", messages.to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Too short"))
        .stdout(predicate::str::contains("/name"));
}

// ── Config and errors ───────────────────────────────────────────────────────

#[test]
fn test_config_file_is_applied() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("schema.json");
    let config = dir.path().join("config.json");
    let data = dir.path().join("data.json");
    fs::write(&input, simple_schema()).unwrap();
    fs::write(&config, r#"{"format": {"fix-errors": true}}"#).unwrap();
    fs::write(&data, r#"{"age": "36"}"#).unwrap();

    cmd()
        .args(["format", input.to_str().unwrap(), data.to_str().unwrap()])
        .args(["--config", config.to_str().unwrap(), "--format", "compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"age\":36"));
}

#[test]
fn test_unresolvable_ref_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("schema.json");
    fs::write(&input, r##"{"properties": {"a": {"$ref": "#/definitions/nope"}}}"##).unwrap();

    cmd()
        .args(["compile", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Compilation failed"));
}

#[test]
fn test_missing_input_file() {
    cmd()
        .args(["compile", "/nonexistent/schema.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open schema file"));
}
