//! CLI end-to-end tests that run the binary against the core crate's fixture
//! schemas.

use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

const FIXTURES_DIR: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../crates/jsonschema-form-core/tests/schemas"
);

#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin("jsonschema-form").expect("binary should exist")
}

fn fixture_names() -> Vec<&'static str> {
    vec!["simple", "tuple_list", "recursive", "kitchen_sink"]
}

// ── E2E: Compile all fixtures via CLI ───────────────────────────────────────

#[test]
fn test_cli_e2e_compile_all_fixtures() {
    let dir = TempDir::new().unwrap();

    for name in fixture_names() {
        let input = format!("{FIXTURES_DIR}/{name}.json");
        let output = dir.path().join(format!("{name}.form.json"));

        cmd()
            .args(["compile", &input])
            .args(["-o", output.to_str().unwrap()])
            .assert()
            .success();

        let content = fs::read_to_string(&output)
            .unwrap_or_else(|e| panic!("Output file for {name} missing: {e}"));
        let model: serde_json::Value =
            serde_json::from_str(&content).expect("output should be valid JSON");
        assert!(model["layout"].is_array(), "{name}: layout should be an array");
        assert!(model["template"].is_object(), "{name}: template should be an object");
    }
}

// ── E2E: Authored layout with data ──────────────────────────────────────────

#[test]
fn test_cli_e2e_authored_layout() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data.json");
    fs::write(&data, r#"{"contacts": [{"name": "Ada"}]}"#).unwrap();

    let output = cmd()
        .args(["compile", &format!("{FIXTURES_DIR}/kitchen_sink.json")])
        .args(["--layout", &format!("{FIXTURES_DIR}/kitchen_sink_layout.json")])
        .args(["--data", data.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let model: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(model["layout"][0]["dataPointer"], "/email");
    assert_eq!(model["layout"][2]["type"], "fieldset");
}

// ── E2E: Recursive fixture keeps its library finite ─────────────────────────

#[test]
fn test_cli_e2e_recursive_library() {
    let output = cmd()
        .args(["compile", &format!("{FIXTURES_DIR}/recursive.json")])
        .args(["--format", "compact"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let model: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(model["layoutLibrary"][""].is_object());
    assert_eq!(model["dataRecursive"]["/children/-"], "");
}
