//! CLI integration tests
//!
//! Run the `ecoretree` binary against documents written to a temp dir.

use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const ECORE: &str = "http://www.eclipse.org/emf/2002/Ecore#//";

fn library() -> Value {
    json!({
        "eClass": format!("{}EPackage", ECORE),
        "name": "library",
        "eClassifiers": [
            {
                "eClass": format!("{}EClass", ECORE),
                "name": "Book",
                "eStructuralFeatures": [
                    {"eClass": format!("{}EAttribute", ECORE), "name": "title"}
                ]
            },
            {
                "eClass": format!("{}EEnum", ECORE),
                "name": "Genre",
                "eLiterals": [{"name": "FICTION"}, {"name": "POETRY", "value": 1}]
            }
        ]
    })
}

fn write(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ecoretree"))
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

#[test]
fn test_render_outline() {
    // GIVEN a snapshot on disk
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "library.ecore", &library().to_string());

    // WHEN it is rendered
    let output = run(&["render", "--snapshot", snapshot.to_str().unwrap()]);

    // THEN the outline lists every node with its type
    assert!(
        output.status.success(),
        "Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "library (EPackage)");
    assert_eq!(lines[1], "  Book (EClass)");
    assert_eq!(lines[2], "    title (EAttribute)");
    assert_eq!(lines[3], "  Genre (EEnum)");
    assert_eq!(lines[4], "    FICTION = 0 (EEnumLiteral)");
    assert_eq!(lines[5], "    POETRY = 1 (EEnumLiteral)");
}

#[test]
fn test_render_json_round_trips() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "library.ecore", &library().to_string());
    let out = dir.path().join("raw.json");

    let output = run(&[
        "render",
        "--snapshot",
        snapshot.to_str().unwrap(),
        "--json",
        "--output",
        out.to_str().unwrap(),
    ]);

    assert!(output.status.success());
    let raw: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(raw, library());
}

#[test]
fn test_replay_applies_messages_and_keeps_selection() {
    // GIVEN a snapshot and a recorded push channel
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "library.ecore", &library().to_string());
    let messages = [
        json!({"type": "incrementalUpdate", "data": {
            "type": "set",
            "owner": {"$ref": "file:/workspace/library.ecore#//Genre/POETRY"},
            "feature": "value",
            "dataValues": ["5"]
        }}),
        json!({"type": "incrementalUpdate", "data": {
            "type": "remove",
            "owner": {"$ref": "file:/workspace/library.ecore#//Genre"},
            "feature": "eLiterals",
            "indices": [0]
        }}),
        json!({"type": "incrementalUpdate", "data": {
            "type": "set",
            "owner": {"$ref": "file:/workspace/library.ecore#//Nowhere"},
            "feature": "name",
            "dataValues": ["x"]
        }}),
        json!({"type": "dirtyState", "data": true}),
    ];
    let lines: Vec<String> = messages.iter().map(Value::to_string).collect();
    let messages = write(&dir, "messages.jsonl", &lines.join("\n"));

    // WHEN they are replayed with a literal selected
    let output = run(&[
        "replay",
        "--snapshot",
        snapshot.to_str().unwrap(),
        "--messages",
        messages.to_str().unwrap(),
        "--select",
        "Genre/POETRY = 1",
    ]);

    // THEN valid messages are applied and the bad one is dropped
    assert!(
        output.status.success(),
        "Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let document: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        document["eClassifiers"][1]["eLiterals"],
        json!([{"name": "POETRY", "value": 5}])
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1: patched, detail refreshed"));
    assert!(stderr.contains("3: dropped"));
    assert!(stderr.contains("4: dirty: true"));
    assert!(stderr.contains("selected: Genre/POETRY = 5"));
}

#[test]
fn test_replay_rejects_bad_message_line() {
    let dir = TempDir::new().unwrap();
    let snapshot = write(&dir, "library.ecore", &library().to_string());
    let messages = write(&dir, "messages.jsonl", "{\"type\": \"somethingElse\"}\n");

    let output = run(&[
        "replay",
        "--snapshot",
        snapshot.to_str().unwrap(),
        "--messages",
        messages.to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("line 1 is not a push message"));
}

#[test]
fn test_diff_reports_first_changed_field() {
    // GIVEN an edited payload and its baseline
    let dir = TempDir::new().unwrap();
    let baseline = json!({"eClass": format!("{}EClass", ECORE), "name": "Book", "abstract": false, "interface": false});
    let current = json!({"eClass": format!("{}EClass", ECORE), "name": "Book", "abstract": true, "interface": true});
    let baseline = write(&dir, "baseline.json", &baseline.to_string());
    let current = write(&dir, "current.json", &current.to_string());

    // WHEN diffed
    let output = run(&[
        "diff",
        "--current",
        current.to_str().unwrap(),
        "--baseline",
        baseline.to_str().unwrap(),
        "--owner-base",
        "file:/ws/library.ecore",
    ]);

    // THEN both changes are reported but only the first is sent
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["changes"], json!({"abstract": true, "interface": true}));
    assert_eq!(report["command"]["type"], "set");
    assert_eq!(report["command"]["feature"], "abstract");
    assert_eq!(report["command"]["dataValues"], json!([true]));
    assert_eq!(
        report["command"]["owner"]["$ref"],
        "file:/ws/library.ecore#//Book"
    );
}
