//! End-to-end tests of the `rowmerge` binary: JSON files in, JSON out.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde_json::{Value as Json, json};

fn rowmerge(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rowmerge"))
        .args(args)
        .current_dir(dir)
        .env_remove("ROWMERGE_CONFIG")
        .output()
        .expect("run rowmerge")
}

fn write_json(dir: &Path, name: &str, value: &Json) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, value.to_string()).expect("write input");
    path
}

fn stdout_json(output: &Output) -> Json {
    assert!(
        output.status.success(),
        "rowmerge failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn buckets_merges_and_cleans() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "a.json", &json!({"entry_1": "plop", "4": "lolo"}));
    write_json(dir.path(), "b.json", &json!({"entry_1": "plouf", "4": "lolo"}));

    let out = stdout_json(&rowmerge(dir.path(), &["buckets", "a.json", "b.json"]));
    assert_eq!(out, json!({"entry_1": ["plop", "plouf"], "4": ["lolo", "lolo"]}));

    let out = stdout_json(&rowmerge(dir.path(), &["buckets", "a.json", "b.json", "--dedupe"]));
    assert_eq!(out, json!({"entry_1": ["plop", "plouf"], "4": "lolo"}));
}

#[test]
fn buckets_with_labels() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "a.json", &json!({"name": "x"}));
    write_json(dir.path(), "b.json", &json!({"name": "y"}));

    let out = stdout_json(&rowmerge(
        dir.path(),
        &["buckets", "a.json", "b.json", "--label", "a", "--label", "b"],
    ));
    assert_eq!(out, json!({"name": {"a": "x", "b": "y"}}));

    let mismatched = rowmerge(dir.path(), &["buckets", "a.json", "b.json", "--label", "a"]);
    assert!(!mismatched.status.success());
}

#[test]
fn buckets_reads_dedupe_from_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("rowmerge.toml"), "[clean]\ndedupe = true\n").unwrap();
    write_json(dir.path(), "a.json", &json!({"k": 1}));
    write_json(dir.path(), "b.json", &json!({"k": 1}));

    let out = stdout_json(&rowmerge(dir.path(), &["buckets", "a.json", "b.json"]));
    assert_eq!(out, json!({"k": 1}));
}

#[test]
fn recursive_merge() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "a.json", &json!({"a": 1, "n": {"x": "old"}}));
    write_json(dir.path(), "b.json", &json!({"a": 2, "n": {"x": "new", "y": true}}));

    let out = stdout_json(&rowmerge(dir.path(), &["recursive", "a.json", "b.json"]));
    assert_eq!(out, json!({"a": [1, 2], "n": {"x": ["old", "new"], "y": true}}));
}

#[test]
fn flatten_and_conflict() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "ok.json", &json!({"p": {"alice": 1}, "q": {"bob": 2}}));
    write_json(dir.path(), "clash.json", &json!({"p": {"alice": 1}, "q": {"alice": 2}}));

    let out = stdout_json(&rowmerge(dir.path(), &["flatten", "ok.json"]));
    assert_eq!(out, json!({"alice": 1, "bob": 2}));

    let clash = rowmerge(dir.path(), &["flatten", "clash.json"]);
    assert!(!clash.status.success());
    assert!(String::from_utf8_lossy(&clash.stderr).contains("alice"));
}

#[test]
fn group_id_from_stdin() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_rowmerge"))
        .args(["group-id", "-", "city", "c=country"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn rowmerge");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(br#"{"country": "fr", "city": "paris"}"#)
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "c_country:fr-city:paris"
    );
}

#[test]
fn unique_and_sum() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "list.json", &json!([1, 2, 1, "3", null]));

    let out = stdout_json(&rowmerge(dir.path(), &["unique", "list.json"]));
    assert_eq!(out, json!({"0": 1, "1": 2, "3": "3", "4": null}));

    let sum = rowmerge(dir.path(), &["sum", "list.json"]);
    assert!(sum.status.success());
    assert_eq!(String::from_utf8_lossy(&sum.stdout).trim(), "7");
}

#[test]
fn scalar_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "scalar.json", &json!(5));

    let output = rowmerge(dir.path(), &["unique", "scalar.json"]);
    assert!(!output.status.success());
}
