//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use serde_json::{json, Value};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub const TOP: &str = r#"GOALS top
{
    goal G1
    {
        summary:'''top goal''';
        inContextOf: env.C1;
    }
}
"#;

pub const ENV: &str = r#"CONTEXTS env
{
    context C1
    {
        info:'''operating environment''';
    }
    context C2 { }
}
"#;

pub const EVIDENCE: &str = r#"SOLUTIONS ev
{
    solution Sn1
    {
        status:NotReviewed;
        artifact:"file:///reports/test.pdf";
    }
}
"#;

/// Create a model directory holding `a_top.gsn`, `b_env.gsn` and `c_evidence.gsn`, loaded in
/// that order.
#[allow(dead_code)]
pub fn create_test_model(temp_dir: &TempDir) -> PathBuf {
    let model = temp_dir.path().join("model");
    std::fs::create_dir(&model).unwrap();
    std::fs::write(model.join("a_top.gsn"), TOP).unwrap();
    std::fs::write(model.join("b_env.gsn"), ENV).unwrap();
    std::fs::write(model.join("c_evidence.gsn"), EVIDENCE).unwrap();
    model
}

/// File name to content for every file directly in `dir`.
#[allow(dead_code)]
pub fn snapshot(dir: &Path) -> BTreeMap<String, String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| {
            (
                e.file_name().to_string_lossy().to_string(),
                std::fs::read_to_string(e.path()).unwrap(),
            )
        })
        .collect()
}

#[allow(dead_code)]
pub fn payload(dir: &Path) -> String {
    json!({ "modelDir": dir }).to_string()
}

#[allow(dead_code)]
pub fn update_payload(dir: &Path, commands: Value) -> String {
    json!({ "modelDir": dir, "commandList": commands }).to_string()
}

/// Parse a projection and return the record with `id`.
#[allow(dead_code)]
pub fn record(json: &str, id: &str) -> Option<Value> {
    let records: Vec<Value> = serde_json::from_str(json)
        .unwrap_or_else(|e| panic!("expected projection JSON, got {json:?}: {e}"));
    records.into_iter().find(|r| r["id"] == id)
}
