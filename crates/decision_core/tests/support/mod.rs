#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

/// Write `artifact` as JSON under `dir` and return its path.
pub fn write_artifact(dir: &Path, file_name: &str, artifact: &Value) -> PathBuf {
    let path = dir.join(file_name);
    let body = serde_json::to_string_pretty(artifact).expect("artifact should serialize");
    fs::write(&path, body).expect("artifact should be writable");
    path
}

/// Linear fare model: `intercept + coefficients · x`.
pub fn linear_fare_artifact(intercept: f64, coefficients: [f64; 6]) -> Value {
    json!({
        "kind": "linear_regression",
        "feature_names": decision_core::FEATURE_NAMES,
        "intercept": intercept,
        "coefficients": coefficients,
    })
}

/// Single-leaf classification forest that always predicts `positive` for class 1.
pub fn constant_match_forest(positive: f64) -> Value {
    json!({
        "kind": "tree_ensemble",
        "task": "classification",
        "trees": [
            {"nodes": [{"value": [1.0 - positive, positive]}]}
        ]
    })
}
