//! Contract fixture loader.
//!
//! Each file at `contracts/http/{service}/{id}.json` describes one HTTP exchange:
//! the request to send, the expected status, and a subset of the expected body.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    pub service: String,
    /// Matches the filename stem.
    pub id: String,
    pub description: String,
    pub request: FixtureRequest,
    pub expect: FixtureExpect,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureRequest {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureExpect {
    pub status: u16,
    /// Every key here must appear in the response body with an equal value.
    #[serde(default)]
    pub body: Option<Value>,
}

/// Directory holding `contracts/`, found by walking up from the calling crate.
pub fn workspace_root() -> PathBuf {
    let start = std::env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::current_dir().unwrap());
    start
        .ancestors()
        .find(|dir| dir.join("contracts/http").is_dir())
        .unwrap_or(&start)
        .to_path_buf()
}

impl Fixture {
    /// Load one fixture, e.g. `Fixture::load("auth", "login_inactive")`.
    ///
    /// Panics if the file is missing or invalid.
    pub fn load(service: &str, id: &str) -> Self {
        let path = workspace_root()
            .join("contracts/http")
            .join(service)
            .join(format!("{id}.json"));
        Self::from_path(&path)
    }

    /// Load every fixture of a service, sorted by id.
    pub fn load_service(service: &str) -> Vec<Self> {
        let dir = workspace_root().join("contracts/http").join(service);
        let mut fixtures: Vec<Self> = std::fs::read_dir(&dir)
            .unwrap_or_else(|e| panic!("cannot read {}: {e}", dir.display()))
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .map(|path| Self::from_path(&path))
            .collect();
        fixtures.sort_by(|a, b| a.id.cmp(&b.id));
        fixtures
    }

    fn from_path(path: &Path) -> Self {
        let contents = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("fixture not found at {}: {e}", path.display()));
        serde_json::from_str(&contents)
            .unwrap_or_else(|e| panic!("invalid fixture {}: {e}", path.display()))
    }
}

/// Assert that `actual` contains every key of `expected` with an equal value,
/// recursing into objects.
pub fn assert_subset(expected: &Value, actual: &Value) {
    match (expected, actual) {
        (Value::Object(exp), Value::Object(act)) => {
            for (key, exp_val) in exp {
                let act_val = act
                    .get(key)
                    .unwrap_or_else(|| panic!("missing key {key:?} in {actual}"));
                assert_subset(exp_val, act_val);
            }
        }
        _ => assert_eq!(expected, actual),
    }
}
