//! Test-only helpers for constructing snapshots, contracts, and options.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::contract::SimpleContract;
use crate::evaluator::{Options, Values};

/// Build a value snapshot from a JSON object literal.
///
/// Panics on non-object input; tests should only pass objects.
pub fn snapshot(value: Value) -> Values {
    match value {
        Value::Object(map) => Arc::new(map),
        other => panic!("snapshot requires a JSON object, got {other}"),
    }
}

/// Empty snapshot for whole-object rules.
pub fn empty_snapshot() -> Values {
    Arc::new(Map::new())
}

/// A contract with no helpers and no macros.
pub fn bare_contract() -> Arc<SimpleContract> {
    Arc::new(SimpleContract::new())
}

/// Options for a single-key rule over `values`.
pub fn options_for(key: &str, values: Values) -> Options {
    Options {
        keys: vec![key.to_string()],
        values,
        ..Options::default()
    }
}
