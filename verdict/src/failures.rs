//! Ordered failure buckets keyed by structural path.
//!
//! A bucket is append-only: recording a failure never removes or reorders
//! earlier records. Buckets are created lazily by the evaluator, one per
//! distinct path (plus one base bucket), and their records are pulled out
//! once by the orchestrator after the rule has run.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::path::KeyPath;

/// One recorded validation failure.
///
/// The message identifier and arguments are opaque to this crate; the
/// downstream message renderer owns their interpretation. `path` is `None`
/// for base (whole-subject) failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub message: String,
    pub args: Map<String, Value>,
    pub path: Option<KeyPath>,
}

/// Append-only, ordered collection of failures for one path.
#[derive(Debug, Clone, Default)]
pub struct Failures {
    path: Option<KeyPath>,
    records: Vec<FailureRecord>,
}

impl Failures {
    /// Bucket for base failures (no path).
    pub(crate) fn base() -> Self {
        Failures::default()
    }

    /// Bucket for failures at `path`.
    pub(crate) fn at(path: KeyPath) -> Self {
        Failures {
            path: Some(path),
            records: Vec::new(),
        }
    }

    /// The path this bucket collects failures for; `None` for the base bucket.
    pub fn path(&self) -> Option<&KeyPath> {
        self.path.as_ref()
    }

    /// Record a failure with no arguments. Returns the bucket for chaining.
    pub fn failure(&mut self, message: impl Into<String>) -> &mut Self {
        self.failure_with(message, Map::new())
    }

    /// Record a failure with named arguments. Returns the bucket for chaining.
    pub fn failure_with(&mut self, message: impl Into<String>, args: Map<String, Value>) -> &mut Self {
        self.records.push(FailureRecord {
            message: message.into(),
            args,
            path: self.path.clone(),
        });
        self
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[FailureRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Chained appends accumulate in insertion order; nothing is replaced.
    #[test]
    fn appends_accumulate_in_order() {
        let mut bucket = Failures::at(KeyPath::key("age"));
        bucket.failure("too_young").failure("not_a_number");

        let messages: Vec<&str> = bucket.records().iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["too_young", "not_a_number"]);
    }

    #[test]
    fn records_carry_the_bucket_path() {
        let mut bucket = Failures::at(KeyPath::key("email"));
        bucket.failure("invalid");
        assert_eq!(bucket.records()[0].path, Some(KeyPath::key("email")));

        let mut base = Failures::base();
        base.failure("broken");
        assert_eq!(base.records()[0].path, None);
    }

    #[test]
    fn failure_with_preserves_arguments() {
        let mut bucket = Failures::base();
        let mut args = Map::new();
        args.insert("min".to_string(), json!(18));
        bucket.failure_with("too_young", args);

        assert_eq!(bucket.records()[0].args["min"], json!(18));
    }
}
