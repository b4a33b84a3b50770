//! Read-only views over previously accumulated validation results.

use crate::failures::FailureRecord;
use crate::path::KeyPath;

/// Read-only interface over failures recorded by earlier rules in the
/// same validation pass.
///
/// An evaluator's `error_at` delegates here; it never reflects the
/// evaluator's own still-pending failures.
pub trait ResultView: Send + Sync {
    /// True if `path` already carries a failure.
    fn has_failure_at(&self, path: &KeyPath) -> bool;
}

/// Accumulated validation results.
///
/// The orchestrator merges each finished evaluator's failures into one of
/// these, then hands it to later evaluators as their [`ResultView`].
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: Vec<FailureRecord>,
}

impl ResultSet {
    pub fn new() -> Self {
        ResultSet::default()
    }

    /// Append `records` (one evaluator's aggregated failures).
    pub fn merge(&mut self, records: Vec<FailureRecord>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[FailureRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ResultView for ResultSet {
    fn has_failure_at(&self, path: &KeyPath) -> bool {
        self.records.iter().any(|record| match &record.path {
            Some(recorded) => recorded == path,
            // Base failures apply to the subject as a whole.
            None => path.is_root(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn record(message: &str, path: Option<KeyPath>) -> FailureRecord {
        FailureRecord {
            message: message.to_string(),
            args: Map::new(),
            path,
        }
    }

    #[test]
    fn merged_records_answer_path_queries() {
        let mut results = ResultSet::new();
        results.merge(vec![record("invalid", Some(KeyPath::key("email")))]);

        assert!(results.has_failure_at(&KeyPath::key("email")));
        assert!(!results.has_failure_at(&KeyPath::key("age")));
    }

    /// Base failures (no path) count as failures at root.
    #[test]
    fn base_records_match_root() {
        let mut results = ResultSet::new();
        results.merge(vec![record("broken", None)]);

        assert!(results.has_failure_at(&KeyPath::root()));
        assert!(!results.has_failure_at(&KeyPath::key("email")));
    }

    #[test]
    fn merge_preserves_order_across_calls() {
        let mut results = ResultSet::new();
        results.merge(vec![record("first", None)]);
        results.merge(vec![record("second", None)]);

        let messages: Vec<&str> = results.records().iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }
}
