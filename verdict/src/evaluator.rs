//! Execution context for a single validation rule.
//!
//! An [`Evaluator`] is constructed per rule invocation by the orchestrator.
//! Construction runs the rule block (if any) and then each attached macro
//! in declaration order; the only observable output is the set of failure
//! buckets, pulled once afterwards via [`Evaluator::failures`]. Everything
//! here is pure and synchronous: no I/O, no suspension points.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::contract::{Block, Contract, MacroRef};
use crate::error::ContextError;
use crate::failures::{FailureRecord, Failures};
use crate::macros;
use crate::path::KeyPath;
use crate::result::{ResultSet, ResultView};
use crate::store::SharedStore;

/// Projected options handed to a rule or macro block as named arguments.
pub type ProjectedOptions = Map<String, Value>;

/// Read-only value snapshot for one rule invocation.
///
/// Shared, never mutated by the evaluator; sibling evaluators may read the
/// same snapshot concurrently.
pub type Values = Arc<Map<String, Value>>;

/// Options supplied when constructing an [`Evaluator`].
///
/// Stored verbatim on the evaluator so [`Evaluator::with`] can merge
/// overrides over them.
#[derive(Clone)]
pub struct Options {
    /// Prior results from earlier rules in this validation pass.
    pub result: Arc<dyn ResultView>,
    /// Key identifiers this rule declares as its subject(s); empty for
    /// whole-object rules.
    pub keys: Vec<String>,
    /// The data under validation.
    pub values: Values,
    /// Pass-wide memoization store, handed by reference (clone shares it).
    pub store: SharedStore,
    /// Macro invocations to run after the rule block, in order.
    pub macros: Vec<MacroRef>,
    /// Explicit default-path override. When unset, the default path is
    /// derived from the first key.
    pub path: Option<KeyPath>,
    /// Projection mapping: block argument name -> stored option name.
    pub block_options: BTreeMap<String, String>,
    /// Free-form options visible to projection and `with` merging.
    pub custom: Map<String, Value>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            result: Arc::new(ResultSet::new()),
            keys: Vec::new(),
            values: Arc::new(Map::new()),
            store: SharedStore::new(),
            macros: Vec::new(),
            path: None,
            block_options: BTreeMap::new(),
            custom: Map::new(),
        }
    }
}

impl Options {
    /// Merge `overrides` over this option set; overrides win per field and
    /// per custom-option name. The store and result handles are cloned, so
    /// the derived evaluator shares the same underlying objects.
    fn merged(&self, overrides: OptionOverrides) -> Options {
        let mut options = self.clone();
        if let Some(keys) = overrides.keys {
            options.keys = keys;
        }
        if let Some(values) = overrides.values {
            options.values = values;
        }
        if let Some(path) = overrides.path {
            options.path = Some(path);
        }
        if let Some(macros) = overrides.macros {
            options.macros = macros;
        }
        if let Some(block_options) = overrides.block_options {
            options.block_options = block_options;
        }
        for (name, value) in overrides.custom {
            options.custom.insert(name, value);
        }
        options
    }
}

/// Partial option set merged over an evaluator's stored options by
/// [`Evaluator::with`]. Unset fields keep the current value.
#[derive(Clone, Default)]
pub struct OptionOverrides {
    pub keys: Option<Vec<String>>,
    pub values: Option<Values>,
    pub path: Option<KeyPath>,
    pub macros: Option<Vec<MacroRef>>,
    pub block_options: Option<BTreeMap<String, String>>,
    /// Merged entry-wise over the current custom options; new values win.
    pub custom: Map<String, Value>,
}

/// Operations the evaluator answers itself before delegating to the
/// contract. Mirrors the public convenience accessors.
const LOCAL_OPERATIONS: &[&str] = &["key_name", "value", "key?", "error?"];

/// Evaluation environment for one rule.
pub struct Evaluator {
    contract: Arc<dyn Contract>,
    options: Options,
    base: Option<Failures>,
    // Insertion-ordered: per-path aggregation follows first-request order.
    buckets: Vec<(KeyPath, Failures)>,
}

impl Evaluator {
    /// Construct the evaluator and execute `block` plus any attached
    /// macros against it.
    ///
    /// Projection errors and macro-resolution misses abort execution and
    /// surface unchanged; validation failures recorded by the block never
    /// abort it.
    pub fn new(
        contract: Arc<dyn Contract>,
        options: Options,
        block: Option<Block>,
    ) -> Result<Evaluator, ContextError> {
        let mut evaluator = Evaluator {
            contract,
            options,
            base: None,
            buckets: Vec::new(),
        };

        if let Some(block) = block {
            let projected = evaluator.project_block_options()?;
            debug!(path = %evaluator.default_path(), "running rule block");
            block(&mut evaluator, &projected)?;
        }

        let macro_refs = evaluator.options.macros.clone();
        for macro_ref in &macro_refs {
            macros::apply(&mut evaluator, macro_ref)?;
        }

        Ok(evaluator)
    }

    /// The stored option set (as supplied, plus any `with` merging).
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub(crate) fn contract(&self) -> &Arc<dyn Contract> {
        &self.contract
    }

    /// The pass-wide memoization store.
    pub fn store(&self) -> &SharedStore {
        &self.options.store
    }

    /// The read-only value snapshot.
    pub fn values(&self) -> &Values {
        &self.options.values
    }

    /// Default path: explicit override, else the first declared key, else root.
    pub fn default_path(&self) -> KeyPath {
        if let Some(path) = &self.options.path {
            return path.clone();
        }
        match self.options.keys.first() {
            Some(key) => KeyPath::key(key),
            None => KeyPath::root(),
        }
    }

    /// Failure bucket for base (path-less) failures. Created on first
    /// access; repeated calls return the same bucket.
    pub fn base(&mut self) -> &mut Failures {
        self.base.get_or_insert_with(|| {
            trace!("creating base failure bucket");
            Failures::base()
        })
    }

    /// Failure bucket for the default path. See [`Evaluator::key_at`].
    pub fn key(&mut self) -> &mut Failures {
        let path = self.default_path();
        self.key_at(path)
    }

    /// Failure bucket at `path`. Created on first access per distinct
    /// path; repeated calls with an equal path return the same bucket, so
    /// failures accumulate rather than replace.
    pub fn key_at(&mut self, path: impl Into<KeyPath>) -> &mut Failures {
        let path = path.into();
        if let Some(index) = self.buckets.iter().position(|(existing, _)| *existing == path) {
            return &mut self.buckets[index].1;
        }
        trace!(%path, "creating failure bucket");
        self.buckets.push((path.clone(), Failures::at(path)));
        let last = self.buckets.len() - 1;
        &mut self.buckets[last].1
    }

    /// Aggregate all recorded failures: base records first, then per-path
    /// records grouped by the order their paths were first requested, each
    /// group in insertion order.
    ///
    /// Terminal read for the orchestrator, but safe to call repeatedly:
    /// each call reflects everything recorded up to that point.
    pub fn failures(&self) -> Vec<FailureRecord> {
        let mut records = Vec::new();
        if let Some(base) = &self.base {
            records.extend_from_slice(base.records());
        }
        for (_, bucket) in &self.buckets {
            records.extend_from_slice(bucket.records());
        }
        records
    }

    /// First declared key identifier; `None` for whole-object rules.
    pub fn key_name(&self) -> Option<&str> {
        self.options.keys.first().map(String::as_str)
    }

    /// The value under the first declared key; `None` for whole-object
    /// rules or when the snapshot has no entry for the key.
    pub fn value(&self) -> Option<&Value> {
        self.options.values.get(self.key_name()?)
    }

    /// True if the snapshot has an entry for the first declared key.
    /// Presence, not truthiness: an explicit `null` entry counts.
    pub fn has_key(&self) -> bool {
        self.key_name()
            .is_some_and(|name| self.options.values.contains_key(name))
    }

    /// True if `path` already carries a failure from a prior rule in this
    /// pass. Never reflects this evaluator's own pending failures.
    pub fn error_at(&self, path: &KeyPath) -> bool {
        self.options.result.has_failure_at(path)
    }

    /// Capability probe: true if the evaluator or its contract can run
    /// `name`. Lets host tooling introspect without invoking.
    pub fn supports(&self, name: &str) -> bool {
        LOCAL_OPERATIONS.contains(&name) || self.contract.supports(name)
    }

    /// Invoke a named operation, trying the evaluator's own operations
    /// first and falling back to the owning contract.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, ContextError> {
        match name {
            "key_name" => Ok(self
                .key_name()
                .map_or(Value::Null, |key| Value::String(key.to_string()))),
            "value" => Ok(self.value().cloned().unwrap_or(Value::Null)),
            "key?" => Ok(Value::Bool(self.has_key())),
            "error?" => {
                let path = args
                    .first()
                    .and_then(Value::as_str)
                    .map_or_else(KeyPath::root, KeyPath::from);
                Ok(Value::Bool(self.error_at(&path)))
            }
            _ if self.contract.supports(name) => self.contract.invoke(name, args),
            _ => Err(ContextError::UnknownOperation {
                name: name.to_string(),
            }),
        }
    }

    /// Build a sibling evaluator with `overrides` merged over the stored
    /// options (overrides win) and run `block` in it.
    ///
    /// The contract and store handles are reused, so memoized values stay
    /// visible; the sibling owns fresh failure buckets and is returned so
    /// the caller can pull or merge its failures.
    pub fn with(&self, overrides: OptionOverrides, block: Block) -> Result<Evaluator, ContextError> {
        let options = self.options.merged(overrides);
        Evaluator::new(Arc::clone(&self.contract), options, Some(block))
    }

    /// Project the block-options mapping into named arguments: each block
    /// argument name is looked up by its source option name. An absent
    /// source is a configuration error, never silently defaulted.
    fn project_block_options(&self) -> Result<ProjectedOptions, ContextError> {
        let mut projected = ProjectedOptions::new();
        for (name, source) in &self.options.block_options {
            let value = self
                .option_by_name(source)
                .ok_or_else(|| ContextError::MissingOption {
                    name: source.clone(),
                })?;
            projected.insert(name.clone(), value);
        }
        Ok(projected)
    }

    /// Look up a stored option by name as a plain value. Built-in options
    /// come first; anything else resolves against the custom set. Handle
    /// options (store, result view) are not value-representable and not
    /// projectable.
    pub(crate) fn option_by_name(&self, name: &str) -> Option<Value> {
        match name {
            "keys" => Some(Value::Array(
                self.options
                    .keys
                    .iter()
                    .map(|key| Value::String(key.clone()))
                    .collect(),
            )),
            "values" => Some(Value::Object((*self.options.values).clone())),
            "path" => Some(Value::String(self.default_path().to_string())),
            _ => self.options.custom.get(name).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{SimpleContract, block};
    use serde_json::json;

    fn contract() -> Arc<SimpleContract> {
        Arc::new(SimpleContract::new())
    }

    #[test]
    fn default_path_prefers_override_then_first_key() {
        let keyed = Evaluator::new(
            contract(),
            Options {
                keys: vec!["age".to_string()],
                ..Options::default()
            },
            None,
        )
        .expect("construct");
        assert_eq!(keyed.default_path(), KeyPath::key("age"));

        let overridden = Evaluator::new(
            contract(),
            Options {
                keys: vec!["age".to_string()],
                path: Some(KeyPath::key("details")),
                ..Options::default()
            },
            None,
        )
        .expect("construct");
        assert_eq!(overridden.default_path(), KeyPath::key("details"));

        let whole_object = Evaluator::new(contract(), Options::default(), None).expect("construct");
        assert_eq!(whole_object.default_path(), KeyPath::root());
    }

    /// Projection of a name absent from the stored options fails fast at
    /// construction, before the block runs.
    #[test]
    fn missing_projected_option_is_a_configuration_error() {
        let mut block_options = BTreeMap::new();
        block_options.insert("limit".to_string(), "max_age".to_string());

        let err = Evaluator::new(
            contract(),
            Options {
                block_options,
                ..Options::default()
            },
            Some(block(|_, _| panic!("block must not run"))),
        )
        .map(|_| ())
        .expect_err("projection must fail");

        assert_eq!(
            err,
            ContextError::MissingOption {
                name: "max_age".to_string()
            }
        );
    }

    #[test]
    fn custom_options_project_into_block_arguments() {
        let mut block_options = BTreeMap::new();
        block_options.insert("limit".to_string(), "max_age".to_string());
        let mut custom = Map::new();
        custom.insert("max_age".to_string(), json!(65));

        let evaluator = Evaluator::new(
            contract(),
            Options {
                keys: vec!["age".to_string()],
                block_options,
                custom,
                ..Options::default()
            },
            Some(block(|evaluator, opts| {
                assert_eq!(opts["limit"], json!(65));
                evaluator.key().failure("over_limit");
                Ok(())
            })),
        )
        .expect("construct");

        assert_eq!(evaluator.failures().len(), 1);
    }

    /// Whole-object rules have no key name, no value, and no key presence.
    #[test]
    fn empty_keys_yield_absent_accessors() {
        let evaluator = Evaluator::new(contract(), Options::default(), None).expect("construct");
        assert_eq!(evaluator.key_name(), None);
        assert_eq!(evaluator.value(), None);
        assert!(!evaluator.has_key());
    }

    /// Presence governs `has_key`, not truthiness: an explicit null entry
    /// still counts as present.
    #[test]
    fn has_key_sees_explicit_null() {
        let mut values = Map::new();
        values.insert("age".to_string(), Value::Null);

        let evaluator = Evaluator::new(
            contract(),
            Options {
                keys: vec!["age".to_string()],
                values: Arc::new(values),
                ..Options::default()
            },
            None,
        )
        .expect("construct");

        assert!(evaluator.has_key());
        assert_eq!(evaluator.value(), Some(&Value::Null));
    }

    #[test]
    fn aggregation_reflects_failures_added_after_a_prior_call() {
        let mut evaluator =
            Evaluator::new(contract(), Options::default(), None).expect("construct");
        evaluator.base().failure("first");
        assert_eq!(evaluator.failures().len(), 1);

        evaluator.base().failure("second");
        let messages: Vec<String> = evaluator
            .failures()
            .into_iter()
            .map(|record| record.message)
            .collect();
        assert_eq!(messages, vec!["first", "second"]);
    }
}
