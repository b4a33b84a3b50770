//! Macro resolution and application within an evaluator.

use serde_json::json;
use tracing::debug;

use crate::contract::MacroRef;
use crate::error::ContextError;
use crate::evaluator::{Evaluator, ProjectedOptions};

/// Resolve `macro_ref` against the contract's registry and run its block
/// inside `evaluator`.
///
/// The macro's declared option names are projected from the evaluator's
/// full option set, seeded with a `"macro"` entry describing the
/// invocation (name and arguments), so macro bodies receive their own
/// arguments through the same projection mechanism as rule blocks. A name
/// that resolves to nothing is a configuration error.
pub(crate) fn apply(evaluator: &mut Evaluator, macro_ref: &MacroRef) -> Result<(), ContextError> {
    let resolved = evaluator.contract().macros().resolve(&macro_ref.name)?.clone();

    let seed = json!({ "name": macro_ref.name, "args": macro_ref.args });
    let mut projected = ProjectedOptions::new();
    for name in resolved.declared_options() {
        let value = if name == "macro" {
            Some(seed.clone())
        } else {
            evaluator.option_by_name(name)
        };
        let value = value.ok_or_else(|| ContextError::MissingOption { name: name.clone() })?;
        projected.insert(name.clone(), value);
    }

    debug!(name = %macro_ref.name, "applying macro");
    (resolved.block())(evaluator, &projected)
}
