//! Error taxonomy for rule evaluation.
//!
//! Only programming and configuration errors travel through `Result` here.
//! Validation failures are data: they are recorded in failure buckets and
//! returned from `Evaluator::failures`, never raised.

use thiserror::Error;

/// Errors that abort a single rule's execution.
///
/// None of these is caught inside this crate; they surface to the
/// orchestrator, which decides whether to fail the whole validation pass
/// or skip the offending rule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    /// Block-option projection referenced an option that was not supplied.
    /// A configuration error in the rule or macro declaration.
    #[error("block option projection references unknown option '{name}'")]
    MissingOption { name: String },

    /// A rule references a macro absent from the contract's registry.
    #[error("unknown macro '{name}'")]
    UnknownMacro { name: String },

    /// Neither the evaluator nor the owning contract exposes the invoked
    /// operation. A programming error in the rule body.
    #[error("unknown operation '{name}'")]
    UnknownOperation { name: String },
}
