//! Execution context for validation rules.
//!
//! This crate implements the environment in which a single validation
//! rule runs: an [`evaluator::Evaluator`] executes the rule's block plus
//! any attached macros, accumulates failures into per-path buckets,
//! forwards helper calls to the owning [`contract::Contract`], and
//! answers "has this path already failed?" queries against prior results.
//!
//! Everything here is pure and synchronous. Schema compilation, type
//! coercion, message rendering, and multi-rule orchestration live in the
//! surrounding system; this crate only collects structured failure
//! records, keyed by [`path::KeyPath`], and exposes accessors over the
//! current value snapshot. The one resource shared across concurrently
//! running rules is the [`store::SharedStore`] memoization map.

pub mod contract;
pub mod error;
pub mod evaluator;
pub mod failures;
mod macros;
pub mod path;
pub mod result;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
