//! Owning-contract capability interface and macro registry.
//!
//! A rule body may call helper operations defined on its contract as if
//! they were local; the evaluator forwards anything it does not handle
//! itself through the [`Contract`] trait. The same trait carries the
//! macro registry, so macro resolution is a contract concern too.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ContextError;
use crate::evaluator::{Evaluator, ProjectedOptions};

/// Block signature shared by rules and macros.
///
/// The evaluator is the explicit receiver; projected options arrive as
/// named arguments. Blocks are `Send + Sync` so sibling evaluators can run
/// on worker threads.
pub type Block =
    Arc<dyn Fn(&mut Evaluator, &ProjectedOptions) -> Result<(), ContextError> + Send + Sync>;

/// Wrap a closure as a [`Block`].
pub fn block<F>(body: F) -> Block
where
    F: Fn(&mut Evaluator, &ProjectedOptions) -> Result<(), ContextError> + Send + Sync + 'static,
{
    Arc::new(body)
}

/// Named reusable rule fragment registered on a contract.
#[derive(Clone)]
pub struct Macro {
    name: String,
    declared_options: Vec<String>,
    block: Block,
}

impl Macro {
    /// A macro with a name, the option names its block expects, and a body.
    pub fn new(name: impl Into<String>, declared_options: Vec<String>, block: Block) -> Self {
        Macro {
            name: name.into(),
            declared_options,
            block,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Option names projected into the block when the macro runs.
    pub fn declared_options(&self) -> &[String] {
        &self.declared_options
    }

    pub fn block(&self) -> &Block {
        &self.block
    }
}

/// A macro invocation attached to a rule: name plus arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroRef {
    pub name: String,
    pub args: Vec<Value>,
}

impl MacroRef {
    pub fn new(name: impl Into<String>) -> Self {
        MacroRef {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<Value>) -> Self {
        MacroRef {
            name: name.into(),
            args,
        }
    }
}

/// Macros exposed by a contract, resolved by name.
#[derive(Clone, Default)]
pub struct MacroRegistry {
    macros: BTreeMap<String, Macro>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        MacroRegistry::default()
    }

    /// Register `entry` under its own name, replacing any previous macro.
    pub fn register(&mut self, entry: Macro) {
        self.macros.insert(entry.name().to_string(), entry);
    }

    /// Resolve a macro by name. A miss is a configuration error.
    pub fn resolve(&self, name: &str) -> Result<&Macro, ContextError> {
        self.macros.get(name).ok_or_else(|| ContextError::UnknownMacro {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }
}

/// Capability object for the contract owning a rule.
///
/// The evaluator probes with [`Contract::supports`] before forwarding, so
/// host tooling can introspect available operations without invoking them.
/// Implementations expose every helper a rule body may call; there is no
/// public/private distinction at this seam.
pub trait Contract: Send + Sync {
    /// True if `name` is an operation this contract can run.
    fn supports(&self, name: &str) -> bool;

    /// Run the named helper operation.
    fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, ContextError>;

    /// The contract's macro registry.
    fn macros(&self) -> &MacroRegistry;
}

type Helper = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Minimal concrete contract: named helper closures plus a macro registry.
///
/// Enough for using the crate without the surrounding orchestration layer;
/// full contract implementations live upstream.
#[derive(Clone, Default)]
pub struct SimpleContract {
    helpers: BTreeMap<String, Helper>,
    macros: MacroRegistry,
}

impl SimpleContract {
    pub fn new() -> Self {
        SimpleContract::default()
    }

    /// Add a named helper operation (builder style).
    pub fn with_helper<F>(mut self, name: impl Into<String>, helper: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Arc::new(helper));
        self
    }

    /// Register a macro (builder style).
    pub fn with_macro(mut self, entry: Macro) -> Self {
        self.macros.register(entry);
        self
    }
}

impl Contract for SimpleContract {
    fn supports(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, ContextError> {
        match self.helpers.get(name) {
            Some(helper) => Ok(helper(args)),
            None => Err(ContextError::UnknownOperation {
                name: name.to_string(),
            }),
        }
    }

    fn macros(&self) -> &MacroRegistry {
        &self.macros
    }
}
