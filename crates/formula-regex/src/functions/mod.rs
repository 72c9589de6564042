use std::collections::HashMap;
use std::sync::OnceLock;

use crate::engine::{EngineConfig, RegexEngine};
use crate::value::{ErrorKind, Value};

mod builtins_regex;

pub use builtins_regex::{
    is_regex_match, regex_escape, regex_group_matches, regex_match, regex_match_groups,
    regex_matches, regex_replace, regex_version_number, GroupListing, MatchListing,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadSafety {
    ThreadSafe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Any,
    Number,
    Text,
    Bool,
}

/// One declared parameter of a worksheet function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub value_type: ValueType,
    pub optional: bool,
}

/// Host services available to function implementations.
pub trait FunctionContext {
    fn engine(&self) -> &RegexEngine;
}

/// The default [`FunctionContext`]: a regex engine configured once and shared by every call.
#[derive(Debug, Clone, Default)]
pub struct Session {
    engine: RegexEngine,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: RegexEngine::new(config),
        }
    }

    /// Convenience wrapper around [`call_function`].
    pub fn call(&self, name: &str, args: &[Value]) -> Value {
        call_function(self, name, args)
    }
}

impl FunctionContext for Session {
    fn engine(&self) -> &RegexEngine {
        &self.engine
    }
}

pub type FunctionImpl = fn(&dyn FunctionContext, &[Value]) -> Value;

#[derive(Clone, Copy)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub args: &'static [ArgSpec],
    pub min_args: usize,
    pub max_args: usize,
    pub thread_safety: ThreadSafety,
    pub return_type: ValueType,
    pub implementation: FunctionImpl,
}

impl std::fmt::Debug for FunctionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionSpec")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

inventory::collect!(FunctionSpec);

/// Iterate all [`FunctionSpec`] registrations collected via [`inventory`].
pub fn iter_function_specs() -> impl Iterator<Item = &'static FunctionSpec> {
    inventory::iter::<FunctionSpec>.into_iter()
}

fn registry() -> &'static HashMap<String, &'static FunctionSpec> {
    static REGISTRY: OnceLock<HashMap<String, &'static FunctionSpec>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map = HashMap::new();
        for spec in inventory::iter::<FunctionSpec> {
            map.insert(spec.name.to_ascii_uppercase(), spec);
        }
        map
    })
}

pub fn lookup_function(name: &str) -> Option<&'static FunctionSpec> {
    registry().get(&name.to_ascii_uppercase()).copied()
}

/// Evaluates a registered function. Arguments beyond `args.len()` are treated as omitted.
pub fn call_function(ctx: &dyn FunctionContext, name: &str, args: &[Value]) -> Value {
    let spec = match lookup_function(name) {
        Some(spec) => spec,
        None => return Value::Error(ErrorKind::Name),
    };

    if args.len() < spec.min_args || args.len() > spec.max_args {
        return Value::Error(ErrorKind::Value);
    }

    (spec.implementation)(ctx, args)
}

/// Argument `index`, or [`Value::Missing`] when the caller left it off.
pub(crate) fn arg(args: &[Value], index: usize) -> &Value {
    static MISSING: Value = Value::Missing;
    args.get(index).unwrap_or(&MISSING)
}
