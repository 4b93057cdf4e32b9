use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use gx_types::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::ExpressionContext;
use crate::error::EvalError;
use crate::node::ExprNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    Exact(usize),
    Variadic,
}

impl Arity {
    #[must_use]
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Self::Exact(n) => *n == count,
            Self::Variadic => true,
        }
    }
}

pub type EagerFn =
    Arc<dyn Fn(&[Value], &ExpressionContext) -> Result<Value, EvalError> + Send + Sync>;
pub type LazyFn =
    Arc<dyn Fn(&[ExprNode], &ExpressionContext) -> Result<Value, EvalError> + Send + Sync>;

/// The two call shapes a function can take. Eager functions receive
/// evaluated values; lazy functions receive the raw argument nodes and
/// evaluate only the branches they need (this is what makes `if`
/// short-circuit).
#[derive(Clone)]
pub enum FunctionImpl {
    Eager(EagerFn),
    Lazy(LazyFn),
}

/// A named callable in the registry.
#[derive(Clone)]
pub struct Function {
    name: String,
    arity: Arity,
    group: String,
    aliases: Vec<String>,
    handles_null: bool,
    uses_geometry: bool,
    referenced_columns: Vec<String>,
    implementation: FunctionImpl,
}

impl Function {
    pub fn eager(
        name: impl Into<String>,
        arity: Arity,
        group: impl Into<String>,
        body: impl Fn(&[Value], &ExpressionContext) -> Result<Value, EvalError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            group: group.into(),
            aliases: Vec::new(),
            handles_null: false,
            uses_geometry: false,
            referenced_columns: Vec::new(),
            implementation: FunctionImpl::Eager(Arc::new(body)),
        }
    }

    pub fn lazy(
        name: impl Into<String>,
        arity: Arity,
        group: impl Into<String>,
        body: impl Fn(&[ExprNode], &ExpressionContext) -> Result<Value, EvalError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            group: group.into(),
            aliases: Vec::new(),
            handles_null: false,
            uses_geometry: false,
            referenced_columns: Vec::new(),
            implementation: FunctionImpl::Lazy(Arc::new(body)),
        }
    }

    #[must_use]
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|&a| a.to_owned()).collect();
        self
    }

    /// Opt out of automatic null propagation: the body sees NULL
    /// arguments instead of the call short-circuiting.
    #[must_use]
    pub fn with_handles_null(mut self) -> Self {
        self.handles_null = true;
        self
    }

    #[must_use]
    pub fn with_uses_geometry(mut self) -> Self {
        self.uses_geometry = true;
        self
    }

    #[must_use]
    pub fn with_referenced_columns(mut self, columns: &[&str]) -> Self {
        self.referenced_columns = columns.iter().map(|&c| c.to_owned()).collect();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn arity(&self) -> Arity {
        self.arity
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    #[must_use]
    pub fn handles_null(&self) -> bool {
        self.handles_null
    }

    #[must_use]
    pub fn uses_geometry(&self) -> bool {
        self.uses_geometry
    }

    #[must_use]
    pub fn referenced_columns(&self) -> &[String] {
        &self.referenced_columns
    }

    #[must_use]
    pub fn implementation(&self) -> &FunctionImpl {
        &self.implementation
    }

    #[must_use]
    pub fn is_lazy(&self) -> bool {
        matches!(self.implementation, FunctionImpl::Lazy(_))
    }

    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(name))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("a function named '{0}' is already registered")]
    DuplicateName(String),
    #[error("'{0}' is a built-in function and cannot be unregistered")]
    BuiltinImmutable(String),
    #[error("no registered function named '{0}'")]
    UnknownFunction(String),
}

/// The process-wide function table. Built-ins are installed on first
/// access and stay for the process lifetime; custom functions can come
/// and go behind the same lock.
pub struct FunctionRegistry {
    functions: Vec<Arc<Function>>,
    builtin_count: usize,
}

impl FunctionRegistry {
    fn with_builtins() -> Self {
        let functions = crate::builtins::all();
        let builtin_count = functions.len();
        Self {
            functions,
            builtin_count,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Arc<Function>> {
        self.functions.get(index).cloned()
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.functions
            .iter()
            .position(|function| function.matches_name(name))
    }

    pub fn register(&mut self, function: Function) -> Result<usize, RegistryError> {
        if self.index_of(function.name()).is_some() {
            return Err(RegistryError::DuplicateName(function.name().to_owned()));
        }
        if let Some(alias) = function
            .aliases()
            .iter()
            .find(|alias| self.index_of(alias).is_some())
        {
            return Err(RegistryError::DuplicateName(alias.clone()));
        }
        self.functions.push(Arc::new(function));
        Ok(self.functions.len() - 1)
    }

    pub fn unregister(&mut self, name: &str) -> Result<(), RegistryError> {
        let Some(index) = self.index_of(name) else {
            return Err(RegistryError::UnknownFunction(name.to_owned()));
        };
        if index < self.builtin_count {
            return Err(RegistryError::BuiltinImmutable(name.to_owned()));
        }
        self.functions.remove(index);
        Ok(())
    }
}

fn global() -> &'static RwLock<FunctionRegistry> {
    static REGISTRY: OnceLock<RwLock<FunctionRegistry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(FunctionRegistry::with_builtins()))
}

/// Fetch a function by registry index.
#[must_use]
pub fn function(index: usize) -> Option<Arc<Function>> {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(index)
}

/// Resolve a name (or alias, case-insensitively) to a registry index.
#[must_use]
pub fn function_index(name: &str) -> Option<usize> {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .index_of(name)
}

#[must_use]
pub fn is_function_name(name: &str) -> bool {
    function_index(name).is_some()
}

#[must_use]
pub fn function_count() -> usize {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}

/// Register a custom function in the process-wide table.
pub fn register_function(function: Function) -> Result<usize, RegistryError> {
    global()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(function)
}

/// Remove a previously registered custom function. Built-ins are
/// immutable for the process lifetime.
pub fn unregister_function(name: &str) -> Result<(), RegistryError> {
    global()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .unregister(name)
}
