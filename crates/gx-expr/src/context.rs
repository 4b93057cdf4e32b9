use std::collections::HashMap;
use std::sync::Arc;

use gx_feature::Fields;
use gx_types::{FeatureLike, Value};

use crate::registry::Function;

/// One named variable scope. Scopes also carry function overrides so a
/// caller can shadow a registry function for the duration of a scope.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    name: String,
    variables: HashMap<String, Value>,
    functions: HashMap<String, Arc<Function>>,
}

impl Scope {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: HashMap::new(),
            functions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set_function(&mut self, function: Function) {
        self.functions
            .insert(function.name().to_lowercase(), Arc::new(function));
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&Arc<Function>> {
        self.functions.get(&name.to_lowercase())
    }
}

/// A stack of scopes plus the two distinguished bindings: the feature
/// being evaluated and its field schema. Innermost scope shadows outer
/// ones on name collision.
///
/// Contexts are cheap; build one per batch (or per row) and do not share
/// one mutably across threads.
#[derive(Debug, Clone, Default)]
pub struct ExpressionContext {
    scopes: Vec<Scope>,
    feature: Option<Arc<dyn FeatureLike>>,
    fields: Option<Fields>,
}

impl ExpressionContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Context bound to a single record and its schema.
    #[must_use]
    pub fn with_feature(feature: Arc<dyn FeatureLike>, fields: Fields) -> Self {
        Self {
            scopes: Vec::new(),
            feature: Some(feature),
            fields: Some(fields),
        }
    }

    /// Context carrying only a schema, for preparing expressions before
    /// any record exists.
    #[must_use]
    pub fn with_fields(fields: Fields) -> Self {
        Self {
            scopes: Vec::new(),
            feature: None,
            fields: Some(fields),
        }
    }

    pub fn push_scope(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    pub fn pop_scope(&mut self) -> Option<Scope> {
        self.scopes.pop()
    }

    #[must_use]
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Set a variable in the innermost scope, creating one if the stack
    /// is empty.
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::new("local"));
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.set_variable(name, value);
        }
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.variable(name))
    }

    #[must_use]
    pub fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }

    /// Innermost function override for `name`, if any scope shadows it.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<Arc<Function>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.function(name))
            .cloned()
    }

    pub fn set_feature(&mut self, feature: Arc<dyn FeatureLike>) {
        self.feature = Some(feature);
    }

    #[must_use]
    pub fn feature(&self) -> Option<&Arc<dyn FeatureLike>> {
        self.feature.as_ref()
    }

    pub fn set_fields(&mut self, fields: Fields) {
        self.fields = Some(fields);
    }

    #[must_use]
    pub fn fields(&self) -> Option<&Fields> {
        self.fields.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use gx_types::Value;

    use super::{ExpressionContext, Scope};

    #[test]
    fn inner_scope_shadows_outer_on_collision() {
        let mut context = ExpressionContext::new();

        let mut outer = Scope::new("outer");
        outer.set_variable("who", Value::from("outer"));
        outer.set_variable("kept", Value::Int(1));
        context.push_scope(outer);

        let mut inner = Scope::new("inner");
        inner.set_variable("who", Value::from("inner"));
        context.push_scope(inner);

        assert_eq!(context.variable("who"), Some(&Value::from("inner")));
        assert_eq!(context.variable("kept"), Some(&Value::Int(1)));

        context.pop_scope();
        assert_eq!(context.variable("who"), Some(&Value::from("outer")));
    }

    #[test]
    fn set_variable_creates_a_scope_on_demand() {
        let mut context = ExpressionContext::new();
        assert_eq!(context.scope_count(), 0);
        context.set_variable("answer", Value::Int(42));
        assert_eq!(context.scope_count(), 1);
        assert_eq!(context.variable("answer"), Some(&Value::Int(42)));
    }

    #[test]
    fn unknown_variables_resolve_to_none() {
        let context = ExpressionContext::new();
        assert!(!context.has_variable("missing"));
        assert!(context.variable("missing").is_none());
    }
}
