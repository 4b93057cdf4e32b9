use std::collections::HashSet;

use gx_feature::Fields;
use gx_types::Value;

use crate::context::ExpressionContext;
use crate::error::EvalError;
use crate::node::ExprNode;
use crate::parser;

/// A parsed expression plus its error state.
///
/// Parsing happens at construction. Evaluation error state is reset at
/// the start of every `evaluate`/`prepare` call, which is also why a
/// single instance must not be evaluated from two threads at once —
/// clone per thread from the same source text instead.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    root: Option<ExprNode>,
    parser_error: Option<String>,
    eval_error: Option<String>,
}

impl Expression {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let (root, parser_error) = match parser::parse_expression(source) {
            Ok(root) => (Some(root), None),
            Err(error) => (None, Some(error.to_string())),
        };
        Self {
            source: source.to_owned(),
            root,
            parser_error,
            eval_error: None,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn root(&self) -> Option<&ExprNode> {
        self.root.as_ref()
    }

    #[must_use]
    pub fn has_parser_error(&self) -> bool {
        self.parser_error.is_some()
    }

    #[must_use]
    pub fn parser_error_string(&self) -> Option<&str> {
        self.parser_error.as_deref()
    }

    #[must_use]
    pub fn has_eval_error(&self) -> bool {
        self.eval_error.is_some()
    }

    #[must_use]
    pub fn eval_error_string(&self) -> Option<&str> {
        self.eval_error.as_deref()
    }

    /// Bind column references against the context's field schema.
    /// Returns false and records the binding error when any reference
    /// fails to resolve; the caller decides whether to evaluate anyway.
    pub fn prepare(&mut self, context: &ExpressionContext) -> bool {
        self.eval_error = None;
        #[cfg(feature = "tracing")]
        tracing::trace!(source = %self.source, "preparing expression");
        let Some(root) = self.root.as_mut() else {
            self.eval_error = Some(EvalError::NoRootNode.to_string());
            return false;
        };
        match root.prepare(context) {
            Ok(()) => true,
            Err(error) => {
                self.eval_error = Some(error.to_string());
                false
            }
        }
    }

    /// Evaluate against a context. On error the result is NULL and the
    /// message is available from `eval_error_string`.
    pub fn evaluate(&mut self, context: &ExpressionContext) -> Value {
        self.eval_error = None;
        #[cfg(feature = "tracing")]
        tracing::trace!(source = %self.source, "evaluating expression");
        let Some(root) = self.root.as_ref() else {
            self.eval_error = Some(EvalError::NoRootNode.to_string());
            return Value::Null;
        };
        match root.eval(context) {
            Ok(value) => value,
            Err(error) => {
                self.eval_error = Some(error.to_string());
                Value::Null
            }
        }
    }

    /// Render the tree back to expression text.
    #[must_use]
    pub fn dump(&self) -> String {
        match &self.root {
            Some(root) => root.dump(),
            None => "(no root)".to_owned(),
        }
    }

    /// Column names the expression reads, deduplicated
    /// case-insensitively with the first spelling kept. May contain the
    /// all-attributes sentinel.
    #[must_use]
    pub fn referenced_columns(&self) -> Vec<String> {
        let Some(root) = &self.root else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for column in root.referenced_columns() {
            if seen.insert(column.to_lowercase()) {
                columns.push(column);
            }
        }
        columns
    }

    #[must_use]
    pub fn needs_geometry(&self) -> bool {
        self.root
            .as_ref()
            .is_some_and(ExprNode::needs_geometry)
    }

    /// Check expression text against a schema without keeping the
    /// expression around. Validity means the text parses; binding
    /// failures are left for the caller to inspect via `prepare`.
    #[must_use]
    pub fn is_valid(source: &str, fields: &Fields) -> bool {
        let mut expression = Self::new(source);
        expression.prepare(&ExpressionContext::with_fields(fields.clone()));
        !expression.has_parser_error()
    }

    /// Quote a string for embedding in expression text.
    #[must_use]
    pub fn quoted_string(text: &str) -> String {
        let escaped = text
            .replace('\\', "\\\\")
            .replace('\'', "''")
            .replace('\n', "\\n")
            .replace('\t', "\\t");
        format!("'{escaped}'")
    }

    /// Quote a column name for embedding in expression text.
    #[must_use]
    pub fn quoted_column_ref(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Interpret `text` as a plain number if possible, otherwise
    /// evaluate it as an expression; `fallback` on any failure.
    #[must_use]
    pub fn evaluate_to_double(text: &str, fallback: f64) -> f64 {
        if let Ok(direct) = text.trim().parse::<f64>() {
            return direct;
        }
        let mut expression = Self::new(text);
        let result = expression.evaluate(&ExpressionContext::new());
        if expression.has_eval_error() {
            return fallback;
        }
        result.to_double().unwrap_or(fallback)
    }
}
