#![forbid(unsafe_code)]

//! Translate expression trees into backend-native filter fragments.
//!
//! Translation is all-or-nothing: the first node a backend cannot
//! express fails the whole attempt, and the caller falls back to
//! in-process evaluation. `Unsupported` is a control-flow signal, not a
//! user-visible error.

use gx_expr::{BinaryOperator, ExprNode, Expression, UnaryOperator};
use gx_types::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("expression cannot be compiled for this backend")]
pub struct Unsupported;

const DEFAULT_UNSUPPORTED: &[BinaryOperator] = &[
    BinaryOperator::ILike,
    BinaryOperator::NotILike,
    BinaryOperator::IntDiv,
    BinaryOperator::Mod,
    BinaryOperator::Pow,
    BinaryOperator::Regexp,
    BinaryOperator::Concat,
];

/// Walks an AST and renders SQL-ish filter text. Backends override the
/// unsupported-operator set, the quoting rules, and (rarely) function or
/// CASE support.
pub trait QueryCompiler {
    /// Binary operators this backend declines. The default set is the
    /// common denominator: case-insensitive LIKE variants, integer
    /// division, modulo, power, regexp, and string concatenation.
    fn unsupported_operators(&self) -> &[BinaryOperator] {
        DEFAULT_UNSUPPORTED
    }

    fn quoted_identifier(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    fn quoted_value(&self, value: &Value) -> Result<String, Unsupported> {
        let rendered = match value {
            Value::Null => "NULL".to_owned(),
            Value::Int(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_owned(),
            Value::String(_) | Value::Date(_) | Value::Time(_) | Value::DateTime(_) => {
                format!("'{}'", value.to_text().replace('\'', "''"))
            }
            Value::Interval(_) | Value::Geometry(_) | Value::Feature(_) => {
                return Err(Unsupported);
            }
        };
        Ok(rendered)
    }

    /// Function calls are declined unless a concrete backend overrides.
    fn compile_function(&self, name: &str, args: &[ExprNode]) -> Result<String, Unsupported> {
        let _ = (name, args);
        Err(Unsupported)
    }

    /// CASE expressions are declined unless a concrete backend overrides.
    fn compile_condition(&self, node: &ExprNode) -> Result<String, Unsupported> {
        let _ = node;
        Err(Unsupported)
    }

    fn compile(&self, expression: &Expression) -> Result<String, Unsupported> {
        let root = expression.root().ok_or(Unsupported)?;
        self.compile_node(root)
    }

    fn compile_node(&self, node: &ExprNode) -> Result<String, Unsupported> {
        match node {
            ExprNode::Literal(value) => self.quoted_value(value),
            ExprNode::ColumnRef { name, .. } => Ok(self.quoted_identifier(name)),
            ExprNode::Unary { op, operand } => {
                let inner = self.compile_node(operand)?;
                Ok(match op {
                    UnaryOperator::Not => format!("NOT ({inner})"),
                    UnaryOperator::Minus => format!("-({inner})"),
                })
            }
            ExprNode::Binary { op, left, right } => {
                if self.unsupported_operators().contains(op) {
                    return Err(Unsupported);
                }
                let left = self.compile_node(left)?;
                let right = self.compile_node(right)?;
                Ok(format!("({left} {} {right})", op.text()))
            }
            ExprNode::InList {
                probe,
                candidates,
                not_in,
            } => {
                // The vacuous empty list has no SQL spelling.
                if candidates.is_empty() {
                    return Err(Unsupported);
                }
                let probe = self.compile_node(probe)?;
                let rendered = candidates
                    .iter()
                    .map(|candidate| self.compile_node(candidate))
                    .collect::<Result<Vec<_>, _>>()?
                    .join(", ");
                if *not_in {
                    Ok(format!("{probe} NOT IN ({rendered})"))
                } else {
                    Ok(format!("{probe} IN ({rendered})"))
                }
            }
            ExprNode::FunctionCall { fn_index, args } => {
                let function = gx_expr::function(*fn_index).ok_or(Unsupported)?;
                self.compile_function(function.name(), args)
            }
            ExprNode::Case { .. } => self.compile_condition(node),
        }
    }
}

/// A generic SQL dialect. The single flag covers backends that do accept
/// ILIKE natively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlCompiler {
    pub case_insensitive_like: bool,
}

impl SqlCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_case_insensitive_like() -> Self {
        Self {
            case_insensitive_like: true,
        }
    }
}

const UNSUPPORTED_KEEPING_ILIKE: &[BinaryOperator] = &[
    BinaryOperator::IntDiv,
    BinaryOperator::Mod,
    BinaryOperator::Pow,
    BinaryOperator::Regexp,
    BinaryOperator::Concat,
];

impl QueryCompiler for SqlCompiler {
    fn unsupported_operators(&self) -> &[BinaryOperator] {
        if self.case_insensitive_like {
            UNSUPPORTED_KEEPING_ILIKE
        } else {
            DEFAULT_UNSUPPORTED
        }
    }
}
