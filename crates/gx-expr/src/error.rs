use gx_types::ValueError;
use thiserror::Error;

/// Evaluation-time failure. The first error anywhere in the tree aborts
/// the whole pass; ancestors never keep computing past a failed child.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("no root node; parsing failed")]
    NoRootNode,
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),
    #[error("unary minus only for numeric values")]
    UnaryMinusNonNumeric,
    #[error("cannot perform /, * or % on datetime and interval")]
    DateTimeIntervalArithmetic,
    #[error("invalid regular expression '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },
    #[error("cannot convert '{0}' to color")]
    NotAColor(String),
    #[error("unknown color component '{0}'")]
    UnknownColorComponent(String),
    /// Domain violations and arity misuse inside function bodies.
    #[error("{0}")]
    Function(String),
}
