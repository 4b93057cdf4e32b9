use chrono::Duration;
use gx_types::{Tvl, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::context::ExpressionContext;
use crate::error::EvalError;
use crate::registry::{self, FunctionImpl};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOperator {
    Not,
    Minus,
}

impl UnaryOperator {
    #[must_use]
    pub fn text(&self) -> &'static str {
        match self {
            Self::Not => "NOT",
            Self::Minus => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOperator {
    Or,
    And,
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    Regexp,
    Like,
    NotLike,
    ILike,
    NotILike,
    Is,
    IsNot,
    Plus,
    Minus,
    Mul,
    Div,
    IntDiv,
    Mod,
    Pow,
    Concat,
}

impl BinaryOperator {
    #[must_use]
    pub fn text(&self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Regexp => "~",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::ILike => "ILIKE",
            Self::NotILike => "NOT ILIKE",
            Self::Is => "IS",
            Self::IsNot => "IS NOT",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::IntDiv => "//",
            Self::Mod => "%",
            Self::Pow => "^",
            Self::Concat => "||",
        }
    }

    /// Binding strength, low to high. Must agree with the parser's
    /// descent order or dumped text stops round-tripping.
    #[must_use]
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq
            | Self::Ne
            | Self::Le
            | Self::Ge
            | Self::Lt
            | Self::Gt
            | Self::Regexp
            | Self::Like
            | Self::NotLike
            | Self::ILike
            | Self::NotILike
            | Self::Is
            | Self::IsNot => 3,
            Self::Plus | Self::Minus => 4,
            Self::Mul | Self::Div | Self::IntDiv | Self::Mod => 5,
            Self::Pow => 6,
            Self::Concat => 7,
        }
    }

    #[must_use]
    pub fn left_associative(&self) -> bool {
        !matches!(self, Self::Pow)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhenThen {
    pub when: ExprNode,
    pub then: ExprNode,
}

/// One node of an expression tree. Compound variants exclusively own
/// their children; the tree has no sharing and no cycles.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    Literal(Value),
    ColumnRef {
        name: String,
        index: Option<usize>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<ExprNode>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<ExprNode>,
        right: Box<ExprNode>,
    },
    InList {
        probe: Box<ExprNode>,
        candidates: Vec<ExprNode>,
        not_in: bool,
    },
    FunctionCall {
        fn_index: usize,
        args: Vec<ExprNode>,
    },
    Case {
        branches: Vec<WhenThen>,
        else_expr: Option<Box<ExprNode>>,
    },
}

impl ExprNode {
    pub fn eval(&self, context: &ExpressionContext) -> Result<Value, EvalError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::ColumnRef { name, index } => eval_column_ref(name, *index, context),
            Self::Unary { op, operand } => eval_unary(*op, operand, context),
            Self::Binary { op, left, right } => eval_binary(*op, left, right, context),
            Self::InList {
                probe,
                candidates,
                not_in,
            } => eval_in(probe, candidates, *not_in, context),
            Self::FunctionCall { fn_index, args } => eval_function(*fn_index, args, context),
            Self::Case {
                branches,
                else_expr,
            } => eval_case(branches, else_expr.as_deref(), context),
        }
    }

    /// Bind column references against the context's field schema. Safe to
    /// repeat with the same schema; the resolved index is simply
    /// recomputed.
    pub fn prepare(&mut self, context: &ExpressionContext) -> Result<(), EvalError> {
        match self {
            Self::Literal(_) => Ok(()),
            Self::ColumnRef { name, index } => {
                let resolved = context
                    .fields()
                    .and_then(|fields| fields.index_of(name));
                *index = resolved;
                match resolved {
                    Some(_) => Ok(()),
                    None => Err(EvalError::ColumnNotFound(name.clone())),
                }
            }
            Self::Unary { operand, .. } => operand.prepare(context),
            Self::Binary { left, right, .. } => {
                left.prepare(context)?;
                right.prepare(context)
            }
            Self::InList {
                probe, candidates, ..
            } => {
                probe.prepare(context)?;
                for candidate in candidates {
                    candidate.prepare(context)?;
                }
                Ok(())
            }
            Self::FunctionCall { args, .. } => {
                for arg in args {
                    arg.prepare(context)?;
                }
                Ok(())
            }
            Self::Case {
                branches,
                else_expr,
            } => {
                for branch in branches {
                    branch.when.prepare(context)?;
                    branch.then.prepare(context)?;
                }
                if let Some(else_expr) = else_expr {
                    else_expr.prepare(context)?;
                }
                Ok(())
            }
        }
    }

    /// Render the node back to expression text, parenthesizing children
    /// only where precedence or associativity requires it.
    #[must_use]
    pub fn dump(&self) -> String {
        match self {
            Self::Literal(value) => dump_literal(value),
            Self::ColumnRef { name, .. } => dump_column_ref(name),
            Self::Unary { op, operand } => dump_unary(*op, operand),
            Self::Binary { op, left, right } => dump_binary(*op, left, right),
            Self::InList {
                probe,
                candidates,
                not_in,
            } => {
                let list = candidates
                    .iter()
                    .map(ExprNode::dump)
                    .collect::<Vec<_>>()
                    .join(", ");
                if *not_in {
                    format!("{} NOT IN ({list})", probe.dump())
                } else {
                    format!("{} IN ({list})", probe.dump())
                }
            }
            Self::FunctionCall { fn_index, args } => {
                let Some(function) = registry::function(*fn_index) else {
                    return "<unknown function>".to_owned();
                };
                if function.arity() == crate::registry::Arity::Exact(0)
                    && function.name().starts_with('$')
                {
                    return function.name().to_owned();
                }
                let rendered = args
                    .iter()
                    .map(ExprNode::dump)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}({rendered})", function.name())
            }
            Self::Case {
                branches,
                else_expr,
            } => {
                let mut text = String::from("CASE");
                for branch in branches {
                    text.push_str(&format!(
                        " WHEN {} THEN {}",
                        branch.when.dump(),
                        branch.then.dump()
                    ));
                }
                if let Some(else_expr) = else_expr {
                    text.push_str(&format!(" ELSE {}", else_expr.dump()));
                }
                text.push_str(" END");
                text
            }
        }
    }

    /// Column names this subtree reads, in first-seen order and possibly
    /// with duplicates; the expression facade deduplicates.
    #[must_use]
    pub fn referenced_columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        self.collect_referenced_columns(&mut columns);
        columns
    }

    fn collect_referenced_columns(&self, columns: &mut Vec<String>) {
        match self {
            Self::Literal(_) => {}
            Self::ColumnRef { name, .. } => columns.push(name.clone()),
            Self::Unary { operand, .. } => operand.collect_referenced_columns(columns),
            Self::Binary { left, right, .. } => {
                left.collect_referenced_columns(columns);
                right.collect_referenced_columns(columns);
            }
            Self::InList {
                probe, candidates, ..
            } => {
                probe.collect_referenced_columns(columns);
                for candidate in candidates {
                    candidate.collect_referenced_columns(columns);
                }
            }
            Self::FunctionCall { fn_index, args } => {
                if let Some(function) = registry::function(*fn_index) {
                    columns.extend(function.referenced_columns().iter().cloned());
                }
                for arg in args {
                    arg.collect_referenced_columns(columns);
                }
            }
            Self::Case {
                branches,
                else_expr,
            } => {
                // Static analysis cannot know which branch runs, so every
                // branch contributes.
                for branch in branches {
                    branch.when.collect_referenced_columns(columns);
                    branch.then.collect_referenced_columns(columns);
                }
                if let Some(else_expr) = else_expr {
                    else_expr.collect_referenced_columns(columns);
                }
            }
        }
    }

    #[must_use]
    pub fn needs_geometry(&self) -> bool {
        match self {
            Self::Literal(_) | Self::ColumnRef { .. } => false,
            Self::Unary { operand, .. } => operand.needs_geometry(),
            Self::Binary { left, right, .. } => left.needs_geometry() || right.needs_geometry(),
            Self::InList {
                probe, candidates, ..
            } => probe.needs_geometry() || candidates.iter().any(ExprNode::needs_geometry),
            Self::FunctionCall { fn_index, args } => {
                registry::function(*fn_index)
                    .is_some_and(|function| function.uses_geometry())
                    || args.iter().any(ExprNode::needs_geometry)
            }
            Self::Case {
                branches,
                else_expr,
            } => {
                branches
                    .iter()
                    .any(|branch| branch.when.needs_geometry() || branch.then.needs_geometry())
                    || else_expr
                        .as_ref()
                        .is_some_and(|else_expr| else_expr.needs_geometry())
            }
        }
    }
}

fn eval_column_ref(
    name: &str,
    index: Option<usize>,
    context: &ExpressionContext,
) -> Result<Value, EvalError> {
    if let Some(feature) = context.feature() {
        let value = match index {
            Some(index) => feature.attribute(index),
            None => feature.attribute_by_name(name),
        };
        return Ok(value.unwrap_or(Value::Null));
    }
    // Unresolved and unbound: degrade to a diagnostic placeholder so the
    // rest of a larger expression stays debuggable.
    Ok(Value::String(format!("[{name}]")))
}

fn eval_unary(
    op: UnaryOperator,
    operand: &ExprNode,
    context: &ExpressionContext,
) -> Result<Value, EvalError> {
    let value = operand.eval(context)?;
    match op {
        UnaryOperator::Not => Ok(value.to_tvl()?.not().to_value()),
        UnaryOperator::Minus => {
            if value.is_int_safe() {
                Ok(Value::Int(-value.to_int()?))
            } else if value.is_double_safe() {
                Ok(Value::Double(-value.to_double()?))
            } else {
                Err(EvalError::UnaryMinusNonNumeric)
            }
        }
    }
}

fn eval_binary(
    op: BinaryOperator,
    left: &ExprNode,
    right: &ExprNode,
    context: &ExpressionContext,
) -> Result<Value, EvalError> {
    let lhs = left.eval(context)?;
    let rhs = right.eval(context)?;

    match op {
        BinaryOperator::Plus
            if matches!(lhs, Value::String(_)) && matches!(rhs, Value::String(_)) =>
        {
            Ok(Value::String(lhs.to_text() + &rhs.to_text()))
        }
        BinaryOperator::Plus
        | BinaryOperator::Minus
        | BinaryOperator::Mul
        | BinaryOperator::Div
        | BinaryOperator::Mod => eval_arithmetic(op, &lhs, &rhs),
        BinaryOperator::IntDiv => {
            if lhs.is_null() || rhs.is_null() {
                return Ok(Value::Null);
            }
            let divisor = rhs.to_double()?;
            if divisor == 0.0 {
                return Ok(Value::Null);
            }
            Ok(Value::Int((lhs.to_double()? / divisor).floor() as i64))
        }
        BinaryOperator::Pow => {
            if lhs.is_null() || rhs.is_null() {
                return Ok(Value::Null);
            }
            Ok(Value::Double(lhs.to_double()?.powf(rhs.to_double()?)))
        }
        BinaryOperator::And => Ok(lhs.to_tvl()?.and(rhs.to_tvl()?).to_value()),
        BinaryOperator::Or => Ok(lhs.to_tvl()?.or(rhs.to_tvl()?).to_value()),
        BinaryOperator::Eq
        | BinaryOperator::Ne
        | BinaryOperator::Lt
        | BinaryOperator::Gt
        | BinaryOperator::Le
        | BinaryOperator::Ge => eval_comparison(op, &lhs, &rhs),
        BinaryOperator::Is | BinaryOperator::IsNot => eval_is(op, &lhs, &rhs),
        BinaryOperator::Regexp
        | BinaryOperator::Like
        | BinaryOperator::NotLike
        | BinaryOperator::ILike
        | BinaryOperator::NotILike => eval_pattern(op, &lhs, &rhs),
        BinaryOperator::Concat => {
            if lhs.is_null() || rhs.is_null() {
                return Ok(Value::Null);
            }
            Ok(Value::String(lhs.to_text() + &rhs.to_text()))
        }
    }
}

fn eval_arithmetic(op: BinaryOperator, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(Value::Null);
    }

    if op != BinaryOperator::Div && lhs.is_int_safe() && rhs.is_int_safe() {
        // Both sides are integers, so stay in the integer domain with
        // truncating semantics.
        let left = lhs.to_int()?;
        let right = rhs.to_int()?;
        if op == BinaryOperator::Mod && right == 0 {
            return Ok(Value::Null);
        }
        let result = match op {
            BinaryOperator::Plus => left + right,
            BinaryOperator::Minus => left - right,
            BinaryOperator::Mul => left * right,
            BinaryOperator::Mod => left % right,
            _ => unreachable!("integer domain excludes division"),
        };
        return Ok(Value::Int(result));
    }

    if lhs.is_date_time_safe() && rhs.is_interval_safe() {
        if matches!(
            op,
            BinaryOperator::Div | BinaryOperator::Mul | BinaryOperator::Mod
        ) {
            return Err(EvalError::DateTimeIntervalArithmetic);
        }
        let date_time = lhs.to_date_time()?;
        let interval = rhs.to_interval()?;
        let shift = Duration::seconds(interval.seconds() as i64);
        let result = match op {
            BinaryOperator::Plus => date_time + shift,
            BinaryOperator::Minus => date_time - shift,
            _ => unreachable!("only + and - reach the datetime path"),
        };
        return Ok(Value::DateTime(result));
    }

    let left = lhs.to_double()?;
    let right = rhs.to_double()?;
    if matches!(op, BinaryOperator::Div | BinaryOperator::Mod) && right == 0.0 {
        // Division and modulo by zero silently yield NULL, never an
        // error and never infinity.
        return Ok(Value::Null);
    }
    let result = match op {
        BinaryOperator::Plus => left + right,
        BinaryOperator::Minus => left - right,
        BinaryOperator::Mul => left * right,
        BinaryOperator::Div => left / right,
        BinaryOperator::Mod => left % right,
        _ => unreachable!("arithmetic dispatch covers + - * / %"),
    };
    Ok(Value::Double(result))
}

fn eval_comparison(op: BinaryOperator, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(Tvl::Unknown.to_value());
    }

    let matched = if lhs.is_double_safe() && rhs.is_double_safe() {
        let left = lhs.to_double()?;
        let right = rhs.to_double()?;
        compare_matches(op, left, right)
    } else {
        let ordering = lhs.to_text().cmp(&rhs.to_text());
        match op {
            BinaryOperator::Eq => ordering.is_eq(),
            BinaryOperator::Ne => ordering.is_ne(),
            BinaryOperator::Lt => ordering.is_lt(),
            BinaryOperator::Gt => ordering.is_gt(),
            BinaryOperator::Le => ordering.is_le(),
            BinaryOperator::Ge => ordering.is_ge(),
            _ => unreachable!("comparison dispatch covers the six operators"),
        }
    };
    Ok(Tvl::from(matched).to_value())
}

fn compare_matches(op: BinaryOperator, left: f64, right: f64) -> bool {
    match op {
        BinaryOperator::Eq => left == right,
        BinaryOperator::Ne => left != right,
        BinaryOperator::Lt => left < right,
        BinaryOperator::Gt => left > right,
        BinaryOperator::Le => left <= right,
        BinaryOperator::Ge => left >= right,
        _ => unreachable!("comparison dispatch covers the six operators"),
    }
}

fn eval_is(op: BinaryOperator, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    let affirmative = op == BinaryOperator::Is;
    if lhs.is_null() && rhs.is_null() {
        return Ok(Tvl::from(affirmative).to_value());
    }
    if lhs.is_null() || rhs.is_null() {
        return Ok(Tvl::from(!affirmative).to_value());
    }
    // Equality choice deliberately mirrors comparison: numeric when both
    // sides are numeric-coercible, string otherwise. Numeric-looking
    // strings therefore compare numerically here too.
    let equal = if lhs.is_double_safe() && rhs.is_double_safe() {
        lhs.to_double()? == rhs.to_double()?
    } else {
        lhs.to_text() == rhs.to_text()
    };
    Ok(Tvl::from(equal == affirmative).to_value())
}

fn eval_pattern(op: BinaryOperator, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(Tvl::Unknown.to_value());
    }
    let text = lhs.to_text();
    let pattern = rhs.to_text();

    let matches = if op == BinaryOperator::Regexp {
        // Substring semantics, not a full-string match.
        compile_regex(&pattern)?.is_match(&text)
    } else {
        let translated = regex::escape(&pattern).replace('%', ".*").replace('_', ".");
        let anchored = if matches!(op, BinaryOperator::ILike | BinaryOperator::NotILike) {
            format!("(?is)^{translated}$")
        } else {
            format!("(?s)^{translated}$")
        };
        compile_regex(&anchored)?.is_match(&text)
    };

    let matches = if matches!(op, BinaryOperator::NotLike | BinaryOperator::NotILike) {
        !matches
    } else {
        matches
    };
    Ok(Tvl::from(matches).to_value())
}

pub(crate) fn compile_regex(pattern: &str) -> Result<Regex, EvalError> {
    Regex::new(pattern).map_err(|source| EvalError::InvalidRegex {
        pattern: pattern.to_owned(),
        message: source.to_string(),
    })
}

fn eval_in(
    probe: &ExprNode,
    candidates: &[ExprNode],
    not_in: bool,
    context: &ExpressionContext,
) -> Result<Value, EvalError> {
    // The vacuous case is defined explicitly: nothing is IN an empty
    // list, and everything is NOT IN one.
    if candidates.is_empty() {
        return Ok(Tvl::from(not_in).to_value());
    }
    let needle = probe.eval(context)?;
    if needle.is_null() {
        return Ok(Tvl::Unknown.to_value());
    }

    let mut list_has_null = false;
    for candidate in candidates {
        let value = candidate.eval(context)?;
        if value.is_null() {
            list_has_null = true;
            continue;
        }
        let equal = if needle.is_double_safe() && value.is_double_safe() {
            needle.to_double()? == value.to_double()?
        } else {
            needle.to_text() == value.to_text()
        };
        if equal {
            return Ok(Tvl::from(!not_in).to_value());
        }
    }

    if list_has_null {
        return Ok(Tvl::Unknown.to_value());
    }
    Ok(Tvl::from(not_in).to_value())
}

fn eval_function(
    fn_index: usize,
    args: &[ExprNode],
    context: &ExpressionContext,
) -> Result<Value, EvalError> {
    let registered = registry::function(fn_index)
        .ok_or_else(|| EvalError::Function("stale function reference".to_owned()))?;
    // A context-scoped function of the same name shadows the registry.
    let function = context
        .function(registered.name())
        .unwrap_or(registered);

    if !function.arity().accepts(args.len()) {
        return Err(EvalError::Function(format!(
            "function '{}' called with {} arguments",
            function.name(),
            args.len()
        )));
    }

    match function.implementation() {
        FunctionImpl::Lazy(body) => body(args, context),
        FunctionImpl::Eager(body) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                let value = arg.eval(context)?;
                if value.is_null() && !function.handles_null() {
                    // Default SQL-style null propagation; functions like
                    // coalesce opt out via handles_null.
                    return Ok(Value::Null);
                }
                values.push(value);
            }
            body(&values, context)
        }
    }
}

fn eval_case(
    branches: &[WhenThen],
    else_expr: Option<&ExprNode>,
    context: &ExpressionContext,
) -> Result<Value, EvalError> {
    for branch in branches {
        let condition = branch.when.eval(context)?;
        // Only an exact True takes the branch; Unknown falls through.
        if condition.to_tvl()? == Tvl::True {
            return branch.then.eval(context);
        }
    }
    match else_expr {
        Some(else_expr) => else_expr.eval(context),
        None => Ok(Value::Null),
    }
}

fn dump_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_owned(),
        Value::Int(v) => v.to_string(),
        // Debug formatting keeps a trailing `.0` on whole doubles so the
        // literal stays a double on re-parse.
        Value::Double(v) => format!("{v:?}"),
        Value::String(v) => crate::expression::Expression::quoted_string(v),
        Value::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_owned(),
        other => format!("[unsupported type: {:?}]", other.value_type()),
    }
}

fn dump_column_ref(name: &str) -> String {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if plain {
        name.to_owned()
    } else {
        crate::expression::Expression::quoted_column_ref(name)
    }
}

fn dump_unary(op: UnaryOperator, operand: &ExprNode) -> String {
    let needs_parens = match (op, operand) {
        // `NOT a AND b` would re-associate; so would `-1 + 2`.
        (UnaryOperator::Not, ExprNode::Binary { op: child, .. }) => child.precedence() <= 2,
        (UnaryOperator::Minus, ExprNode::Binary { .. }) => true,
        _ => false,
    };
    let rendered = if needs_parens {
        format!("({})", operand.dump())
    } else {
        operand.dump()
    };
    match op {
        UnaryOperator::Not => format!("NOT {rendered}"),
        UnaryOperator::Minus => format!("-{rendered}"),
    }
}

fn dump_binary(op: BinaryOperator, left: &ExprNode, right: &ExprNode) -> String {
    let left_precedence = match left {
        ExprNode::Binary { op: child, .. } => Some(child.precedence()),
        _ => None,
    };
    let right_precedence = match right {
        ExprNode::Binary { op: child, .. } => Some(child.precedence()),
        _ => None,
    };

    let (wrap_left, wrap_right) = if op.left_associative() {
        (
            left_precedence.is_some_and(|p| p < op.precedence()),
            right_precedence.is_some_and(|p| p <= op.precedence()),
        )
    } else {
        (
            left_precedence.is_some_and(|p| p <= op.precedence()),
            right_precedence.is_some_and(|p| p < op.precedence()),
        )
    };

    let left_text = if wrap_left {
        format!("({})", left.dump())
    } else {
        left.dump()
    };
    let right_text = if wrap_right {
        format!("({})", right.dump())
    } else {
        right.dump()
    };
    format!("{left_text} {} {right_text}", op.text())
}

#[cfg(test)]
mod tests {
    use gx_types::Value;

    use super::{BinaryOperator, ExprNode};
    use crate::context::ExpressionContext;

    fn binary(op: BinaryOperator, left: ExprNode, right: ExprNode) -> ExprNode {
        ExprNode::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn literal(value: impl Into<Value>) -> ExprNode {
        ExprNode::Literal(value.into())
    }

    fn eval(node: &ExprNode) -> Value {
        node.eval(&ExpressionContext::new()).expect("eval")
    }

    #[test]
    fn null_propagates_through_arithmetic_both_ways() {
        for op in [
            BinaryOperator::Plus,
            BinaryOperator::Minus,
            BinaryOperator::Mul,
            BinaryOperator::Mod,
        ] {
            let left_null = binary(op, ExprNode::Literal(Value::Null), literal(3_i64));
            let right_null = binary(op, literal(3_i64), ExprNode::Literal(Value::Null));
            assert_eq!(eval(&left_null), Value::Null, "{op:?}");
            assert_eq!(eval(&right_null), Value::Null, "{op:?}");
        }
    }

    #[test]
    fn division_and_modulo_by_zero_yield_null_not_errors() {
        let cases = [
            binary(BinaryOperator::Div, literal(1_i64), literal(0_i64)),
            binary(BinaryOperator::Div, literal(1.0), literal(0.0)),
            binary(BinaryOperator::IntDiv, literal(1_i64), literal(0_i64)),
            binary(BinaryOperator::Mod, literal(1_i64), literal(0_i64)),
            binary(BinaryOperator::Mod, literal(1.5), literal(0.0)),
        ];
        for node in &cases {
            assert_eq!(
                node.eval(&ExpressionContext::new()).expect("no error"),
                Value::Null
            );
        }
    }

    #[test]
    fn integer_operands_stay_in_the_integer_domain() {
        let sum = binary(BinaryOperator::Plus, literal(2_i64), literal(3_i64));
        assert_eq!(eval(&sum), Value::Int(5));

        let remainder = binary(BinaryOperator::Mod, literal(-7_i64), literal(2_i64));
        assert_eq!(eval(&remainder), Value::Int(-1));

        // Division always leaves the integer domain.
        let quotient = binary(BinaryOperator::Div, literal(7_i64), literal(2_i64));
        assert_eq!(eval(&quotient), Value::Double(3.5));
    }

    #[test]
    fn float_modulo_sign_follows_the_dividend() {
        let negative = binary(BinaryOperator::Mod, literal(-7.0), literal(2.0));
        assert_eq!(eval(&negative), Value::Double(-1.0));
        let positive = binary(BinaryOperator::Mod, literal(7.0), literal(-2.0));
        assert_eq!(eval(&positive), Value::Double(1.0));
    }

    #[test]
    fn int_div_floors_the_floating_quotient() {
        let negative = binary(BinaryOperator::IntDiv, literal(-7_i64), literal(2_i64));
        assert_eq!(eval(&negative), Value::Int(-4));
        let positive = binary(BinaryOperator::IntDiv, literal(7_i64), literal(2_i64));
        assert_eq!(eval(&positive), Value::Int(3));
    }

    #[test]
    fn comparisons_with_null_are_unknown() {
        let node = binary(BinaryOperator::Eq, ExprNode::Literal(Value::Null), literal(1_i64));
        assert_eq!(eval(&node), Value::Null);
        let node = binary(BinaryOperator::Lt, literal(1_i64), ExprNode::Literal(Value::Null));
        assert_eq!(eval(&node), Value::Null);
    }

    #[test]
    fn string_plus_concatenates_only_for_two_strings() {
        let both = binary(BinaryOperator::Plus, literal("ab"), literal("cd"));
        assert_eq!(eval(&both), Value::from("abcd"));

        // A numeric string and a number stay numeric.
        let mixed = binary(BinaryOperator::Plus, literal("2"), literal(3_i64));
        assert_eq!(eval(&mixed), Value::Int(5));
    }

    #[test]
    fn is_and_is_not_cover_all_null_combinations() {
        let is = |l: ExprNode, r: ExprNode| binary(BinaryOperator::Is, l, r);
        let is_not = |l: ExprNode, r: ExprNode| binary(BinaryOperator::IsNot, l, r);
        let null = || ExprNode::Literal(Value::Null);

        assert_eq!(eval(&is(null(), null())), Value::Int(1));
        assert_eq!(eval(&is_not(null(), null())), Value::Int(0));
        assert_eq!(eval(&is(null(), literal(1_i64))), Value::Int(0));
        assert_eq!(eval(&is_not(literal(1_i64), null())), Value::Int(1));
        assert_eq!(eval(&is(literal("1"), literal(1_i64))), Value::Int(1));
        assert_eq!(eval(&is(literal("a"), literal("b"))), Value::Int(0));
    }

    #[test]
    fn in_list_short_circuits_and_tracks_nulls() {
        let probe = literal(1_i64);
        let hit = ExprNode::InList {
            probe: Box::new(probe.clone()),
            candidates: vec![literal(1_i64), ExprNode::Literal(Value::Null), literal(3_i64)],
            not_in: false,
        };
        assert_eq!(eval(&hit), Value::Int(1));

        let miss_with_null = ExprNode::InList {
            probe: Box::new(probe.clone()),
            candidates: vec![ExprNode::Literal(Value::Null), literal(2_i64)],
            not_in: false,
        };
        assert_eq!(eval(&miss_with_null), Value::Null);

        let null_probe = ExprNode::InList {
            probe: Box::new(ExprNode::Literal(Value::Null)),
            candidates: vec![literal(1_i64)],
            not_in: false,
        };
        assert_eq!(eval(&null_probe), Value::Null);

        let empty = ExprNode::InList {
            probe: Box::new(probe),
            candidates: Vec::new(),
            not_in: true,
        };
        assert_eq!(eval(&empty), Value::Int(1));
    }

    #[test]
    fn like_translates_sql_wildcards() {
        let like = binary(BinaryOperator::Like, literal("hello"), literal("he%o"));
        assert_eq!(eval(&like), Value::Int(1));

        let single = binary(BinaryOperator::Like, literal("hello"), literal("hell_"));
        assert_eq!(eval(&single), Value::Int(1));

        // Regex metacharacters in the pattern are literal text.
        let dotted = binary(BinaryOperator::Like, literal("axb"), literal("a.b"));
        assert_eq!(eval(&dotted), Value::Int(0));

        let case = binary(BinaryOperator::Like, literal("Hello"), literal("hello"));
        assert_eq!(eval(&case), Value::Int(0));
        let icase = binary(BinaryOperator::ILike, literal("Hello"), literal("hello"));
        assert_eq!(eval(&icase), Value::Int(1));
    }

    #[test]
    fn regexp_matches_substrings_and_rejects_bad_patterns() {
        let hit = binary(BinaryOperator::Regexp, literal("hello world"), literal("wor"));
        assert_eq!(eval(&hit), Value::Int(1));

        let broken = binary(BinaryOperator::Regexp, literal("x"), literal("("));
        assert!(broken.eval(&ExpressionContext::new()).is_err());
    }
}
