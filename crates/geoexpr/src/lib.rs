#![forbid(unsafe_code)]

//! Facade crate: one `use geoexpr::…` away from the whole workspace.

pub use gx_compile::{QueryCompiler, SqlCompiler, Unsupported};
pub use gx_expr::{
    ALL_ATTRIBUTES, Arity, BinaryOperator, EvalError, ExprNode, Expression, ExpressionContext,
    Function, FunctionImpl, ParseError, RegistryError, Scope, UnaryOperator, WhenThen, function,
    function_count, function_index, is_function_name, parse_expression, register_function,
    unregister_function,
};
pub use gx_feature::{Feature, FeatureError, Field, Fields};
pub use gx_geom::{GeometryLike, Rect};
pub use gx_types::{FeatureLike, Interval, Tvl, Value, ValueError, ValueType};
