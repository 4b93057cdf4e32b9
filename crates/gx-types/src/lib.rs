#![forbid(unsafe_code)]

mod interval;
mod tvl;
mod value;

pub use interval::{Interval, SECONDS_DAY, SECONDS_HOUR, SECONDS_MINUTE, SECONDS_MONTH, SECONDS_WEEK, SECONDS_YEAR};
pub use tvl::Tvl;
pub use value::{FeatureLike, Value, ValueError, ValueType};
