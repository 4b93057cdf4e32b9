use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use gx_geom::GeometryLike;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Interval, Tvl};

/// Record-provider contract: attribute lookup by position or name, plus
/// identity, validity, and the optional geometry handle.
pub trait FeatureLike: fmt::Debug + Send + Sync {
    fn id(&self) -> i64;
    fn is_valid(&self) -> bool;
    fn attribute(&self, index: usize) -> Option<Value>;
    fn attribute_by_name(&self, name: &str) -> Option<Value>;
    fn geometry(&self) -> Option<Arc<dyn GeometryLike>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Null,
    Int,
    Double,
    Bool,
    String,
    Date,
    Time,
    DateTime,
    Interval,
    Geometry,
    Feature,
}

/// A dynamically typed scalar. Values are immutable once constructed;
/// every operation produces a new value.
///
/// Geometry and feature variants hold opaque handles and compare by
/// identity, never by content.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Int(i64),
    Double(f64),
    Bool(bool),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Interval(Interval),
    Geometry(Arc<dyn GeometryLike>),
    Feature(Arc<dyn FeatureLike>),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    #[error("cannot convert '{0}' to double")]
    NotADouble(String),
    #[error("cannot convert '{0}' to int")]
    NotAnInt(String),
    #[error("cannot convert '{0}' to boolean")]
    NotABool(String),
    #[error("cannot convert '{0}' to datetime")]
    NotADateTime(String),
    #[error("cannot convert '{0}' to date")]
    NotADate(String),
    #[error("cannot convert '{0}' to time")]
    NotATime(String),
    #[error("cannot convert '{0}' to interval")]
    NotAnInterval(String),
    #[error("cannot convert value to geometry")]
    NotAGeometry,
    #[error("cannot convert value to feature")]
    NotAFeature,
}

impl Value {
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Null,
            Self::Int(_) => ValueType::Int,
            Self::Double(_) => ValueType::Double,
            Self::Bool(_) => ValueType::Bool,
            Self::String(_) => ValueType::String,
            Self::Date(_) => ValueType::Date,
            Self::Time(_) => ValueType::Time,
            Self::DateTime(_) => ValueType::DateTime,
            Self::Interval(_) => ValueType::Interval,
            Self::Geometry(_) => ValueType::Geometry,
            Self::Feature(_) => ValueType::Feature,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Display conversion. Infallible: every variant renders, NULL as the
    /// empty string.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Int(v) => v.to_string(),
            Self::Double(v) => v.to_string(),
            Self::Bool(v) => v.to_string(),
            Self::String(v) => v.clone(),
            Self::Date(v) => v.format("%Y-%m-%d").to_string(),
            Self::Time(v) => v.format("%H:%M:%S").to_string(),
            Self::DateTime(v) => v.format("%Y-%m-%d %H:%M:%S").to_string(),
            Self::Interval(v) => v.to_string(),
            Self::Geometry(_) | Self::Feature(_) => String::new(),
        }
    }

    pub fn to_double(&self) -> Result<f64, ValueError> {
        let parsed = match self {
            Self::Int(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::String(v) => v.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(x) if x.is_finite() => Ok(x),
            _ => Err(ValueError::NotADouble(self.to_text())),
        }
    }

    /// Integer conversion. The result is produced as an `i64` but must fit
    /// a 32-bit range; wider inputs are conversion errors.
    pub fn to_int(&self) -> Result<i64, ValueError> {
        let parsed = match self {
            Self::Int(v) => Some(*v),
            Self::Bool(v) => Some(i64::from(*v)),
            Self::Double(v) if v.is_finite() => Some(v.round() as i64),
            Self::String(v) => v.trim().parse::<i64>().ok(),
            _ => None,
        };
        match parsed {
            Some(x) if x >= i64::from(i32::MIN) && x <= i64::from(i32::MAX) => Ok(x),
            _ => Err(ValueError::NotAnInt(self.to_text())),
        }
    }

    /// Three-valued boolean conversion: NULL is Unknown, a geometry is
    /// False iff empty, a feature is True iff valid, a number is False iff
    /// exactly zero.
    pub fn to_tvl(&self) -> Result<Tvl, ValueError> {
        match self {
            Self::Null => Ok(Tvl::Unknown),
            Self::Geometry(geom) => Ok(Tvl::from(!geom.is_empty())),
            Self::Feature(feature) => Ok(Tvl::from(feature.is_valid())),
            Self::Int(v) => Ok(Tvl::from(*v != 0)),
            other => match other.to_double() {
                Ok(x) => Ok(Tvl::from(x != 0.0)),
                Err(_) => Err(ValueError::NotABool(self.to_text())),
            },
        }
    }

    pub fn to_date_time(&self) -> Result<NaiveDateTime, ValueError> {
        match self {
            Self::DateTime(v) => Ok(*v),
            Self::Date(v) => Ok(v.and_hms_opt(0, 0, 0).expect("midnight is valid")),
            Self::String(v) => {
                let text = v.trim();
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
                    .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
                    .or_else(|_| {
                        NaiveDate::parse_from_str(text, "%Y-%m-%d")
                            .map(|date| date.and_hms_opt(0, 0, 0).expect("midnight is valid"))
                    })
                    .map_err(|_| ValueError::NotADateTime(self.to_text()))
            }
            _ => Err(ValueError::NotADateTime(self.to_text())),
        }
    }

    pub fn to_date(&self) -> Result<NaiveDate, ValueError> {
        match self {
            Self::Date(v) => Ok(*v),
            Self::DateTime(v) => Ok(v.date()),
            Self::String(v) => NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                .map_err(|_| ValueError::NotADate(self.to_text())),
            _ => Err(ValueError::NotADate(self.to_text())),
        }
    }

    pub fn to_time(&self) -> Result<NaiveTime, ValueError> {
        match self {
            Self::Time(v) => Ok(*v),
            Self::DateTime(v) => Ok(v.time()),
            Self::String(v) => NaiveTime::parse_from_str(v.trim(), "%H:%M:%S")
                .map_err(|_| ValueError::NotATime(self.to_text())),
            _ => Err(ValueError::NotATime(self.to_text())),
        }
    }

    pub fn to_interval(&self) -> Result<Interval, ValueError> {
        if let Self::Interval(interval) = self {
            return Ok(*interval);
        }
        let interval = Interval::from_string(&self.to_text());
        if interval.is_valid() {
            Ok(interval)
        } else {
            Err(ValueError::NotAnInterval(self.to_text()))
        }
    }

    pub fn to_geometry(&self) -> Result<Arc<dyn GeometryLike>, ValueError> {
        match self {
            Self::Geometry(geom) => Ok(Arc::clone(geom)),
            _ => Err(ValueError::NotAGeometry),
        }
    }

    pub fn to_feature(&self) -> Result<Arc<dyn FeatureLike>, ValueError> {
        match self {
            Self::Feature(feature) => Ok(Arc::clone(feature)),
            _ => Err(ValueError::NotAFeature),
        }
    }

    /// True when the value already is an integer or is a string spelling
    /// one. Doubles are deliberately excluded so fractional values stay in
    /// the floating domain.
    #[must_use]
    pub fn is_int_safe(&self) -> bool {
        match self {
            Self::Int(_) => true,
            Self::String(v) => v.trim().parse::<i64>().is_ok(),
            _ => false,
        }
    }

    /// True when the value participates in numeric comparison. Booleans
    /// are excluded: they compare as text.
    #[must_use]
    pub fn is_double_safe(&self) -> bool {
        match self {
            Self::Int(_) | Self::Double(_) => true,
            Self::String(v) => matches!(v.trim().parse::<f64>(), Ok(x) if x.is_finite()),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_date_time_safe(&self) -> bool {
        matches!(self, Self::Date(_) | Self::Time(_) | Self::DateTime(_))
    }

    #[must_use]
    pub fn is_interval_safe(&self) -> bool {
        match self {
            Self::Interval(_) => true,
            Self::String(v) => Interval::from_string(v).is_valid(),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Interval(a), Self::Interval(b)) => a == b,
            (Self::Geometry(a), Self::Geometry(b)) => Arc::ptr_eq(a, b),
            (Self::Feature(a), Self::Feature(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Value, ValueError};
    use crate::{Interval, Tvl};

    #[test]
    fn double_coercion_accepts_numbers_and_numeric_strings() {
        assert_eq!(Value::Int(3).to_double().expect("int"), 3.0);
        assert_eq!(Value::Double(2.5).to_double().expect("double"), 2.5);
        assert_eq!(Value::from(" 1.25 ").to_double().expect("string"), 1.25);
        assert_eq!(Value::Bool(true).to_double().expect("bool"), 1.0);
    }

    #[test]
    fn double_coercion_rejects_nan_and_text() {
        assert!(matches!(
            Value::Double(f64::NAN).to_double(),
            Err(ValueError::NotADouble(_))
        ));
        assert!(Value::from("twelve").to_double().is_err());
        assert!(Value::Null.to_double().is_err());
    }

    #[test]
    fn double_coercion_is_idempotent() {
        let first = Value::from("2.5").to_double().expect("parse");
        let second = Value::Double(first).to_double().expect("re-coerce");
        assert_eq!(first, second);
    }

    #[test]
    fn int_coercion_enforces_32_bit_range() {
        assert_eq!(Value::Int(41).to_int().expect("in range"), 41);
        assert_eq!(Value::Double(2.6).to_int().expect("rounds"), 3);
        assert_eq!(Value::from("-7").to_int().expect("string"), -7);
        assert!(Value::Int(i64::from(i32::MAX) + 1).to_int().is_err());
        assert!(Value::from("2.5").to_int().is_err());
    }

    #[test]
    fn tvl_coercion_follows_zero_and_null_rules() {
        assert_eq!(Value::Null.to_tvl().expect("null"), Tvl::Unknown);
        assert_eq!(Value::Int(0).to_tvl().expect("zero"), Tvl::False);
        assert_eq!(Value::Double(0.5).to_tvl().expect("nonzero"), Tvl::True);
        assert!(matches!(
            Value::from("maybe").to_tvl(),
            Err(ValueError::NotABool(_))
        ));
    }

    #[test]
    fn date_time_coercion_parses_iso_strings() {
        let date = NaiveDate::from_ymd_opt(2016, 3, 4).expect("date");
        assert_eq!(
            Value::from("2016-03-04").to_date().expect("date string"),
            date
        );
        assert_eq!(
            Value::from("2016-03-04 10:30:00")
                .to_date_time()
                .expect("datetime string")
                .date(),
            date
        );
        assert_eq!(
            Value::Date(date).to_date_time().expect("date widens").time(),
            chrono::NaiveTime::from_hms_opt(0, 0, 0).expect("midnight")
        );
    }

    #[test]
    fn interval_coercion_goes_through_free_text() {
        let interval = Value::from("2 days").to_interval().expect("parse");
        assert_eq!(interval, Interval::from_seconds(2.0 * 86400.0));
        assert!(Value::from("gibberish").to_interval().is_err());
    }

    #[test]
    fn safety_predicates_partition_the_domain() {
        assert!(Value::Int(1).is_int_safe());
        assert!(Value::from("12").is_int_safe());
        assert!(!Value::Double(1.0).is_int_safe());
        assert!(Value::Double(1.5).is_double_safe());
        assert!(!Value::Bool(true).is_double_safe());
        assert!(Value::from("1 hour").is_interval_safe());
    }

    #[test]
    fn null_renders_as_empty_text() {
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::Int(7).to_text(), "7");
        assert_eq!(Value::Bool(false).to_text(), "false");
    }
}
