use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const SECONDS_MINUTE: f64 = 60.0;
pub const SECONDS_HOUR: f64 = 3600.0;
pub const SECONDS_DAY: f64 = 86400.0;
pub const SECONDS_WEEK: f64 = 7.0 * SECONDS_DAY;
// Month and year lengths are approximations, matching common usage in
// duration strings rather than any particular calendar.
pub const SECONDS_MONTH: f64 = 30.0 * SECONDS_DAY;
pub const SECONDS_YEAR: f64 = 365.0 * SECONDS_DAY;

const UNIT_WORDS: &[(&[&str], f64)] = &[
    (&["second", "seconds", "sec", "secs"], 1.0),
    (&["minute", "minutes", "min", "mins"], SECONDS_MINUTE),
    (&["hour", "hours"], SECONDS_HOUR),
    (&["day", "days"], SECONDS_DAY),
    (&["week", "weeks"], SECONDS_WEEK),
    (&["month", "months"], SECONDS_MONTH),
    (&["year", "years"], SECONDS_YEAR),
];

/// A duration value, stored as a total number of seconds.
///
/// An interval parsed from unrecognizable text is marked invalid; invalid
/// intervals never compare equal to anything, so they surface as Unknown
/// in logic contexts downstream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Interval {
    seconds: f64,
    valid: bool,
}

impl Interval {
    #[must_use]
    pub fn from_seconds(seconds: f64) -> Self {
        Self {
            seconds,
            valid: true,
        }
    }

    #[must_use]
    pub fn invalid() -> Self {
        Self {
            seconds: 0.0,
            valid: false,
        }
    }

    /// Parse a free-text duration such as `"1 year 2 months"` or
    /// `"1.5 hours 30 seconds"`.
    ///
    /// Each `<number> <unit-word>` pair is matched case-insensitively and
    /// accumulated. Text from which no seconds accumulate parses as the
    /// invalid interval.
    #[must_use]
    pub fn from_string(text: &str) -> Self {
        let re = Regex::new(r"([-+]?\d*\.?\d+)\s+(\S+)").expect("static pattern");

        let mut seconds = 0.0;
        for capture in re.captures_iter(text) {
            let Ok(value) = capture[1].parse::<f64>() else {
                continue;
            };
            let unit = capture[2].to_lowercase();
            for (words, unit_seconds) in UNIT_WORDS {
                if words.iter().any(|word| unit.contains(word)) {
                    seconds += value * unit_seconds;
                    break;
                }
            }
        }

        if seconds == 0.0 {
            return Self::invalid();
        }
        Self::from_seconds(seconds)
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.seconds
    }

    #[must_use]
    pub fn minutes(&self) -> f64 {
        self.seconds / SECONDS_MINUTE
    }

    #[must_use]
    pub fn hours(&self) -> f64 {
        self.seconds / SECONDS_HOUR
    }

    #[must_use]
    pub fn days(&self) -> f64 {
        self.seconds / SECONDS_DAY
    }

    #[must_use]
    pub fn weeks(&self) -> f64 {
        self.seconds / SECONDS_WEEK
    }

    #[must_use]
    pub fn months(&self) -> f64 {
        self.seconds / SECONDS_MONTH
    }

    #[must_use]
    pub fn years(&self) -> f64 {
        self.seconds / SECONDS_YEAR
    }
}

impl PartialEq for Interval {
    fn eq(&self, other: &Self) -> bool {
        self.valid && other.valid && self.seconds == other.seconds
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.valid {
            return write!(f, "<invalid interval>");
        }
        write!(f, "{} seconds", self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::{Interval, SECONDS_DAY, SECONDS_MONTH, SECONDS_YEAR};

    #[test]
    fn parses_compound_duration_text() {
        let interval = Interval::from_string("1 year 2 months 3 days");
        assert!(interval.is_valid());
        assert_eq!(
            interval.seconds(),
            SECONDS_YEAR + 2.0 * SECONDS_MONTH + 3.0 * SECONDS_DAY
        );
    }

    #[test]
    fn parses_fractional_and_signed_quantities() {
        let interval = Interval::from_string("1.5 hours");
        assert!(interval.is_valid());
        assert_eq!(interval.seconds(), 5400.0);

        let negative = Interval::from_string("-2 days");
        assert!(negative.is_valid());
        assert_eq!(negative.days(), -2.0);
    }

    #[test]
    fn unit_matching_is_case_insensitive() {
        let interval = Interval::from_string("3 WEEKS");
        assert!(interval.is_valid());
        assert_eq!(interval.weeks(), 3.0);
    }

    #[test]
    fn unparsable_text_yields_invalid_interval() {
        assert!(!Interval::from_string("soon").is_valid());
        assert!(!Interval::from_string("").is_valid());
    }

    #[test]
    fn invalid_intervals_never_compare_equal() {
        assert_ne!(Interval::invalid(), Interval::invalid());
        assert_ne!(Interval::invalid(), Interval::from_seconds(0.0));
        assert_eq!(Interval::from_seconds(60.0), Interval::from_string("1 minute"));
    }

    #[test]
    fn derived_accessors_divide_by_unit_lengths() {
        let interval = Interval::from_seconds(SECONDS_DAY);
        assert_eq!(interval.hours(), 24.0);
        assert_eq!(interval.minutes(), 1440.0);
        assert_eq!(interval.days(), 1.0);
    }
}
