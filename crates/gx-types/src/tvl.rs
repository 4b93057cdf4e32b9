use serde::{Deserialize, Serialize};

use crate::Value;

/// Three-valued logic state, SQL style: NULL comparisons produce Unknown
/// rather than plain false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tvl {
    False,
    True,
    Unknown,
}

use Tvl::{False, True, Unknown};

const AND_TABLE: [[Tvl; 3]; 3] = [
    // false  true    unknown
    [False, False, False],   // false
    [False, True, Unknown],  // true
    [False, Unknown, Unknown], // unknown
];

const OR_TABLE: [[Tvl; 3]; 3] = [
    [False, True, Unknown],
    [True, True, True],
    [Unknown, True, Unknown],
];

const NOT_TABLE: [Tvl; 3] = [True, False, Unknown];

impl Tvl {
    fn index(self) -> usize {
        match self {
            False => 0,
            True => 1,
            Unknown => 2,
        }
    }

    #[must_use]
    pub fn and(self, other: Tvl) -> Tvl {
        AND_TABLE[self.index()][other.index()]
    }

    #[must_use]
    pub fn or(self, other: Tvl) -> Tvl {
        OR_TABLE[self.index()][other.index()]
    }

    #[must_use]
    pub fn not(self) -> Tvl {
        NOT_TABLE[self.index()]
    }

    /// Externally visible form: False is 0, True is 1, Unknown is NULL.
    #[must_use]
    pub fn to_value(self) -> Value {
        match self {
            False => Value::Int(0),
            True => Value::Int(1),
            Unknown => Value::Null,
        }
    }
}

impl From<bool> for Tvl {
    fn from(value: bool) -> Self {
        if value { True } else { False }
    }
}

#[cfg(test)]
mod tests {
    use super::Tvl::{self, False, True, Unknown};
    use crate::Value;

    const ALL: [Tvl; 3] = [False, True, Unknown];

    #[test]
    fn and_matches_sql_truth_table() {
        assert_eq!(Unknown.and(False), False);
        assert_eq!(Unknown.and(True), Unknown);
        assert_eq!(Unknown.and(Unknown), Unknown);
        for state in ALL {
            assert_eq!(state.and(False), False);
            assert_eq!(True.and(state), state);
        }
    }

    #[test]
    fn or_matches_sql_truth_table() {
        assert_eq!(Unknown.or(True), True);
        assert_eq!(Unknown.or(False), Unknown);
        assert_eq!(Unknown.or(Unknown), Unknown);
        for state in ALL {
            assert_eq!(state.or(True), True);
            assert_eq!(False.or(state), state);
        }
    }

    #[test]
    fn not_is_an_involution_fixing_unknown() {
        assert_eq!(True.not(), False);
        assert_eq!(False.not(), True);
        assert_eq!(Unknown.not(), Unknown);
        for state in ALL {
            assert_eq!(state.not().not(), state);
        }
    }

    #[test]
    fn and_or_are_total_and_commutative() {
        for a in ALL {
            for b in ALL {
                assert_eq!(a.and(b), b.and(a));
                assert_eq!(a.or(b), b.or(a));
            }
        }
    }

    #[test]
    fn externally_visible_values() {
        assert_eq!(False.to_value(), Value::Int(0));
        assert_eq!(True.to_value(), Value::Int(1));
        assert_eq!(Unknown.to_value(), Value::Null);
    }
}
