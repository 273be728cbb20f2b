//! Ordered QC severity levels.
//!
//! Flags follow the WOCE numbering used by ocean data centres. The numeric
//! code is only used for exchange; ordering is by severity, so `FATAL` (44)
//! compares worse than `BAD` (4) because of its variant position, not its code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QcError;

/// A QC severity level. Ordering is total and "worse" compares greater.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    /// No problem found.
    #[default]
    Good,
    /// Value looks suspicious and should be reviewed.
    Questionable,
    /// Value is wrong.
    Bad,
    /// Value is unusable and invalidates dependent calculations.
    Fatal,
}

impl Flag {
    /// All flags from best to worst.
    pub const ALL: [Flag; 4] = [Flag::Good, Flag::Questionable, Flag::Bad, Flag::Fatal];

    /// WOCE exchange code.
    pub fn code(self) -> i32 {
        match self {
            Flag::Good => 2,
            Flag::Questionable => 3,
            Flag::Bad => 4,
            Flag::Fatal => 44,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Flag::Good => "GOOD",
            Flag::Questionable => "QUESTIONABLE",
            Flag::Bad => "BAD",
            Flag::Fatal => "FATAL",
        }
    }

    /// True if `self` is strictly more severe than `other`.
    pub fn worse_than(self, other: Flag) -> bool {
        self > other
    }

    /// The more severe of two flags.
    #[must_use]
    pub fn max(self, other: Flag) -> Flag {
        std::cmp::max(self, other)
    }

    pub fn is_good(self) -> bool {
        self == Flag::Good
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for Flag {
    type Error = QcError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            2 => Ok(Flag::Good),
            3 => Ok(Flag::Questionable),
            4 => Ok(Flag::Bad),
            44 => Ok(Flag::Fatal),
            other => Err(QcError::InvalidFlag {
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for Flag {
    type Err = QcError;

    /// Accepts flag names (any case) or WOCE codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<i32>() {
            return Flag::try_from(code);
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "GOOD" => Ok(Flag::Good),
            "QUESTIONABLE" => Ok(Flag::Questionable),
            "BAD" => Ok(Flag::Bad),
            "FATAL" => Ok(Flag::Fatal),
            _ => Err(QcError::InvalidFlag {
                value: trimmed.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order() {
        assert!(Flag::Good < Flag::Questionable);
        assert!(Flag::Questionable < Flag::Bad);
        assert!(Flag::Bad < Flag::Fatal);
        assert!(Flag::Fatal.worse_than(Flag::Bad));
        assert!(!Flag::Bad.worse_than(Flag::Bad));
    }

    #[test]
    fn max_picks_worse() {
        assert_eq!(Flag::Good.max(Flag::Bad), Flag::Bad);
        assert_eq!(Flag::Fatal.max(Flag::Questionable), Flag::Fatal);
        assert_eq!(Flag::Good.max(Flag::Good), Flag::Good);
    }

    #[test]
    fn codes_round_trip() {
        for flag in Flag::ALL {
            assert_eq!(Flag::try_from(flag.code()).unwrap(), flag);
        }
    }

    #[test]
    fn invalid_code_rejected() {
        assert!(matches!(
            Flag::try_from(7),
            Err(QcError::InvalidFlag { value }) if value == "7"
        ));
        assert!("SUSPECT".parse::<Flag>().is_err());
    }

    #[test]
    fn parses_names_and_codes() {
        assert_eq!("questionable".parse::<Flag>().unwrap(), Flag::Questionable);
        assert_eq!(" Bad ".parse::<Flag>().unwrap(), Flag::Bad);
        assert_eq!("44".parse::<Flag>().unwrap(), Flag::Fatal);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Flag::Questionable).unwrap();
        assert_eq!(json, "\"questionable\"");
    }
}
