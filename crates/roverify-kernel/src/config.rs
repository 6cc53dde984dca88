//! Verbosity switch.
//!
//! The only configuration this subsystem reads is one environment variable,
//! [`VERBOSITY_ENV`], with recognized values:
//!
//! - `0`: report detected mutations only
//! - `1`: also confirm each region that was not modified
//! - `2`: also confirm every variable that was checked
//!
//! Anything else falls back to `0` and produces one warning.

use serde::{Deserialize, Serialize};

/// Name of the environment variable selecting the verbosity.
pub const VERBOSITY_ENV: &str = "READ_ONLY_VERIFY_VERBOSE";

/// How much a session reports beyond detected mutations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    #[default]
    Quiet,
    Region,
    Variable,
}

impl Verbosity {
    /// Numeric level as written in the environment.
    pub fn level(self) -> u8 {
        match self {
            Self::Quiet => 0,
            Self::Region => 1,
            Self::Variable => 2,
        }
    }

    /// Resolve a raw switch value.
    ///
    /// Returns the verbosity together with the rejected value, if any. An
    /// unset switch is not a misconfiguration.
    pub fn resolve(raw: Option<&str>) -> (Self, Option<String>) {
        match raw {
            None => (Self::Quiet, None),
            Some(raw) => match raw.parse() {
                Ok(level) => (level, None),
                Err(_) => (Self::Quiet, Some(raw.to_string())),
            },
        }
    }

    /// Resolve the switch from [`VERBOSITY_ENV`].
    pub fn from_env() -> (Self, Option<String>) {
        let raw = std::env::var(VERBOSITY_ENV).ok();
        Self::resolve(raw.as_deref())
    }
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.level())
    }
}

impl std::str::FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Self::Quiet),
            "1" => Ok(Self::Region),
            "2" => Ok(Self::Variable),
            _ => Err(format!("unknown verbosity: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_ordering() {
        assert!(Verbosity::Variable > Verbosity::Region);
        assert!(Verbosity::Region > Verbosity::Quiet);
    }

    #[test]
    fn verbosity_parse() {
        assert_eq!("0".parse::<Verbosity>().unwrap(), Verbosity::Quiet);
        assert_eq!("1".parse::<Verbosity>().unwrap(), Verbosity::Region);
        assert_eq!(" 2 ".parse::<Verbosity>().unwrap(), Verbosity::Variable);
        assert!("3".parse::<Verbosity>().is_err());
        assert!("x".parse::<Verbosity>().is_err());
    }

    #[test]
    fn unset_switch_is_quiet_without_warning() {
        assert_eq!(Verbosity::resolve(None), (Verbosity::Quiet, None));
    }

    #[test]
    fn unknown_switch_falls_back_with_warning() {
        assert_eq!(
            Verbosity::resolve(Some("x")),
            (Verbosity::Quiet, Some("x".to_string()))
        );
        assert_eq!(Verbosity::resolve(Some("2")), (Verbosity::Variable, None));
    }
}
