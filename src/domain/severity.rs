//! Severity levels for persisted entries.
//!
//! The set is fixed and ordered from most to least critical. `tracing` only
//! knows five of these levels; `fatal` and `panic` are reachable through the
//! direct [`Hook::fire`](crate::Hook::fire) API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Criticality of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The application panicked.
    Panic,
    /// The application cannot continue.
    Fatal,
    /// An operation failed.
    Error,
    /// Something unexpected happened but the operation continued.
    Warn,
    /// General operational messages.
    Info,
    /// Verbose diagnostics.
    Debug,
    /// Very fine-grained diagnostics.
    Trace,
}

impl Severity {
    /// Every severity, most critical first.
    pub const ALL: [Severity; 7] = [
        Severity::Panic,
        Severity::Fatal,
        Severity::Error,
        Severity::Warn,
        Severity::Info,
        Severity::Debug,
        Severity::Trace,
    ];

    /// Canonical lowercase name, as written to the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Panic => "panic",
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warn => "warn",
            Severity::Info => "info",
            Severity::Debug => "debug",
            Severity::Trace => "trace",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown severity name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a valid severity level: {0:?}")]
pub struct ParseSeverityError(String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "panic" => Ok(Severity::Panic),
            "fatal" => Ok(Severity::Fatal),
            "error" => Ok(Severity::Error),
            "warn" | "warning" => Ok(Severity::Warn),
            "info" => Ok(Severity::Info),
            "debug" => Ok(Severity::Debug),
            "trace" => Ok(Severity::Trace),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        Severity::from(&level)
    }
}

impl From<&tracing::Level> for Severity {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Severity::Error,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::DEBUG => Severity::Debug,
            _ => Severity::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for level in Severity::ALL {
            assert_eq!(level.as_str().parse::<Severity>(), Ok(level));
            assert_eq!(level.to_string(), level.as_str());
        }
    }

    #[test]
    fn test_parse_is_case_insensitive_and_accepts_warning() {
        assert_eq!("WARNING".parse::<Severity>(), Ok(Severity::Warn));
        assert_eq!("Info".parse::<Severity>(), Ok(Severity::Info));
        assert!("verbose".parse::<Severity>().is_err());
    }

    #[test]
    fn test_from_tracing_level() {
        assert_eq!(Severity::from(tracing::Level::ERROR), Severity::Error);
        assert_eq!(Severity::from(tracing::Level::WARN), Severity::Warn);
        assert_eq!(Severity::from(tracing::Level::INFO), Severity::Info);
        assert_eq!(Severity::from(tracing::Level::DEBUG), Severity::Debug);
        assert_eq!(Severity::from(tracing::Level::TRACE), Severity::Trace);
    }

    #[test]
    fn test_ordering_most_critical_first() {
        assert!(Severity::Panic < Severity::Trace);
        let mut sorted = Severity::ALL;
        sorted.sort();
        assert_eq!(sorted, Severity::ALL);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), "\"warn\"");
        let level: Severity = serde_json::from_str("\"panic\"").unwrap();
        assert_eq!(level, Severity::Panic);
    }
}
