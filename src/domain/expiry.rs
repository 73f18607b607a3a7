//! Per-level retention and the expiry indexes that enforce it.
//!
//! Each configured level gets one marker, `ttl-<level>`. Entries of that level
//! carry the marker under `expiry` with the time they were fired, and the store
//! holds one sparse index per marker that deletes documents once the marker is
//! older than the configured duration. Entries of unconfigured levels carry no
//! marker, so no index matches them and they are kept indefinitely.

use crate::domain::entry::Entry;
use crate::domain::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Prefix of every expiry marker name.
pub const MARKER_PREFIX: &str = "ttl-";

/// Entry field holding the expiry markers.
pub const EXPIRY_FIELD: &str = "expiry";

/// Marker name for a level, e.g. `ttl-panic`.
pub fn marker_name(level: Severity) -> String {
    format!("{MARKER_PREFIX}{}", level.as_str())
}

/// Definition of one auto-expiring index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Index name; the marker name.
    pub name: String,
    /// Document path the index covers, e.g. `expiry.ttl-panic`.
    pub key: String,
    /// Seconds after the marker's timestamp at which documents are deleted.
    pub expire_after_secs: u64,
    /// Documents lacking the key are not indexed.
    pub sparse: bool,
}

impl IndexSpec {
    /// Build the index for a level and its retention.
    ///
    /// Sub-second remainders are truncated; configurations carrying them are
    /// rejected earlier, during options validation.
    pub fn for_level(level: Severity, retention: Duration) -> Self {
        let name = marker_name(level);
        Self {
            key: format!("{EXPIRY_FIELD}.{name}"),
            name,
            expire_after_secs: retention.as_secs(),
            sparse: true,
        }
    }

    /// The marker this index reads under `expiry`, if the key points there.
    pub fn marker(&self) -> Option<&str> {
        self.key
            .strip_prefix(EXPIRY_FIELD)
            .and_then(|rest| rest.strip_prefix('.'))
    }

    /// The threshold as a duration.
    pub fn expire_after(&self) -> Duration {
        Duration::from_secs(self.expire_after_secs)
    }
}

/// Retention per severity level.
///
/// Levels absent from the map never expire. A zero duration is a real
/// setting (expire as soon as the store's expiry pass runs), not "unset".
///
/// Deserializes from a map of level name to whole seconds:
///
/// ```
/// use tracing_ttl::{ExpirationLevels, Severity};
/// use std::time::Duration;
///
/// let levels: ExpirationLevels = serde_json::from_str(r#"{"panic": 10, "info": 86400}"#).unwrap();
/// assert_eq!(levels.get(Severity::Panic), Some(Duration::from_secs(10)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Severity, u64>", into = "BTreeMap<Severity, u64>")]
pub struct ExpirationLevels {
    levels: BTreeMap<Severity, Duration>,
}

impl ExpirationLevels {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the retention for a level, replacing any previous value.
    pub fn with(mut self, level: Severity, retention: Duration) -> Self {
        self.insert(level, retention);
        self
    }

    /// Set the retention for a level, returning the previous value.
    pub fn insert(&mut self, level: Severity, retention: Duration) -> Option<Duration> {
        self.levels.insert(level, retention)
    }

    /// Retention configured for a level.
    pub fn get(&self, level: Severity) -> Option<Duration> {
        self.levels.get(&level).copied()
    }

    /// Number of configured levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if no level is configured.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Iterate over configured levels, most critical first.
    pub fn iter(&self) -> impl Iterator<Item = (Severity, Duration)> + '_ {
        self.levels.iter().map(|(level, retention)| (*level, *retention))
    }

    /// Give every unconfigured level the `fallback` retention.
    pub fn fill_unset(&mut self, fallback: Duration) {
        for level in Severity::ALL {
            self.levels.entry(level).or_insert(fallback);
        }
    }

    /// One sparse expiry index per configured level.
    pub fn build_indexes(&self) -> Vec<IndexSpec> {
        self.iter()
            .map(|(level, retention)| IndexSpec::for_level(level, retention))
            .collect()
    }

    /// Stamp the entry's expiry marker if its level has a retention.
    ///
    /// Returns true if a marker was written.
    pub fn stamp(&self, entry: &mut Entry, now: DateTime<Utc>) -> bool {
        if !self.levels.contains_key(&entry.level) {
            return false;
        }
        entry.expiry.insert(marker_name(entry.level), now);
        true
    }
}

impl FromIterator<(Severity, Duration)> for ExpirationLevels {
    fn from_iter<I: IntoIterator<Item = (Severity, Duration)>>(iter: I) -> Self {
        Self {
            levels: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<Severity, u64>> for ExpirationLevels {
    fn from(secs: BTreeMap<Severity, u64>) -> Self {
        secs.into_iter()
            .map(|(level, secs)| (level, Duration::from_secs(secs)))
            .collect()
    }
}

impl From<ExpirationLevels> for BTreeMap<Severity, u64> {
    fn from(levels: ExpirationLevels) -> Self {
        levels
            .iter()
            .map(|(level, retention)| (level, retention.as_secs()))
            .collect()
    }
}
