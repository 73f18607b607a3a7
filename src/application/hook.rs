//! The hook dispatcher.
//!
//! A [`Hook`] is built once from [`Options`], creating the expiry indexes on
//! the way, and then fired for every log event. It holds no mutable state, so
//! one instance can be shared across threads behind an `Arc`.

use crate::application::error::{ConfigError, HookError};
use crate::application::options::{FireHook, Options};
use crate::application::ports::{Clock, DocumentStore};
use crate::domain::expiry::ExpirationLevels;
use crate::domain::normalize::{normalize, RawEvent};
use crate::domain::severity::Severity;
use crate::infrastructure::clock::SystemClock;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Normalizes log events and persists them with per-level expiry markers.
#[derive(Clone)]
pub struct Hook {
    store: Arc<dyn DocumentStore>,
    fire_hook: Option<FireHook>,
    levels: ExpirationLevels,
    clock: Arc<dyn Clock>,
}

impl Hook {
    /// Build a hook.
    ///
    /// Validates `opts`, then creates one sparse expiry index per configured
    /// level in a single request. No request is made when no level expires.
    ///
    /// # Errors
    /// Returns `HookError::Config` if the options are invalid and
    /// `HookError::Index` if the store rejects the indexes. No hook is
    /// returned in either case.
    pub fn new(opts: Options) -> Result<Self, HookError> {
        const OP: &str = "Hook.New";

        opts.validate()
            .map_err(|source| HookError::Config { op: OP, source })?;

        let levels = opts.resolved_levels();
        let Options {
            collection,
            fire_hook,
            clock,
            ..
        } = opts;
        let store = collection.ok_or(HookError::Config {
            op: OP,
            source: ConfigError::MissingStore,
        })?;

        let indexes = levels.build_indexes();
        if !indexes.is_empty() {
            if let Err(source) = store.create_indexes(&indexes) {
                tracing::warn!(error = %source, indexes = indexes.len(), "failed to create expiry indexes");
                return Err(HookError::Index { op: OP, source });
            }
            tracing::debug!(indexes = indexes.len(), "created expiry indexes");
        }

        Ok(Self {
            store,
            fire_hook,
            levels,
            clock: clock.unwrap_or_else(|| Arc::new(SystemClock::new())),
        })
    }

    /// Severities this hook handles: always all of them.
    ///
    /// Level filtering is left to the subscriber the hook is registered with.
    pub fn levels(&self) -> &'static [Severity] {
        &Severity::ALL
    }

    /// Normalize, stamp and persist one event.
    ///
    /// The fire hook, if any, sees the entry before it is written, including
    /// when the write then fails.
    ///
    /// # Errors
    /// Returns `HookError::Persist` if the store rejects the insert. The
    /// failure is not retried.
    pub fn fire(&self, event: &RawEvent) -> Result<(), HookError> {
        const OP: &str = "Hook.Fire";

        let mut entry = normalize(event);
        self.levels.stamp(&mut entry, self.clock.now());

        if let Some(hook) = &self.fire_hook {
            hook(&entry);
        }

        self.store
            .insert(&entry)
            .map_err(|source| HookError::Persist { op: OP, source })
    }

    /// The effective retention table, after applying any default expiry.
    pub fn expiration_levels(&self) -> &ExpirationLevels {
        &self.levels
    }

    /// Current time according to the hook's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The store entries are written to.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("store", &self.store)
            .field("fire_hook", &self.fire_hook.as_ref().map(|_| "<fn>"))
            .field("levels", &self.levels)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fault::OpError;
    use crate::domain::value::Value;
    use crate::infrastructure::mocks::{MockClock, MockStore};
    use std::sync::Mutex;
    use std::time::Duration;

    fn mock_store() -> Arc<MockStore> {
        Arc::new(MockStore::new())
    }

    #[test]
    fn test_new_without_store() {
        let err = Hook::new(Options::default()).unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.message(), "Error validating Options");
        assert_eq!(err.op(), "Hook.New");
    }

    #[test]
    fn test_new_without_levels_skips_index_request() {
        let store = mock_store();
        Hook::new(Options::new(store.clone())).unwrap();
        assert_eq!(store.index_requests(), 0);
    }

    #[test]
    fn test_new_creates_indexes_in_one_request() {
        let store = mock_store();
        let opts = Options::new(store.clone()).with_expiration_levels(
            ExpirationLevels::new()
                .with(Severity::Panic, Duration::from_secs(10))
                .with(Severity::Info, Duration::from_secs(60)),
        );
        Hook::new(opts).unwrap();

        assert_eq!(store.index_requests(), 1);
        let indexes = store.indexes();
        assert_eq!(indexes.len(), 2);
        assert!(indexes
            .iter()
            .any(|i| i.key == "expiry.ttl-panic" && i.expire_after_secs == 10));
    }

    #[test]
    fn test_new_index_failure() {
        let store = mock_store();
        store.fail_indexes(true);
        let opts = Options::new(store).with_expiration_levels(
            ExpirationLevels::new().with(Severity::Panic, Duration::from_secs(10)),
        );

        let err = Hook::new(opts).unwrap_err();
        assert!(err.is_index());
        assert_eq!(err.message(), "Error creating indexes");
    }

    #[test]
    fn test_levels_is_every_severity() {
        let hook = Hook::new(Options::new(mock_store())).unwrap();
        assert_eq!(hook.levels(), &Severity::ALL);
    }

    #[test]
    fn test_fire_persists_normalized_entry() {
        let store = mock_store();
        let hook = Hook::new(Options::new(store.clone())).unwrap();

        let event = RawEvent::new(Severity::Info, "m").with_attribute("k", "v");
        hook.fire(&event).unwrap();

        let entries = store.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "m");
        assert_eq!(entries[0].attribute("k"), Some(&Value::from("v")));
        assert!(entries[0].expiry.is_empty());
        assert!(entries[0].error.is_none());
    }

    #[test]
    fn test_fire_stamps_with_clock() {
        let store = mock_store();
        let clock = MockClock::new(Utc::now());
        let opts = Options::new(store.clone())
            .with_clock(Arc::new(clock.clone()))
            .with_expiration_levels(
                ExpirationLevels::new().with(Severity::Panic, Duration::from_secs(1)),
            );
        let hook = Hook::new(opts).unwrap();

        clock.advance(Duration::from_secs(5));
        hook.fire(&RawEvent::new(Severity::Panic, "p")).unwrap();
        hook.fire(&RawEvent::new(Severity::Info, "i")).unwrap();

        let entries = store.entries();
        assert_eq!(entries[0].expiry.get("ttl-panic"), Some(&clock.now()));
        assert!(entries[1].expiry.is_empty());
    }

    #[test]
    fn test_fire_hook_runs_before_failed_write() {
        let store = mock_store();
        store.fail_inserts(true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_hook = Arc::clone(&seen);
        let opts = Options::new(store.clone()).with_fire_hook(move |entry| {
            seen_by_hook.lock().unwrap().push(entry.message.clone());
        });
        let hook = Hook::new(opts).unwrap();

        let err = hook
            .fire(&RawEvent::new(Severity::Error, "lost").with_error(OpError::new("X", "m", "op")))
            .unwrap_err();

        assert!(err.is_persist());
        assert_eq!(err.op(), "Hook.Fire");
        assert_eq!(*seen.lock().unwrap(), vec!["lost".to_string()]);
        assert!(store.entries().is_empty());
    }

    #[test]
    fn test_persist_failure_is_not_fatal() {
        let store = mock_store();
        let hook = Hook::new(Options::new(store.clone())).unwrap();

        store.fail_inserts(true);
        assert!(hook.fire(&RawEvent::new(Severity::Warn, "first")).is_err());

        store.fail_inserts(false);
        hook.fire(&RawEvent::new(Severity::Warn, "second")).unwrap();
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.insert_attempts(), 2);
    }
}
