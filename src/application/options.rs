//! Construction-time configuration for the hook.

use crate::application::error::ConfigError;
use crate::application::ports::{Clock, DocumentStore};
use crate::domain::entry::Entry;
use crate::domain::expiry::ExpirationLevels;
use crate::domain::severity::Severity;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Callback invoked with every normalized entry just before it is persisted.
///
/// Runs synchronously on the thread that emitted the event. A panic in the
/// callback propagates to that thread.
pub type FireHook = Arc<dyn Fn(&Entry) + Send + Sync + 'static>;

/// A convenient retention for [`Options::with_default_expiry`]: one week.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// Configuration used to build a [`Hook`](crate::Hook).
///
/// # Example
///
/// ```
/// use tracing_ttl::{ExpirationLevels, MemoryStore, Options, Severity};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let opts = Options::new(Arc::new(MemoryStore::new()))
///     .with_expiration_levels(
///         ExpirationLevels::new()
///             // Expire trace entries after 10 hours.
///             .with(Severity::Trace, Duration::from_secs(10 * 3600))
///             // Expire info entries after a day.
///             .with(Severity::Info, Duration::from_secs(24 * 3600)),
///     );
/// // Panic entries are not configured, so they are kept forever.
/// assert!(opts.validate().is_ok());
/// ```
#[derive(Clone, Default)]
pub struct Options {
    /// The store to write entries to. Required.
    pub collection: Option<Arc<dyn DocumentStore>>,
    /// Called with each entry before it is written.
    pub fire_hook: Option<FireHook>,
    /// Retention per level. Levels without an entry never expire.
    pub expiration_levels: ExpirationLevels,
    /// Retention given to every level missing from `expiration_levels`.
    pub default_expiry: Option<Duration>,
    /// Clock used to timestamp events and expiry markers. Defaults to the
    /// system clock.
    pub clock: Option<Arc<dyn Clock>>,
}

impl Options {
    /// Create options writing to `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: Some(store),
            ..Self::default()
        }
    }

    /// Set the callback invoked before each entry is written.
    pub fn with_fire_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Entry) + Send + Sync + 'static,
    {
        self.fire_hook = Some(Arc::new(hook));
        self
    }

    /// Set the per-level retention.
    pub fn with_expiration_levels(mut self, levels: ExpirationLevels) -> Self {
        self.expiration_levels = levels;
        self
    }

    /// Give every level without an explicit retention this one.
    pub fn with_default_expiry(mut self, retention: Duration) -> Self {
        self.default_expiry = Some(retention);
        self
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the options.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingStore` if no store is set, and a
    /// fractional-seconds error if any retention has a sub-second part.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection.is_none() {
            return Err(ConfigError::MissingStore);
        }
        if let Some((level, duration)) = self
            .expiration_levels
            .iter()
            .find(|(_, duration)| duration.subsec_nanos() != 0)
        {
            return Err(ConfigError::FractionalSeconds { level, duration });
        }
        if let Some(fallback) = self.default_expiry {
            if fallback.subsec_nanos() != 0 {
                return Err(ConfigError::FractionalDefault(fallback));
            }
        }
        Ok(())
    }

    /// The retention table after applying `default_expiry`.
    pub(crate) fn resolved_levels(&self) -> ExpirationLevels {
        let mut levels = self.expiration_levels.clone();
        if let Some(fallback) = self.default_expiry {
            levels.fill_unset(fallback);
        }
        levels
    }

    /// Levels that will be stamped with an expiry marker.
    pub fn expiring_levels(&self) -> Vec<Severity> {
        self.resolved_levels().iter().map(|(level, _)| level).collect()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("collection", &self.collection)
            .field("fire_hook", &self.fire_hook.as_ref().map(|_| "<fn>"))
            .field("expiration_levels", &self.expiration_levels)
            .field("default_expiry", &self.default_expiry)
            .field("clock", &self.clock)
            .finish()
    }
}
