//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::application::error::StoreError;
use crate::domain::entry::Entry;
use crate::domain::expiry::IndexSpec;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Port for obtaining the current wall-clock time.
///
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Port for the document store entries are persisted to.
///
/// The store is treated as opaque: it can create indexes and insert
/// documents, nothing more. Implementations must be safe to call from many
/// threads at once; the hook adds no locking of its own.
pub trait DocumentStore: Send + Sync + Debug {
    /// Create all of the given indexes in a single request.
    ///
    /// Creating an index identical to an existing one must succeed.
    ///
    /// # Errors
    /// Returns `StoreError` if the store rejects any of the indexes.
    fn create_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StoreError>;

    /// Insert one entry.
    ///
    /// # Errors
    /// Returns `StoreError` if the entry could not be written.
    fn insert(&self, entry: &Entry) -> Result<(), StoreError>;
}
