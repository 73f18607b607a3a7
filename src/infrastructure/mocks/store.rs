//! Recording store for testing.

use crate::application::error::StoreError;
use crate::application::ports::DocumentStore;
use crate::domain::entry::Entry;
use crate::domain::expiry::IndexSpec;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A [`DocumentStore`] that records every request and can be told to fail.
///
/// ```
/// use tracing_ttl::infrastructure::mocks::MockStore;
/// use tracing_ttl::{DocumentStore, Entry, Severity};
///
/// let store = MockStore::new();
/// store.fail_inserts(true);
/// assert!(store.insert(&Entry::new(Severity::Info, chrono::Utc::now(), "m")).is_err());
/// assert_eq!(store.insert_attempts(), 1);
/// assert!(store.entries().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct MockStore {
    entries: Mutex<Vec<Entry>>,
    indexes: Mutex<Vec<IndexSpec>>,
    index_requests: AtomicUsize,
    insert_attempts: AtomicUsize,
    fail_indexes: AtomicBool,
    fail_inserts: AtomicBool,
}

impl MockStore {
    /// Create a store that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create_indexes` fail (or succeed again).
    pub fn fail_indexes(&self, fail: bool) {
        self.fail_indexes.store(fail, Ordering::SeqCst);
    }

    /// Make `insert` fail (or succeed again).
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Number of `create_indexes` calls, failed ones included.
    pub fn index_requests(&self) -> usize {
        self.index_requests.load(Ordering::SeqCst)
    }

    /// Number of `insert` calls, failed ones included.
    pub fn insert_attempts(&self) -> usize {
        self.insert_attempts.load(Ordering::SeqCst)
    }

    /// Indexes accepted so far.
    pub fn indexes(&self) -> Vec<IndexSpec> {
        self.indexes.lock().expect("MockStore mutex poisoned").clone()
    }

    /// Entries accepted so far, in insertion order.
    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().expect("MockStore mutex poisoned").clone()
    }
}

impl DocumentStore for MockStore {
    fn create_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StoreError> {
        self.index_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_indexes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("index creation disabled".to_string()));
        }
        self.indexes
            .lock()
            .expect("MockStore mutex poisoned")
            .extend_from_slice(indexes);
        Ok(())
    }

    fn insert(&self, entry: &Entry) -> Result<(), StoreError> {
        self.insert_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("inserts disabled".to_string()));
        }
        self.entries
            .lock()
            .expect("MockStore mutex poisoned")
            .push(entry.clone());
        Ok(())
    }
}
