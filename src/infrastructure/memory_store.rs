//! In-process document store.
//!
//! Keeps entries in a concurrent map and enforces expiry indexes the way a
//! document store's background TTL pass does, except that the pass runs only
//! when [`MemoryStore::purge_expired`] is called.

use crate::application::error::StoreError;
use crate::application::ports::DocumentStore;
use crate::domain::entry::Entry;
use crate::domain::expiry::IndexSpec;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe in-memory store backed by DashMap.
///
/// DashMap provides lock-free reads and fine-grained locking for writes, so
/// many threads can insert at once without contending on a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: DashMap<u64, Entry>,
    indexes: DashMap<String, IndexSpec>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// All stored entries in insertion order.
    pub fn entries(&self) -> Vec<Entry> {
        let mut docs: Vec<(u64, Entry)> = self
            .documents
            .iter()
            .map(|doc| (*doc.key(), doc.value().clone()))
            .collect();
        docs.sort_by_key(|(id, _)| *id);
        docs.into_iter().map(|(_, entry)| entry).collect()
    }

    /// All created indexes, ordered by name.
    pub fn indexes(&self) -> Vec<IndexSpec> {
        let mut specs: Vec<IndexSpec> = self.indexes.iter().map(|i| i.value().clone()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Delete every entry an expiry index considers expired at `now`.
    ///
    /// An entry is expired when it carries the marker an index covers and
    /// `marker + threshold <= now`. Entries without any indexed marker are
    /// never touched, nor are entries whose expiry time lies beyond the
    /// representable date range. Returns the number of deleted entries.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let thresholds: Vec<(String, chrono::Duration)> = self
            .indexes
            .iter()
            .filter_map(|index| {
                let marker = index.marker()?.to_string();
                let after = chrono::Duration::from_std(index.expire_after()).ok()?;
                Some((marker, after))
            })
            .collect();
        if thresholds.is_empty() {
            return 0;
        }

        let before = self.documents.len();
        self.documents.retain(|_, entry| {
            !thresholds.iter().any(|(marker, after)| {
                entry
                    .expiry
                    .get(marker)
                    .and_then(|stamped| stamped.checked_add_signed(*after))
                    .is_some_and(|expires| expires <= now)
            })
        });
        before.saturating_sub(self.documents.len())
    }

    /// Remove all entries. Indexes are kept.
    pub fn clear(&self) {
        self.documents.clear();
    }
}

impl DocumentStore for MemoryStore {
    fn create_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StoreError> {
        // Check every index before creating any, so a conflict leaves no
        // partial set behind.
        for spec in indexes {
            if let Some(existing) = self.indexes.get(&spec.name) {
                if *existing != *spec {
                    return Err(StoreError::Rejected(format!(
                        "index {} already exists with different options",
                        spec.name
                    )));
                }
            }
        }

        for spec in indexes {
            match self.indexes.entry(spec.name.clone()) {
                MapEntry::Occupied(existing) if existing.get() != spec => {
                    return Err(StoreError::Rejected(format!(
                        "index {} already exists with different options",
                        spec.name
                    )));
                }
                MapEntry::Occupied(_) => {}
                MapEntry::Vacant(slot) => {
                    slot.insert(spec.clone());
                }
            }
        }
        Ok(())
    }

    fn insert(&self, entry: &Entry) -> Result<(), StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.documents.insert(id, entry.clone());
        Ok(())
    }
}
