//! Redis-backed document store.
//!
//! Entries are written as JSON strings and expire through Redis key TTLs,
//! which play the part of the expiry indexes:
//! - Indexes: hash `<prefix>indexes`, marker name to threshold seconds
//! - Entries: `<prefix>entry:<level>:<uuid>`, JSON document
//! - TTL: the threshold of the index covering the entry's marker, at least
//!   one second; entries without a marker never expire
//!
//! The store client is async while [`DocumentStore`] is not. Calls made from
//! inside a multi-threaded tokio runtime block in place on it. Calls made
//! outside any runtime drive a runtime the store starts on first use and
//! keeps. Calls made from a current-thread runtime fail with
//! [`StoreError::CurrentThreadRuntime`], since blocking there would stall the
//! only worker.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tracing_ttl::{ExpirationLevels, Hook, Options, RedisStore, RedisStoreConfig, Severity};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RedisStoreConfig {
//!         key_prefix: "app-logs:".to_string(),
//!     };
//!     let store = RedisStore::connect_with_config("redis://127.0.0.1/", config)
//!         .await
//!         .expect("Failed to connect to Redis");
//!
//!     let hook = Hook::new(Options::new(Arc::new(store)).with_expiration_levels(
//!         ExpirationLevels::new().with(Severity::Debug, Duration::from_secs(3600)),
//!     ))
//!     .expect("Failed to build hook");
//! }
//! ```

use crate::application::error::StoreError;
use crate::application::ports::DocumentStore;
use crate::domain::entry::Entry;
use crate::domain::expiry::IndexSpec;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use uuid::Uuid;

/// Configuration for the Redis store.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Key prefix for Redis keys (default: "tracing-ttl:")
    pub key_prefix: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: "tracing-ttl:".to_string(),
        }
    }
}

/// A [`DocumentStore`] writing entries to Redis.
///
/// Cloning is cheap; clones share the connection and the index cache.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    config: RedisStoreConfig,
    /// Marker name to threshold seconds, as stored in the index hash.
    thresholds: Arc<DashMap<String, u64>>,
    /// Runtime for calls made outside any tokio runtime.
    runtime: Arc<OnceLock<Runtime>>,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("config", &self.config)
            .field("indexes", &self.thresholds.len())
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to Redis with default configuration.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., "redis://127.0.0.1/")
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        Self::connect_with_config(url, RedisStoreConfig::default()).await
    }

    /// Connect to Redis with custom configuration.
    ///
    /// Indexes already recorded under the prefix are loaded, so entries
    /// written by this instance honor retention set up by another one.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect_with_config(
        url: &str,
        config: RedisStoreConfig,
    ) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let mut connection = ConnectionManager::new(client).await?;

        let recorded: HashMap<String, u64> = connection.hgetall(index_key(&config)).await?;
        let thresholds = Arc::new(recorded.into_iter().collect::<DashMap<_, _>>());

        Ok(Self {
            connection,
            config,
            thresholds,
            runtime: Arc::new(OnceLock::new()),
        })
    }

    /// The store's configuration.
    pub fn config(&self) -> &RedisStoreConfig {
        &self.config
    }

    /// Redis key an entry is written under.
    fn entry_key(&self, entry: &Entry) -> String {
        format!(
            "{}entry:{}:{}",
            self.config.key_prefix,
            entry.level.as_str(),
            Uuid::new_v4()
        )
    }

    /// Key TTL for an entry, from the first marker with a known index.
    fn ttl_for(&self, entry: &Entry) -> Option<u64> {
        entry
            .expiry
            .keys()
            .find_map(|marker| self.thresholds.get(marker).map(|secs| *secs))
            .map(|secs| secs.max(1))
    }

    async fn record_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        let key = index_key(&self.config);

        let recorded: HashMap<String, u64> = conn.hgetall(&key).await?;
        if let Some(conflict) = indexes.iter().find(|spec| {
            recorded
                .get(&spec.name)
                .is_some_and(|secs| *secs != spec.expire_after_secs)
        }) {
            return Err(StoreError::Rejected(format!(
                "index {} already exists with different options",
                conflict.name
            )));
        }

        let fields: Vec<(&str, u64)> = indexes
            .iter()
            .map(|spec| (spec.name.as_str(), spec.expire_after_secs))
            .collect();
        if !fields.is_empty() {
            conn.hset_multiple::<_, _, _, ()>(&key, &fields).await?;
        }

        for spec in indexes {
            self.thresholds
                .insert(spec.name.clone(), spec.expire_after_secs);
        }
        Ok(())
    }

    async fn write(&self, entry: &Entry) -> Result<(), StoreError> {
        let key = self.entry_key(entry);
        let document = serde_json::to_string(entry)?;
        let mut conn = self.connection.clone();

        match self.ttl_for(entry) {
            Some(ttl_secs) => conn.set_ex::<_, _, ()>(&key, document, ttl_secs).await?,
            None => conn.set::<_, _, ()>(&key, document).await?,
        }
        Ok(())
    }
}

/// Run a store future from sync code.
///
/// `runtime` is started on the first call made outside a tokio runtime and
/// reused by later ones.
fn block_on<F, T>(runtime: &OnceLock<Runtime>, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match Handle::try_current() {
        Ok(handle) => match handle.runtime_flavor() {
            RuntimeFlavor::MultiThread => tokio::task::block_in_place(|| handle.block_on(fut)),
            _ => Err(StoreError::CurrentThreadRuntime),
        },
        Err(_) => {
            let rt = match runtime.get() {
                Some(rt) => rt,
                None => {
                    let fresh = Runtime::new()?;
                    runtime.get_or_init(|| fresh)
                }
            };
            rt.block_on(fut)
        }
    }
}

fn index_key(config: &RedisStoreConfig) -> String {
    format!("{}indexes", config.key_prefix)
}

impl DocumentStore for RedisStore {
    fn create_indexes(&self, indexes: &[IndexSpec]) -> Result<(), StoreError> {
        block_on(&self.runtime, self.record_indexes(indexes))
    }

    fn insert(&self, entry: &Entry) -> Result<(), StoreError> {
        block_on(&self.runtime, self.write(entry)).inspect_err(|e| {
            tracing::warn!(error = %e, level = %entry.level, "Failed to write entry to Redis");
        })
    }
}
