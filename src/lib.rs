//! # tracing-ttl
//!
//! Persist `tracing` events to a document store with per-level retention.
//!
//! Every event becomes a normalized [`Entry`]: level, time, message, the
//! event's fields as typed [`Value`]s, and an optional structured
//! [`ErrorRecord`]. Levels with a configured retention are stamped with an
//! expiry marker, and the store holds one auto-expiring index per such level,
//! so debug noise can disappear after an hour while errors stay for a month
//! and panics are kept forever.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tracing_ttl::{ExpirationLevels, Hook, MemoryStore, Options, PersistLayer, Severity};
//! use tracing_subscriber::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let store = Arc::new(MemoryStore::new());
//! let hook = Hook::new(
//!     Options::new(store.clone()).with_expiration_levels(
//!         ExpirationLevels::new()
//!             .with(Severity::Debug, Duration::from_secs(3600))
//!             .with(Severity::Error, Duration::from_secs(30 * 24 * 3600)),
//!     ),
//! )
//! .unwrap();
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(PersistLayer::new(hook))
//!     .init();
//!
//! tracing::info!(user = "alice", "logged in");
//! ```
//!
//! ## Retention
//!
//! [`ExpirationLevels`] maps a [`Severity`] to a whole-second duration. For
//! each configured level the hook creates one sparse index over
//! `expiry.ttl-<level>` when it is built, and stamps `ttl-<level>` with the
//! fire time on every entry of that level. Levels missing from the map carry
//! no marker and are never expired.
//!
//! - An empty map creates no index and stamps nothing.
//! - A zero duration is a real setting: entries expire on the store's next
//!   expiry pass.
//! - [`Options::with_default_expiry`] gives every unconfigured level one
//!   shared retention.
//!
//! ## Errors
//!
//! Attach an error under the reserved `error` field to get a structured
//! record instead of a plain attribute:
//!
//! ```rust,no_run
//! use tracing_ttl::OpError;
//!
//! let err = OpError::new("NOT_FOUND", "user missing", "Users.Get").with_source("no rows");
//! tracing::error!(error = &err as &dyn std::error::Error, "lookup failed");
//! ```
//!
//! The persisted entry then has `error.code = "NOT_FOUND"`,
//! `error.op = "Users.Get"` and `error.err = "no rows"`. Any other error type
//! is kept as plain text in `error.err`.
//!
//! ## Failures
//!
//! [`Hook::new`] fails when the options are invalid or the store rejects the
//! indexes. [`Hook::fire`] fails when the insert is rejected; the failure is
//! not retried, and the hook keeps working for later events. Inside a
//! subscriber, [`PersistLayer::with_error_handler`] decides what a lost entry
//! means to the application.
//!
//! ## Stores
//!
//! - [`MemoryStore`]: in-process, for tests and short-lived tools.
//! - `RedisStore` (feature `redis-storage`): entries expire through key TTLs.
//! - Anything else: implement [`DocumentStore`].

// Domain layer - pure types and transformations
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    entry::{Entry, ErrorRecord, RecordedError},
    expiry::{marker_name, ExpirationLevels, IndexSpec},
    extract::{extract, extract_error},
    fault::OpError,
    normalize::{normalize, Attribute, RawEvent, ERROR_KEY},
    severity::{ParseSeverityError, Severity},
    value::Value,
};

pub use application::{
    error::{ConfigError, HookError, StoreError},
    hook::Hook,
    options::{FireHook, Options, DEFAULT_EXPIRY},
    ports::{Clock, DocumentStore},
};

pub use infrastructure::{
    clock::SystemClock,
    layer::{ErrorHandler, PersistLayer},
    memory_store::MemoryStore,
};

#[cfg(feature = "redis-storage")]
pub use infrastructure::redis_store::{RedisStore, RedisStoreConfig};
