//! Error types for configuration, stores and the hook.

use crate::domain::severity::Severity;
use std::time::Duration;
use thiserror::Error;

/// Invalid [`Options`](crate::Options).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No document store was configured.
    #[error("no document store configured")]
    MissingStore,
    /// A retention is not a whole number of seconds.
    #[error("retention for {level} must be whole seconds, got {duration:?}")]
    FractionalSeconds {
        /// Level the retention was configured for.
        level: Severity,
        /// The rejected retention.
        duration: Duration,
    },
    /// The default expiry is not a whole number of seconds.
    #[error("default expiry must be whole seconds, got {0:?}")]
    FractionalDefault(Duration),
}

/// Failure reported by a [`DocumentStore`](crate::DocumentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused the request.
    #[error("store rejected the request: {0}")]
    Rejected(String),
    /// The entry could not be encoded as a document.
    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
    /// No async runtime could be created to drive the store client.
    #[error("failed to start store runtime: {0}")]
    Runtime(#[from] std::io::Error),
    /// A blocking call was made from a current-thread tokio runtime, which
    /// the store client cannot be driven from.
    #[cfg(feature = "redis-storage")]
    #[error("store cannot block inside a current-thread tokio runtime")]
    CurrentThreadRuntime,
    /// Redis command failed.
    #[cfg(feature = "redis-storage")]
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Error returned by [`Hook`](crate::Hook) construction and [`Hook::fire`](crate::Hook::fire).
///
/// Every variant is tagged with the operation that produced it so callers can
/// tell configuration problems from storage problems.
#[derive(Debug, Error)]
pub enum HookError {
    /// Options failed validation; no hook was built.
    #[error("{op}: Error validating Options: {source}")]
    Config {
        /// Operation tag.
        op: &'static str,
        /// Validation failure.
        #[source]
        source: ConfigError,
    },
    /// The store rejected index creation; no hook was built.
    #[error("{op}: Error creating indexes: {source}")]
    Index {
        /// Operation tag.
        op: &'static str,
        /// Store failure.
        #[source]
        source: StoreError,
    },
    /// The store rejected an insert. The hook stays usable.
    #[error("{op}: Error writing entry to store: {source}")]
    Persist {
        /// Operation tag.
        op: &'static str,
        /// Store failure.
        #[source]
        source: StoreError,
    },
}

impl HookError {
    /// The operation that produced the error.
    pub fn op(&self) -> &'static str {
        match self {
            HookError::Config { op, .. }
            | HookError::Index { op, .. }
            | HookError::Persist { op, .. } => *op,
        }
    }

    /// The stage message, without operation or cause.
    pub fn message(&self) -> &'static str {
        match self {
            HookError::Config { .. } => "Error validating Options",
            HookError::Index { .. } => "Error creating indexes",
            HookError::Persist { .. } => "Error writing entry to store",
        }
    }

    /// Check if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, HookError::Config { .. })
    }

    /// Check if this is an index creation error.
    pub fn is_index(&self) -> bool {
        matches!(self, HookError::Index { .. })
    }

    /// Check if this is a persistence error.
    pub fn is_persist(&self) -> bool {
        matches!(self, HookError::Persist { .. })
    }
}
