//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Document stores (in-memory, Redis)
//! - Tracing integration (Layer trait)

pub mod clock;
pub mod layer;
pub mod memory_store;
pub(crate) mod visitor;

#[cfg(feature = "redis-storage")]
pub mod redis_store;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// tracing-ttl = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
