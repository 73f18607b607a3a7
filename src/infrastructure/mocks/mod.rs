//! Mock implementations for testing.
//!
//! Test doubles for the application ports, so hook behavior can be checked
//! without a real store or the wall clock.

pub mod clock;
pub mod store;

pub use clock::MockClock;
pub use store::MockStore;
