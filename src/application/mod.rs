//! Application layer - orchestration of domain logic.
//!
//! This layer wires the pure domain functions to a document store:
//! - Options and their validation
//! - The hook dispatcher (index creation at build time, normalize, stamp
//!   and persist on every fire)
//! - Error types for every stage
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod error;
pub mod hook;
pub mod options;
pub mod ports;
