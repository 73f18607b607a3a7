//! Domain layer - pure types and transformations with no I/O.
//!
//! This layer contains the core concepts of the persistence engine:
//! - Severity levels and dynamically typed attribute values
//! - The canonical entry and its structured error record
//! - Error extraction and entry normalization
//! - Per-level expiry markers and the indexes that enforce them
//!
//! Everything here is pure and easily testable.

pub mod entry;
pub mod expiry;
pub mod extract;
pub mod fault;
pub mod normalize;
pub mod severity;
pub mod value;
