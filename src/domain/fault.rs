//! Structured error values.
//!
//! [`OpError`] is the error shape the extractor recognizes as carrying
//! structured fields. Attach one to a log event under the `error` key and the
//! persisted entry keeps its code, message, operation and origin verbatim.
//!
//! ```
//! use tracing_ttl::OpError;
//! use std::io;
//!
//! let err = OpError::internal(
//!     io::Error::new(io::ErrorKind::Other, "disk full"),
//!     "Error saving report",
//!     "Reports.Save",
//! );
//! tracing::error!(error = &err as &dyn std::error::Error, "save failed");
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;

/// Code for errors caused by the caller's input.
pub const INVALID: &str = "invalid";
/// Code for unexpected internal failures.
pub const INTERNAL: &str = "internal";

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// An error carrying a classification code, a human message, the operation
/// it occurred in, an optional cause and the source location it was raised at.
#[derive(Debug)]
pub struct OpError {
    code: String,
    message: String,
    operation: String,
    source: Option<BoxError>,
    origin: String,
}

impl OpError {
    /// Create an error without an underlying cause.
    #[track_caller]
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        let location = Location::caller();
        Self {
            code: code.into(),
            message: message.into(),
            operation: operation.into(),
            source: None,
            origin: format!("{}:{}", location.file(), location.line()),
        }
    }

    /// Create an [`INTERNAL`] error wrapping `source`.
    #[track_caller]
    pub fn internal(
        source: impl Into<BoxError>,
        message: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self::new(INTERNAL, message, operation).with_source(source)
    }

    /// Create an [`INVALID`] error wrapping `source`.
    #[track_caller]
    pub fn invalid(
        source: impl Into<BoxError>,
        message: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self::new(INVALID, message, operation).with_source(source)
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Classification code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Operation the error occurred in.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// `file:line` where the error was constructed.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The innermost cause, if any.
    pub fn root_cause(&self) -> Option<&(dyn StdError + 'static)> {
        let mut current: &(dyn StdError + 'static) = self.source.as_deref()?;
        while let Some(next) = current.source() {
            current = next;
        }
        Some(current)
    }
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.code.is_empty() {
            write!(f, "[{}] ", self.code)?;
        }
        if !self.operation.is_empty() {
            write!(f, "{}: ", self.operation)?;
        }
        f.write_str(&self.message)?;
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for OpError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}
