//! Field visitor for turning `tracing` events into raw events.
//!
//! `tracing` hands field values to a `Visit` implementation one at a time and
//! only lends them for the duration of the call. The visitor copies each value
//! into an owned [`Attribute`]; an error recorded under the reserved key is
//! reduced to its [`ErrorRecord`](crate::ErrorRecord) on the spot, since the
//! `&dyn Error` cannot be kept.

use crate::domain::extract::extract_error;
use crate::domain::normalize::{Attribute, RawEvent, ERROR_KEY};
use crate::domain::severity::Severity;
use crate::domain::value::Value;
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::field::{Field, Visit};

/// Name `tracing` gives the formatted message of an event.
const MESSAGE_FIELD: &str = "message";

/// Prefix of the metadata fields added by the `tracing-log` bridge.
const LOG_FIELD_PREFIX: &str = "log.";

/// A visitor that collects an event's message and attributes.
#[derive(Debug, Default)]
pub(crate) struct EventVisitor {
    message: String,
    attributes: Vec<(String, Attribute)>,
}

impl EventVisitor {
    /// Create a new event visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every field of `event` and build the raw event.
    pub fn visit(event: &tracing::Event<'_>, time: DateTime<Utc>) -> RawEvent {
        let mut visitor = Self::new();
        event.record(&mut visitor);

        let level = Severity::from(event.metadata().level());
        let mut raw = RawEvent::at(level, time, visitor.message);
        raw.attributes = visitor.attributes;
        raw
    }

    fn push(&mut self, field: &Field, value: impl Into<Attribute>) {
        let name = field.name();
        if name.starts_with(LOG_FIELD_PREFIX) {
            return;
        }
        self.attributes.push((name.to_string(), value.into()));
    }
}

impl Visit for EventVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value);
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == MESSAGE_FIELD {
            self.message = value.to_string();
            return;
        }
        self.push(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        if field.name() == ERROR_KEY {
            let attribute = extract_error(value).map_or(Attribute::Value(Value::Null), Attribute::Record);
            self.push(field, attribute);
            return;
        }
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == MESSAGE_FIELD {
            self.message = format!("{:?}", value);
            return;
        }
        self.push(field, format!("{:?}", value));
    }
}
