//! Entry normalization.
//!
//! Turns a loosely typed [`RawEvent`] into a canonical [`Entry`]. The
//! attribute stored under [`ERROR_KEY`] is routed to the error extractor and
//! never copied into `data`; every other attribute is copied unchanged.

use crate::domain::entry::{Entry, ErrorRecord};
use crate::domain::extract::extract;
use crate::domain::severity::Severity;
use crate::domain::value::Value;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

/// Attribute key reserved for the event's attached error.
pub const ERROR_KEY: &str = "error";

/// A value attached to a raw event.
pub enum Attribute {
    /// A plain value.
    Value(Value),
    /// An owned error value.
    Error(Box<dyn StdError + Send + Sync + 'static>),
    /// An error already reduced to its record, used when the original error
    /// was only borrowed (as with `tracing` fields).
    Record(ErrorRecord),
}

impl Attribute {
    /// Wrap an error value.
    pub fn error(err: impl StdError + Send + Sync + 'static) -> Self {
        Attribute::Error(Box::new(err))
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Attribute::Error(err) => f.debug_tuple("Error").field(&err.to_string()).finish(),
            Attribute::Record(record) => f.debug_tuple("Record").field(record).finish(),
        }
    }
}

impl From<Value> for Attribute {
    fn from(value: Value) -> Self {
        Attribute::Value(value)
    }
}

impl From<ErrorRecord> for Attribute {
    fn from(record: ErrorRecord) -> Self {
        Attribute::Record(record)
    }
}

macro_rules! attribute_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Attribute {
                fn from(value: $ty) -> Self {
                    Attribute::Value(Value::from(value))
                }
            }
        )*
    };
}

attribute_from_value!(&str, String, bool, i32, i64, u32, u64, f64, DateTime<Utc>);

/// A log event as received from the logging façade.
#[derive(Debug)]
pub struct RawEvent {
    /// Severity of the event.
    pub level: Severity,
    /// When the event was emitted.
    pub time: DateTime<Utc>,
    /// Rendered message.
    pub message: String,
    /// Attributes in insertion order. Later duplicates win.
    pub attributes: Vec<(String, Attribute)>,
}

impl RawEvent {
    /// Create an event stamped with the current time.
    pub fn new(level: Severity, message: impl Into<String>) -> Self {
        Self::at(level, Utc::now(), message)
    }

    /// Create an event with an explicit timestamp.
    pub fn at(level: Severity, time: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            level,
            time,
            message: message.into(),
            attributes: Vec::new(),
        }
    }

    /// Append an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Attribute>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Attach an error under [`ERROR_KEY`].
    pub fn with_error(self, err: impl StdError + Send + Sync + 'static) -> Self {
        self.with_attribute(ERROR_KEY, Attribute::error(err))
    }
}

/// Normalize a raw event into an entry.
///
/// Pure: the result depends only on `event`. `expiry` is left empty.
pub fn normalize(event: &RawEvent) -> Entry {
    let mut entry = Entry::new(event.level, event.time, event.message.clone());
    let mut data = BTreeMap::new();

    for (key, attribute) in &event.attributes {
        if key == ERROR_KEY {
            entry.error = extract(attribute);
            continue;
        }
        let value = match attribute {
            Attribute::Value(value) => value.clone(),
            Attribute::Error(err) => Value::String(err.to_string()),
            Attribute::Record(record) => Value::String(record.underlying.clone()),
        };
        data.insert(key.clone(), value);
    }

    if !data.is_empty() {
        entry.data = Some(data);
    }
    entry
}
