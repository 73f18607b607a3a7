//! The canonical persisted record.

use crate::domain::severity::Severity;
use crate::domain::value::{date_doc, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single log event, normalized for the store.
///
/// Serialized with the field names `level`, `time`, `message`, `data`,
/// `error` and `expiry`. `data` and `error` are omitted from the document
/// when absent; `expiry` is always written, empty when the level has no
/// configured retention. `time` and every expiry marker are written in the
/// same `{"$date": ...}` form as timestamp attributes, so the store indexes
/// them as dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Severity of the event.
    pub level: Severity,
    /// When the event was emitted.
    #[serde(with = "date_doc")]
    pub time: DateTime<Utc>,
    /// Rendered message, possibly empty.
    pub message: String,
    /// Non-error attributes. Never contains the reserved error key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, Value>>,
    /// Structured error, present iff the event carried an error attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
    /// Expiry markers keyed by marker name.
    #[serde(default, with = "date_doc::map")]
    pub expiry: BTreeMap<String, DateTime<Utc>>,
}

impl Entry {
    /// Create an entry with no attributes, error or expiry markers.
    pub fn new(level: Severity, time: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            level,
            time,
            message: message.into(),
            data: None,
            error: None,
            expiry: BTreeMap::new(),
        }
    }

    /// Returns true if the entry has an error attached to it.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Look up a single data attribute.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(key))
    }
}

/// Structured error detail attached to an [`Entry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Classification tag, may be empty.
    pub code: String,
    /// Human readable message.
    pub message: String,
    /// Logical operation where the error originated, may be empty.
    #[serde(rename = "op")]
    pub operation: String,
    /// Rendered root cause.
    #[serde(rename = "err")]
    pub underlying: String,
    /// Source location (`file:line`) where the error was raised.
    #[serde(rename = "file_line", default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl ErrorRecord {
    /// A record holding only the rendered text of an unstructured error.
    pub fn plain(underlying: impl Into<String>) -> Self {
        Self {
            underlying: underlying.into(),
            ..Self::default()
        }
    }

    /// Check whether the record carries any text at all.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
            && self.message.is_empty()
            && self.operation.is_empty()
            && self.underlying.is_empty()
    }

    /// The underlying cause as an error value, if one was recorded.
    pub fn underlying_error(&self) -> Option<RecordedError> {
        if self.underlying.is_empty() {
            None
        } else {
            Some(RecordedError(self.underlying.clone()))
        }
    }
}

/// Error value rebuilt from a persisted [`ErrorRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedError(String);

impl fmt::Display for RecordedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for RecordedError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_has_error() {
        let mut entry = Entry::new(Severity::Info, at(), "message");
        assert!(!entry.has_error());

        entry.error = Some(ErrorRecord::plain("error"));
        assert!(entry.has_error());
    }

    #[test]
    fn test_underlying_error() {
        assert!(ErrorRecord::default().underlying_error().is_none());

        let err = ErrorRecord::plain("error").underlying_error().unwrap();
        assert_eq!(err.to_string(), "error");
    }

    #[test]
    fn test_document_field_names() {
        let mut entry = Entry::new(Severity::Panic, at(), "m");
        entry.error = Some(ErrorRecord {
            code: "X".to_string(),
            message: "m2".to_string(),
            operation: "op1".to_string(),
            underlying: "boom".to_string(),
            origin: Some("main.rs:10".to_string()),
        });

        let doc = serde_json::to_value(&entry).unwrap();
        assert_eq!(doc["level"], "panic");
        assert_eq!(doc["message"], "m");
        assert!(doc.get("data").is_none());
        assert_eq!(doc["expiry"], serde_json::json!({}));

        let error = &doc["error"];
        assert_eq!(error["code"], "X");
        assert_eq!(error["message"], "m2");
        assert_eq!(error["op"], "op1");
        assert_eq!(error["err"], "boom");
        assert_eq!(error["file_line"], "main.rs:10");
    }

    #[test]
    fn test_document_round_trip() {
        let mut entry = Entry::new(Severity::Warn, at(), "m");
        let mut data = BTreeMap::new();
        data.insert("k".to_string(), Value::from("v"));
        data.insert("when".to_string(), Value::from(at()));
        entry.data = Some(data);
        entry.expiry.insert("ttl-warn".to_string(), at());

        let json = serde_json::to_string(&entry).unwrap();
        let back: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_timestamps_share_one_document_shape() {
        let mut entry = Entry::new(Severity::Info, at(), "m");
        entry.data = Some(BTreeMap::from([("when".to_string(), Value::from(at()))]));
        entry.expiry.insert("ttl-info".to_string(), at());

        let doc = serde_json::to_value(&entry).unwrap();
        assert_eq!(doc["time"]["$date"], "2022-01-02T03:04:05Z");
        assert_eq!(doc["expiry"]["ttl-info"]["$date"], "2022-01-02T03:04:05Z");
        assert_eq!(doc["data"]["when"], doc["time"]);
    }

    #[test]
    fn test_attribute_lookup() {
        let mut entry = Entry::new(Severity::Info, at(), "m");
        assert!(entry.attribute("k").is_none());

        entry.data = Some(BTreeMap::from([("k".to_string(), Value::from(1))]));
        assert_eq!(entry.attribute("k"), Some(&Value::Int(1)));
    }
}
