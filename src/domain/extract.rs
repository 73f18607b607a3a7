//! Error extraction.
//!
//! Reduces whatever was attached under the reserved error key to an
//! [`ErrorRecord`]. Extraction never fails: shapes that are not recognized as
//! structured degrade to a plain record holding their rendered text.

use crate::domain::entry::ErrorRecord;
use crate::domain::fault::OpError;
use crate::domain::normalize::Attribute;
use crate::domain::value::Value;
use std::collections::BTreeMap;
use std::error::Error as StdError;

/// Extract an error record from an attribute value.
///
/// - null, or text with nothing in it, yields `None`
/// - a string or any other scalar yields a plain record
/// - a map with any of `code`, `message`, `op`/`operation` is copied field by
///   field; `err`/`error` becomes the underlying text and `file_line` the origin
/// - an error value is handled by [`extract_error`]
pub fn extract(attribute: &Attribute) -> Option<ErrorRecord> {
    match attribute {
        Attribute::Value(value) => extract_value(value),
        Attribute::Error(err) => extract_error(err.as_ref()),
        Attribute::Record(record) => Some(record.clone()).filter(|r| !r.is_empty()),
    }
}

/// Extract an error record from an error value.
///
/// The first [`OpError`] found along the source chain supplies the
/// structured fields, with the rendered root cause as the underlying text.
/// Any other error becomes a plain record of its `Display` output.
pub fn extract_error(err: &(dyn StdError + 'static)) -> Option<ErrorRecord> {
    if let Some(op) = find_op_error(err) {
        let record = ErrorRecord {
            code: op.code().to_string(),
            message: op.message().to_string(),
            operation: op.operation().to_string(),
            underlying: op.root_cause().map(|e| e.to_string()).unwrap_or_default(),
            origin: Some(op.origin().to_string()),
        };
        return Some(record).filter(|r| !r.is_empty());
    }

    plain(err.to_string())
}

fn find_op_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a OpError> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(op) = e.downcast_ref::<OpError>() {
            return Some(op);
        }
        current = e.source();
    }
    None
}

fn extract_value(value: &Value) -> Option<ErrorRecord> {
    match value {
        Value::Null => None,
        Value::String(text) => plain(text.clone()),
        Value::Map(fields) if is_structured(fields) => {
            let record = ErrorRecord {
                code: text_field(fields, &["code"]),
                message: text_field(fields, &["message"]),
                operation: text_field(fields, &["op", "operation"]),
                underlying: text_field(fields, &["err", "error"]),
                origin: fields
                    .get("file_line")
                    .filter(|v| !v.is_null())
                    .map(ToString::to_string),
            };
            Some(record).filter(|r| !r.is_empty())
        }
        other => plain(other.to_string()),
    }
}

fn is_structured(fields: &BTreeMap<String, Value>) -> bool {
    ["code", "message", "op", "operation"]
        .iter()
        .any(|key| fields.contains_key(*key))
}

fn text_field(fields: &BTreeMap<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| fields.get(*key))
        .filter(|v| !v.is_null())
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn plain(text: String) -> Option<ErrorRecord> {
    if text.is_empty() {
        None
    } else {
        Some(ErrorRecord::plain(text))
    }
}
