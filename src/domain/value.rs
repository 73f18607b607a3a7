//! Attribute values attached to log entries.
//!
//! Log attributes are dynamically typed at the call site, so they are carried
//! as a tagged [`Value`]. The serialized form is the document shape the store
//! receives: scalars, arrays and objects map to their JSON counterparts, and
//! the values JSON cannot express use extended-JSON wrappers so they come back
//! with their type:
//! - timestamps as `{"$date": "<RFC 3339>"}`
//! - NaN and infinities as `{"$numberDouble": "NaN" | "Infinity" | "-Infinity"}`
//! - a map whose only key is one of these wrapper names as `{"$map": {...}}`

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

const DATE_KEY: &str = "$date";
const DOUBLE_KEY: &str = "$numberDouble";
const MAP_KEY: &str = "$map";

/// A dynamically typed attribute value.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "Repr")]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer that does not fit in an `i64`.
    UInt(u64),
    /// Floating point number. NaN equals NaN.
    Float(f64),
    /// Point in time.
    Timestamp(DateTime<Utc>),
    /// Text.
    String(String),
    /// Ordered list of values.
    Sequence(Vec<Value>),
    /// Nested mapping.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the text if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the nested mapping if this is a map value.
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Check if this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DateDoc {
    #[serde(rename = "$date")]
    date: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DoubleDoc {
    #[serde(rename = "$numberDouble", deserialize_with = "parse_double")]
    number: f64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MapDoc {
    #[serde(rename = "$map")]
    map: BTreeMap<String, Value>,
}

fn parse_double<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let text = String::deserialize(deserializer)?;
    match text.as_str() {
        "NaN" => Ok(f64::NAN),
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        other => other.parse().map_err(de::Error::custom),
    }
}

fn double_text(number: f64) -> &'static str {
    if number.is_nan() {
        "NaN"
    } else if number.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}

/// A user map that would read back as a wrapper document.
fn needs_escape(map: &BTreeMap<String, Value>) -> bool {
    map.len() == 1
        && map
            .keys()
            .all(|key| [DATE_KEY, DOUBLE_KEY, MAP_KEY].contains(&key.as_str()))
}

// Variant order matters: the wrapper documents must be tried before the
// generic map, and `i64` before `u64` so small unsigned numbers come back
// as `Int`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Timestamp(DateDoc),
    Double(DoubleDoc),
    Escaped(MapDoc),
    String(String),
    Sequence(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl From<Repr> for Value {
    fn from(repr: Repr) -> Self {
        match repr {
            Repr::Null => Value::Null,
            Repr::Bool(b) => Value::Bool(b),
            Repr::Int(i) => Value::Int(i),
            Repr::UInt(u) => Value::UInt(u),
            Repr::Float(f) => Value::Float(f),
            Repr::Timestamp(doc) => Value::Timestamp(doc.date),
            Repr::Double(doc) => Value::Float(doc.number),
            Repr::Escaped(doc) => Value::Map(doc.map),
            Repr::String(s) => Value::String(s),
            Repr::Sequence(v) => Value::Sequence(v),
            Repr::Map(m) => Value::Map(m),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::UInt(u) => serializer.serialize_u64(*u),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(f) => {
                let mut doc = serializer.serialize_map(Some(1))?;
                doc.serialize_entry(DOUBLE_KEY, double_text(*f))?;
                doc.end()
            }
            Value::Timestamp(date) => DateDoc { date: *date }.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => items.serialize(serializer),
            Value::Map(map) if needs_escape(map) => {
                let mut doc = serializer.serialize_map(Some(1))?;
                doc.serialize_entry(MAP_KEY, map)?;
                doc.end()
            }
            Value::Map(map) => map.serialize(serializer),
        }
    }
}

/// Serde helpers writing a `DateTime<Utc>` as `{"$date": ...}`.
///
/// Used for the entry fields that hold timestamps directly, so every
/// timestamp in a document has the same shape. Plain RFC 3339 strings are
/// still accepted when reading.
pub(crate) mod date_doc {
    use super::DateDoc;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Doc(DateDoc),
        Plain(DateTime<Utc>),
    }

    impl From<Stored> for DateTime<Utc> {
        fn from(stored: Stored) -> Self {
            match stored {
                Stored::Doc(doc) => doc.date,
                Stored::Plain(date) => date,
            }
        }
    }

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        DateDoc { date: *date }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        Stored::deserialize(deserializer).map(Into::into)
    }

    /// The same, for a map of timestamps.
    pub mod map {
        use super::{DateDoc, Stored};
        use chrono::{DateTime, Utc};
        use serde::ser::SerializeMap;
        use serde::{Deserialize, Deserializer, Serializer};
        use std::collections::BTreeMap;

        pub fn serialize<S: Serializer>(
            dates: &BTreeMap<String, DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            let mut doc = serializer.serialize_map(Some(dates.len()))?;
            for (key, date) in dates {
                doc.serialize_entry(key, &DateDoc { date: *date })?;
            }
            doc.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<BTreeMap<String, DateTime<Utc>>, D::Error> {
            let stored = BTreeMap::<String, Stored>::deserialize(deserializer)?;
            Ok(stored.into_iter().map(|(key, date)| (key, date.into())).collect())
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Timestamp(date) => f.write_str(&date.to_rfc3339()),
            other => {
                let json = serde_json::to_string(other).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::UInt(value),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(map: BTreeMap<String, T>) -> Self {
        Value::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
