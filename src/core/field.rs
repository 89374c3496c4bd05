//! Literal values and scalar types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::cmp::Ordering;
use std::fmt;

/// A typed literal carried by key, context and filter criteria
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Convert a plain JSON value without type information
    ///
    /// Lists and objects have no literal counterpart and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(FieldValue::Null),
            Value::Bool(b) => Some(FieldValue::Boolean(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(FieldValue::Integer(i)),
                None => n.as_f64().map(FieldValue::Float),
            },
            Value::String(s) => Some(FieldValue::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Render the value back to JSON (dates as ISO-8601 strings)
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::String(s) => json!(s),
            FieldValue::Integer(i) => json!(i),
            FieldValue::Float(f) => json!(f),
            FieldValue::Boolean(b) => json!(b),
            FieldValue::Date(d) => json!(d.format("%Y-%m-%d").to_string()),
            FieldValue::DateTime(dt) => json!(dt.to_rfc3339()),
            FieldValue::Null => Value::Null,
        }
    }

    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Order two values of compatible types
    ///
    /// Integers and floats compare numerically. Dates and date-times also
    /// compare against their string renderings, which is how stores without a
    /// native temporal type keep them.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        use FieldValue::*;

        match (self, other) {
            (Integer(a), Integer(b)) => Some(a.cmp(b)),
            (Integer(_) | Float(_), Integer(_) | Float(_)) => {
                self.as_float()?.partial_cmp(&other.as_float()?)
            }
            (String(a), String(b)) => Some(a.cmp(b)),
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (DateTime(a), DateTime(b)) => Some(a.cmp(b)),
            (Date(a), String(s)) => parse_date(s).map(|b| a.cmp(&b)),
            (String(s), Date(b)) => parse_date(s).map(|a| a.cmp(b)),
            (DateTime(a), String(s)) => parse_date_time(s).map(|b| a.cmp(&b)),
            (String(s), DateTime(b)) => parse_date_time(s).map(|a| a.cmp(b)),
            (Null, Null) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

/// Parse an ISO-8601 calendar date (`2020-01-31`)
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_date_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Built-in scalar types known to the filter parser registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Id,
    String,
    Int,
    Float,
    Boolean,
    Date,
    DateTime,
}

impl ScalarType {
    /// Resolve a configured type name, `None` for object types and custom scalars
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "ID" => Some(ScalarType::Id),
            "String" => Some(ScalarType::String),
            "Int" => Some(ScalarType::Int),
            "Float" => Some(ScalarType::Float),
            "Boolean" => Some(ScalarType::Boolean),
            "Date" => Some(ScalarType::Date),
            "DateTime" => Some(ScalarType::DateTime),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarType::Id => "ID",
            ScalarType::String => "String",
            ScalarType::Int => "Int",
            ScalarType::Float => "Float",
            ScalarType::Boolean => "Boolean",
            ScalarType::Date => "Date",
            ScalarType::DateTime => "DateTime",
        }
    }

    /// Whether aggregates may treat the type as numeric without explicit configuration
    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::Float)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
