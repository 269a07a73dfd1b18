//! Metadata values carried through render options
//!
//! Front ends attach arbitrary key/value metadata to a render call. The
//! hypertext target surfaces scalar entries as `<meta>` tags and the package
//! target writes them into core properties, so the value space is a closed
//! union rather than an open-ended JSON type.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A single metadata value.
///
/// Objects keep their entries in insertion order; callers that care about
/// the order of emitted `<meta>` tags rely on that.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<MetaValue>),
    Object(Vec<(String, MetaValue)>),
}

impl MetaValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetaValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[MetaValue]> {
        match self {
            MetaValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(String, MetaValue)]> {
        match self {
            MetaValue::Object(entries) => Some(entries),
            _ => None,
        }
    }

    /// Flat text rendering for scalar values.
    ///
    /// Arrays and objects return `None`; targets that can only carry flat
    /// strings skip those entries.
    pub fn as_plain_text(&self) -> Option<String> {
        match self {
            MetaValue::Null => Some(String::new()),
            MetaValue::Bool(value) => Some(value.to_string()),
            MetaValue::Number(value) => Some(format_number(*value)),
            MetaValue::String(value) => Some(value.clone()),
            MetaValue::Array(_) | MetaValue::Object(_) => None,
        }
    }
}

/// Integral floats print without a trailing `.0` so `Number(3.0)` reads "3".
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Null => write!(f, "null"),
            MetaValue::Bool(value) => write!(f, "{}", value),
            MetaValue::Number(value) => write!(f, "{}", format_number(*value)),
            MetaValue::String(value) => write!(f, "{}", value),
            MetaValue::Array(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            MetaValue::Object(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl Serialize for MetaValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            MetaValue::Null => serializer.serialize_unit(),
            MetaValue::Bool(value) => serializer.serialize_bool(*value),
            MetaValue::Number(value) => serializer.serialize_f64(*value),
            MetaValue::String(value) => serializer.serialize_str(value),
            MetaValue::Array(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(value)?;
                }
                seq.end()
            }
            MetaValue::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Number(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Number(value as f64)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::String(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::String(value)
    }
}

impl From<Vec<MetaValue>> for MetaValue {
    fn from(values: Vec<MetaValue>) -> Self {
        MetaValue::Array(values)
    }
}
