use crate::core::field_type::FieldType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Boolean(bool),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Uint(v) => i64::try_from(*v).ok(),
            Value::Float(v) => Some(*v as i64),
            Value::String(v) => v.parse::<i64>().ok(),
            Value::Boolean(v) => Some(if *v { 1 } else { 0 }),
            Value::Json(v) => v.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Uint(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(v) => v.parse::<f64>().ok(),
            Value::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Json(v) => v.as_f64(),
            _ => None,
        }
    }

    /// Truthiness used for boolean coercion: numbers are true when nonzero,
    /// strings accept the usual spellings and otherwise count as true when
    /// non-empty.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            Value::Uint(v) => Some(*v != 0),
            Value::Float(v) => Some(*v != 0.0),
            Value::String(v) => match v.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" | "" => Some(false),
                _ => Some(true),
            },
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            Value::Int(v) => Some(v.to_string()),
            Value::Uint(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::String(v) => Some(v.clone()),
            Value::Boolean(v) => Some(v.to_string()),
            Value::Json(v) => Some(v.to_string()),
            Value::Date(v) => Some(v.to_string()),
            Value::Timestamp(v) => Some(v.to_rfc3339()),
            _ => None,
        }
    }

    /// Coerces a source value to the target field type.
    ///
    /// `Null` always passes through. A value that cannot be parsed for the
    /// requested type is kept as-is rather than dropped; the integrity
    /// checker is the place where such records surface.
    pub fn coerce_to(&self, target: FieldType) -> Value {
        if self.is_null() {
            return Value::Null;
        }

        match target {
            FieldType::Number | FieldType::Long => match self {
                Value::Int(_) | Value::Uint(_) => self.clone(),
                Value::Float(v) if target == FieldType::Number => Value::Float(*v),
                _ => self
                    .as_i64()
                    .map(Value::Int)
                    .or_else(|| self.as_f64().map(Value::Float))
                    .unwrap_or_else(|| self.clone()),
            },
            FieldType::Decimal => self.as_f64().map(Value::Float).unwrap_or_else(|| self.clone()),
            FieldType::Boolean => self.as_bool().map(Value::Boolean).unwrap_or_else(|| self.clone()),
            FieldType::Date => self.coerce_temporal(),
            FieldType::Object => match self {
                Value::String(raw) => serde_json::from_str::<serde_json::Value>(raw)
                    .map(Value::Json)
                    .unwrap_or_else(|_| self.clone()),
                _ => self.clone(),
            },
            FieldType::String | FieldType::Mixed => self.clone(),
        }
    }

    fn coerce_temporal(&self) -> Value {
        match self {
            Value::Date(_) | Value::Timestamp(_) => self.clone(),
            Value::Int(secs) => DateTime::<Utc>::from_timestamp(*secs, 0)
                .map(Value::Timestamp)
                .unwrap_or_else(|| self.clone()),
            Value::Uint(secs) => i64::try_from(*secs)
                .ok()
                .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
                .map(Value::Timestamp)
                .unwrap_or_else(|| self.clone()),
            Value::String(raw) => parse_timestamp(raw).unwrap_or_else(|| self.clone()),
            _ => self.clone(),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<Value> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(Value::Timestamp(ts.with_timezone(&Utc)));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Value::Timestamp(ts.and_utc()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Value::Date(date));
    }
    None
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Null => f.write_str("NULL"),
            other => f.write_str(&other.as_string().unwrap_or_default()),
        }
    }
}
