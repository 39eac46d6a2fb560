//! Type-tagged values flowing through samples and the in-memory backend.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime};

use crate::typesys::StorageKind;

/// Datetime formats tried in order when coercing strings.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Date-only formats, promoted to midnight timestamps.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y"];

/// A single column element.
///
/// `Eq` and `Hash` are total so that uniqueness counting works over any
/// sample: floats compare by bit pattern.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Datetime(NaiveDateTime),
    /// Duration in whole seconds.
    Timedelta(i64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Whether this value could be stored under the given representation.
    ///
    /// This is the check behind type-assignment rejection: a sample with a
    /// non-coercible value cannot be assigned a logical type requiring
    /// `storage`. The conversion itself is a backend responsibility.
    pub fn coercible_to(&self, storage: StorageKind) -> bool {
        match (self, storage) {
            (Value::Null, _) => true,
            (_, StorageKind::Object) => true,
            (_, StorageKind::Utf8) | (_, StorageKind::Categorical) => true,
            (Value::Bool(_), StorageKind::Bool) => true,
            (Value::Str(s), StorageKind::Bool) => {
                matches!(s.trim(), "true" | "false" | "True" | "False")
            }
            (Value::Bool(_), StorageKind::Int64) => true,
            (Value::Int(_), StorageKind::Int64) => true,
            (Value::Float(f), StorageKind::Int64) => f.fract() == 0.0,
            (Value::Str(s), StorageKind::Int64) => s.trim().parse::<i64>().is_ok(),
            (Value::Bool(_), StorageKind::Float64) => true,
            (Value::Int(_), StorageKind::Float64) => true,
            (Value::Float(_), StorageKind::Float64) => true,
            (Value::Str(s), StorageKind::Float64) => s.trim().parse::<f64>().is_ok(),
            (Value::Datetime(_), StorageKind::Datetime) => true,
            (Value::Str(s), StorageKind::Datetime) => parse_datetime(s).is_some(),
            (Value::Timedelta(_), StorageKind::Timedelta) => true,
            (Value::Int(_), StorageKind::Timedelta) => true,
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Datetime(a), Value::Datetime(b)) => a == b,
            (Value::Timedelta(a), Value::Timedelta(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Datetime(dt) => dt.hash(state),
            Value::Timedelta(d) => d.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{}", s),
            Value::Datetime(dt) => write!(f, "{}", dt),
            Value::Timedelta(d) => write!(f, "{}s", d),
        }
    }
}

/// Parse a string into a timestamp, trying the supported formats in order.
///
/// Date-only strings are promoted to midnight. Returns `None` when no
/// format matches.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}
