//! Runtime value types for field comparison.
//!
//! [`Value`] is what an accessor reads out of a record, borrowed from it.
//! [`Operand`] is the owned value a condition compares against. Both share
//! the [`Number`] and [`Timestamp`] representations so a field value and an
//! operand can be ordered against each other with [`compare_values`].

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// Declared type of a registered field.
///
/// `String`, `Number` and `Timestamp` carry a total order and accept the
/// ordering operators; `Enum` and `Bool` only support equality and
/// membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Timestamp,
    Enum,
    Bool,
}

impl ValueType {
    /// Returns `true` if values of this type can be ordered.
    pub fn is_orderable(self) -> bool {
        matches!(
            self,
            ValueType::String | ValueType::Number | ValueType::Timestamp
        )
    }

    /// Returns `true` for the string type.
    pub fn is_text(self) -> bool {
        matches!(self, ValueType::String)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Timestamp => "timestamp",
            ValueType::Enum => "enum",
            ValueType::Bool => "bool",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime value of a field, borrowed from the source record.
///
/// # Example
///
/// ```
/// use sift::{Value, Number};
///
/// struct Book {
///     title: String,
///     pages: u32,
/// }
///
/// fn pages(book: &Book) -> Value<'_> {
///     Value::Number(Number::U64(book.pages as u64))
/// }
///
/// fn title(book: &Book) -> Value<'_> {
///     Value::String(&book.title)
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    /// String value (borrowed).
    String(&'a str),
    /// Numeric value.
    Number(Number),
    /// Timestamp value (milliseconds since Unix epoch).
    Timestamp(Timestamp),
    /// Enum discriminant value.
    Enum(u32),
    /// Boolean value.
    Bool(bool),
    /// Field absent or null.
    None,
}

impl<'a> Value<'a> {
    /// Returns `true` if this is a `None` value.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// The type of this value, or `None` for a null value.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::String(_) => Some(ValueType::String),
            Value::Number(_) => Some(ValueType::Number),
            Value::Timestamp(_) => Some(ValueType::Timestamp),
            Value::Enum(_) => Some(ValueType::Enum),
            Value::Bool(_) => Some(ValueType::Bool),
            Value::None => None,
        }
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Copies this value into an owned [`Operand`]; `None` stays `None`.
    pub fn to_operand(&self) -> Option<Operand> {
        match self {
            Value::String(s) => Some(Operand::String(s.to_string())),
            Value::Number(n) => Some(Operand::Number(*n)),
            Value::Timestamp(t) => Some(Operand::Timestamp(*t)),
            Value::Enum(d) => Some(Operand::Enum(*d)),
            Value::Bool(b) => Some(Operand::Bool(*b)),
            Value::None => None,
        }
    }
}

/// Compares two values of the same type.
///
/// Returns `None` if the types don't match, either side is null, or the
/// comparison is not possible (NaN).
pub fn compare_values(a: &Value<'_>, b: &Value<'_>) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.compare(*b),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Enum(a), Value::Enum(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Numeric value supporting all common numeric types.
///
/// Comparisons between different numeric variants convert to `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Compares two numbers, handling mixed types.
    ///
    /// Integers compare exactly across `I64` and `U64`; only a comparison
    /// involving `F64` goes through floating point.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::I64(a), Number::U64(b)) => Some(compare_signed(a, b)),
            (Number::U64(a), Number::I64(b)) => Some(compare_signed(b, a).reverse()),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }

    /// Parses a number, preferring `i64`, then `u64`, then finite `f64`.
    pub fn parse(raw: &str) -> Option<Number> {
        let raw = raw.trim();
        if let Ok(n) = raw.parse::<i64>() {
            return Some(Number::I64(n));
        }
        if let Ok(n) = raw.parse::<u64>() {
            return Some(Number::U64(n));
        }
        raw.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Number::F64)
    }
}

fn compare_signed(a: i64, b: u64) -> Ordering {
    match u64::try_from(a) {
        Ok(a) => a.cmp(&b),
        Err(_) => Ordering::Less,
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I64(n) => write!(f, "{n}"),
            Number::U64(n) => write!(f, "{n}"),
            Number::F64(n) => write!(f, "{n}"),
        }
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::I64(n as i64)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::I64(n)
    }
}

impl From<u32> for Number {
    fn from(n: u32) -> Self {
        Number::U64(n as u64)
    }
}

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        Number::U64(n)
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Self {
        Number::F64(n)
    }
}

impl From<usize> for Number {
    fn from(n: usize) -> Self {
        Number::U64(n as u64)
    }
}

/// Timestamp value represented as milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a new timestamp from milliseconds since Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Creates a new timestamp from seconds since Unix epoch.
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs * 1000)
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Parses integer milliseconds, an RFC 3339 date-time, or a plain
    /// `YYYY-MM-DD` date taken as UTC midnight.
    pub fn parse(raw: &str) -> Option<Timestamp> {
        let raw = raw.trim();
        if let Ok(millis) = raw.parse::<i64>() {
            return Some(Timestamp(millis));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Timestamp(dt.timestamp_millis()));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| Timestamp(dt.and_utc().timestamp_millis()))
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp(millis)
    }
}

/// Owned comparison value stored in a condition.
///
/// Unlike [`Value`], which borrows from the source record, an operand owns
/// its data so conditions can outlive the records they are evaluated
/// against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    String(String),
    Number(Number),
    Timestamp(Timestamp),
    Enum(u32),
    Bool(bool),
}

impl Operand {
    pub fn value_type(&self) -> ValueType {
        match self {
            Operand::String(_) => ValueType::String,
            Operand::Number(_) => ValueType::Number,
            Operand::Timestamp(_) => ValueType::Timestamp,
            Operand::Enum(_) => ValueType::Enum,
            Operand::Bool(_) => ValueType::Bool,
        }
    }

    /// Borrows this operand as a [`Value`] for comparison.
    pub fn as_value(&self) -> Value<'_> {
        match self {
            Operand::String(s) => Value::String(s),
            Operand::Number(n) => Value::Number(*n),
            Operand::Timestamp(t) => Value::Timestamp(*t),
            Operand::Enum(d) => Value::Enum(*d),
            Operand::Bool(b) => Value::Bool(*b),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Operand::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::String(s) => f.write_str(s),
            Operand::Number(n) => n.fmt(f),
            Operand::Timestamp(t) => write!(f, "{}", t.0),
            Operand::Enum(d) => write!(f, "#{d}"),
            Operand::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::String(s)
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::String(s.to_string())
    }
}

impl From<Number> for Operand {
    fn from(n: Number) -> Self {
        Operand::Number(n)
    }
}

impl From<Timestamp> for Operand {
    fn from(t: Timestamp) -> Self {
        Operand::Timestamp(t)
    }
}

impl From<bool> for Operand {
    fn from(b: bool) -> Self {
        Operand::Bool(b)
    }
}

impl From<i32> for Operand {
    fn from(n: i32) -> Self {
        Operand::Number(Number::from(n))
    }
}

impl From<i64> for Operand {
    fn from(n: i64) -> Self {
        Operand::Number(Number::from(n))
    }
}

impl From<u32> for Operand {
    fn from(n: u32) -> Self {
        Operand::Number(Number::from(n))
    }
}

impl From<u64> for Operand {
    fn from(n: u64) -> Self {
        Operand::Number(Number::from(n))
    }
}

impl From<f64> for Operand {
    fn from(n: f64) -> Self {
        Operand::Number(Number::from(n))
    }
}
