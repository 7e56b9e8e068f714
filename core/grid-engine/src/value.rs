//! FILENAME: core/grid-engine/src/value.rs
//! PURPOSE: The dynamically typed cell value that flows through every stage.
//! CONTEXT: Rows are addressed by field name and hand back a `Value`. Sorting,
//! filtering, bucketing, aggregation and CSV export all compare, coerce and
//! print values with the rules defined here, so they live in one place.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// VALUE
// ============================================================================

/// A single cell value.
///
/// Deserialization is untagged: JSON `null`, booleans, numbers and strings map
/// onto `Null`, `Bool`, `Number` and `Text`. `Date` is only produced from Rust
/// (strings stay text on the way in) and serializes as an ISO-8601 string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Values a filter treats as "nothing entered": null, `false`, `0`, `NaN`
    /// and the empty string.
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => *n == 0.0 || n.is_nan(),
            Value::Text(s) => s.is_empty(),
            Value::Date(_) => false,
        }
    }

    /// Null or the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric coercion shared by the number filter and the aggregations.
    ///
    /// Returns `None` for null, blank or non-numeric text and `NaN`.
    /// Booleans coerce to 1/0 and dates to epoch milliseconds.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => (!n.is_nan()).then_some(*n),
            Value::Text(s) => parse_number_text(s),
            Value::Date(d) => Some(d.and_utc().timestamp_millis() as f64),
        }
    }

    /// Date coercion used by the date filter, in epoch milliseconds (UTC).
    ///
    /// Numbers are read as epoch milliseconds. Text is accepted as RFC 3339 or
    /// one of the plain `YYYY-MM-DD[ HH:MM[:SS]]` layouts. Falsy values other
    /// than the number zero do not coerce.
    pub fn as_timestamp_millis(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Number(_) | Value::Null | Value::Bool(_) => None,
            Value::Text(s) => parse_date_text(s),
            Value::Date(d) => Some(d.and_utc().timestamp_millis() as f64),
        }
    }

    /// Lower-cased string form, null as empty. Used for text matching.
    pub fn to_lowercase_string(&self) -> String {
        self.to_string().to_lowercase()
    }
}

/// The string form of a value, matching what the host widget prints:
/// integral numbers without a fraction, `true`/`false`, null as empty.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        // Covers -0 as well.
        return "0".to_string();
    }
    let abs = n.abs();
    if !(1e-6..1e21).contains(&abs) {
        // Shortest digits in exponent form; the host signs positive exponents.
        let s = format!("{:e}", n);
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => s,
        };
    }
    if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

fn parse_number_text(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    let n = t.parse::<f64>().ok()?;
    if n.is_nan() {
        return None;
    }
    // `f64::from_str` also accepts "inf"/"infinity" in any case; only the
    // exact spelling "Infinity" counts as numeric text.
    if n.is_infinite() && t.trim_start_matches(['+', '-']) != "Infinity" {
        return None;
    }
    Some(n)
}

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

fn parse_date_text(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.timestamp_millis() as f64);
    }
    for fmt in NAIVE_DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(dt.and_utc().timestamp_millis() as f64);
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            let dt = d.and_hms_opt(0, 0, 0)?;
            return Some(dt.and_utc().timestamp_millis() as f64);
        }
    }
    None
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d.and_time(chrono::NaiveTime::MIN))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

// ============================================================================
// GROUP KEY
// ============================================================================

/// Label used in caller-visible strings (group paths, pivot field ids) for
/// the bucket of rows whose key value is missing.
pub const NULL_KEY_LABEL: &str = "__null__";

/// Bucket identity for grouping and pivoting.
///
/// A missing key is its own variant, so a row whose value is literally the
/// text `"__null__"` lands in a different bucket from a row with no value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKey {
    Null,
    Value(String),
}

impl GroupKey {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => GroupKey::Null,
            other => GroupKey::Value(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, GroupKey::Null)
    }

    /// The string form used in paths and field ids.
    pub fn label(&self) -> &str {
        match self {
            GroupKey::Null => NULL_KEY_LABEL,
            GroupKey::Value(s) => s,
        }
    }
}

/// Keys order by their label; the null bucket sorts where its label would,
/// ahead of a real value with the same text.
impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label()
            .cmp(other.label())
            .then_with(|| other.is_null().cmp(&self.is_null()))
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
