//! Attribute values and their declared types.

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc,
};
use serde_json::Value;

use crate::resource::ResourceError;

/// The declared type of a resource attribute.
///
/// Only `Date` changes behavior: strings written to a `Date` attribute are
/// parsed into timestamps, and timestamps are written back as ISO-8601.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// Free-form string (the default).
    #[default]
    String,
    /// Numeric value.
    Number,
    /// Timestamp.
    Date,
}

/// The value of a resource attribute.
///
/// # Example
///
/// ```rust
/// use jsonapi_store::AttributeValue;
///
/// let title = AttributeValue::from("Sprocket");
/// assert_eq!(title.as_str(), Some("Sprocket"));
///
/// let count = AttributeValue::from(3);
/// assert_eq!(count.as_i64(), Some(3));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    /// Any JSON value, including `null`.
    Json(Value),
    /// A parsed timestamp.
    Date(DateTime<FixedOffset>),
}

impl AttributeValue {
    /// The `null` attribute value.
    pub const NULL: Self = Self::Json(Value::Null);

    /// Returns `true` for a JSON `null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Json(Value::Null))
    }

    /// Returns the string value, if this is a JSON string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Json(value) => value.as_str(),
            Self::Date(_) => None,
        }
    }

    /// Returns the value as `f64`, if this is a JSON number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Json(value) => value.as_f64(),
            Self::Date(_) => None,
        }
    }

    /// Returns the value as `i64`, if this is an integral JSON number.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Json(value) => value.as_i64(),
            Self::Date(_) => None,
        }
    }

    /// Returns the value as `bool`, if this is a JSON boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Json(value) => value.as_bool(),
            Self::Date(_) => None,
        }
    }

    /// Returns the timestamp, if this is a date.
    #[must_use]
    pub const fn as_date(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Self::Date(date) => Some(date),
            Self::Json(_) => None,
        }
    }

    /// Converts to the JSON written in documents (dates as ISO-8601).
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Date(date) => Value::String(format_date(date)),
        }
    }

    /// Applies the write-time conversion for `attribute_type`.
    pub(crate) fn coerce(self, attribute_type: AttributeType) -> Result<Self, ResourceError> {
        match (attribute_type, self) {
            (AttributeType::Date, Self::Json(Value::String(s))) => parse_date(&s)
                .map(Self::Date)
                .ok_or_else(|| {
                    ResourceError::invalid_data(
                        format!("Unable to parse {s:?} as a date."),
                        &Value::String(s.clone()),
                    )
                }),
            (_, value) => Ok(value),
        }
    }
}

impl Default for AttributeValue {
    fn default() -> Self {
        Self::NULL
    }
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Json(Value::String(value.to_string()))
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Json(Value::String(value))
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Json(Value::Bool(value))
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Json(Value::from(value))
    }
}

impl From<DateTime<FixedOffset>> for AttributeValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value.with_timezone(&utc_offset()))
    }
}

impl<T: Into<Self>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NULL, Into::into)
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses a date string.
///
/// Accepts RFC 3339 / ISO-8601 with offset, `YYYY-MM-DDTHH:MM:SS+HHMM`, and
/// offset-less `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`
/// (taken as UTC).
#[must_use]
pub fn parse_date(input: &str) -> Option<DateTime<FixedOffset>> {
    let input = input.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Some(date);
    }
    if let Ok(date) = DateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(date);
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    Some(utc_offset().from_utc_datetime(&naive))
}

/// Formats a timestamp as ISO-8601 with whole seconds and a numeric offset.
#[must_use]
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, false)
}
