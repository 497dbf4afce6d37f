//! Typed argument values.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use url::Url;

/// A value produced by the argument parser.
///
/// `Null` stands for "absent or could not be cast" and is what a failed
/// cast yields. Raw tokens enter the parser as [`ArgValue::Str`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ArgValue {
    #[default]
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Url(Url),
    Date(DateTime<Utc>),
    /// A 24-bit RGB color.
    Color(u32),
    /// A platform entity returned by the resolver.
    Entity(Value),
}

impl ArgValue {
    /// Returns `true` for [`ArgValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the textual form of the value, as seen by casters.
    ///
    /// `Null` has no textual form. Entities render only when they are JSON
    /// strings.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Null => None,
            Self::Str(s) => Some(Cow::Borrowed(s)),
            Self::Int(n) => Some(Cow::Owned(n.to_string())),
            Self::Float(n) => Some(Cow::Owned(n.to_string())),
            Self::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Self::Url(url) => Some(Cow::Borrowed(url.as_str())),
            Self::Date(date) => Some(Cow::Owned(date.to_rfc3339())),
            Self::Color(c) => Some(Cow::Owned(format!("#{c:06x}"))),
            Self::Entity(Value::String(s)) => Some(Cow::Borrowed(s)),
            Self::Entity(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns integers and colors as `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Color(c) => Some(i64::from(*c)),
            _ => None,
        }
    }

    /// Returns floats, and integers widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_url(&self) -> Option<&Url> {
        match self {
            Self::Url(url) => Some(url),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<u32> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Value> {
        match self {
            Self::Entity(value) => Some(value),
            _ => None,
        }
    }

    /// Converts the value into JSON.
    ///
    /// `NaN` floats become `null`, dates are rendered as RFC 3339 strings.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Str(s) => Value::String(s.clone()),
            Self::Int(n) => json!(n),
            Self::Float(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Self::Bool(b) => Value::Bool(*b),
            Self::Url(url) => Value::String(url.to_string()),
            Self::Date(date) => Value::String(date.to_rfc3339()),
            Self::Color(c) => json!(c),
            Self::Entity(value) => value.clone(),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Entity(value) => write!(f, "{value}"),
            other => f.write_str(&other.as_text().unwrap_or_default()),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for ArgValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for ArgValue {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for ArgValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Url> for ArgValue {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

impl From<DateTime<Utc>> for ArgValue {
    fn from(date: DateTime<Utc>) -> Self {
        Self::Date(date)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// ============================================================================
// Args
// ============================================================================

/// The parsed argument map, keyed by argument id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(HashMap<String, ArgValue>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&ArgValue> {
        self.0.get(id)
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&mut self, id: impl Into<String>, value: ArgValue) -> Option<ArgValue> {
        self.0.insert(id.into(), value)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Renders the map as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl FromIterator<(String, ArgValue)> for Args {
    fn from_iter<I: IntoIterator<Item = (String, ArgValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_forms() {
        assert_eq!(ArgValue::from("abc").as_text().as_deref(), Some("abc"));
        assert_eq!(ArgValue::Int(2).as_text().as_deref(), Some("2"));
        assert_eq!(ArgValue::Color(0xff).as_text().as_deref(), Some("#0000ff"));
        assert!(ArgValue::Null.as_text().is_none());
        assert!(ArgValue::Entity(json!({ "id": "1" })).as_text().is_none());
    }

    #[test]
    fn test_to_json() {
        assert_eq!(ArgValue::Float(f64::NAN).to_json(), Value::Null);
        assert_eq!(ArgValue::Color(16_777_215).to_json(), json!(16_777_215));

        let args: Args = [
            ("name".to_string(), ArgValue::from("ember")),
            ("count".to_string(), ArgValue::Int(3)),
        ]
        .into_iter()
        .collect();
        assert_eq!(args.to_json(), json!({ "name": "ember", "count": 3 }));
    }

    #[test]
    fn test_option_conversion() {
        assert!(ArgValue::from(None::<i64>).is_null());
        assert_eq!(ArgValue::from(Some(true)), ArgValue::Bool(true));
    }
}
