#![deny(missing_docs)]

//! # Native Values
//!
//! The dynamic value model used on the native side of the marshaller.
//!
//! Types are defined by the schema document rather than at compile time, so
//! call arguments and results are expressed as [`Value`]s. Named object
//! definitions produce [`Model`] instances.

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;

/// A native value, as supplied by callers and returned from decoded responses.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// `boolean`
    Bool(bool),
    /// `integer`
    Integer(i64),
    /// `number`
    Number(f64),
    /// `string`
    String(String),
    /// `string` with format `date`.
    Date(NaiveDate),
    /// `string` with format `date-time`.
    DateTime(DateTime<FixedOffset>),
    /// `file` contents.
    Bytes(Vec<u8>),
    /// `array`
    Array(Vec<Value>),
    /// An object without a Record Type (inline or free-form).
    Object(IndexMap<String, Value>),
    /// An instance of a generated Record Type.
    Model(Model),
}

impl Value {
    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the text if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is a [`Value::Integer`].
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the elements if this is a [`Value::Array`].
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the model if this is a [`Value::Model`].
    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Value::Model(m) => Some(m),
            _ => None,
        }
    }

    /// Looks up a named field on a model or keyed bag.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Model(m) => m.get(name),
            Value::Object(map) => map.get(name),
            _ => None,
        }
    }

    /// Converts wire JSON into a value without any schema guidance.
    pub fn from_json(json: &JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts this value into wire JSON without any schema guidance.
    ///
    /// Dates render as `YYYY-MM-DD`, timestamps as RFC 3339, bytes as lossy
    /// UTF-8 text.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Integer(i) => JsonValue::from(*i),
            Value::Number(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Date(d) => JsonValue::String(render_date(d)),
            Value::DateTime(ts) => JsonValue::String(render_timestamp(ts)),
            Value::Bytes(b) => JsonValue::String(String::from_utf8_lossy(b).into_owned()),
            Value::Array(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
            Value::Model(m) => JsonValue::Object(
                m.fields()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

/// Renders a calendar date as an ISO-8601 date string.
pub(crate) fn render_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Renders a timestamp as an RFC 3339 string.
pub(crate) fn render_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Number(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Value::DateTime(ts)
    }
}

impl From<Model> for Value {
    fn from(m: Model) -> Self {
        Value::Model(m)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

/// An instance of a generated Record Type.
///
/// Only fields that were set are stored. Two models are equal when they
/// belong to the same type and hold equal fields, regardless of the order in
/// which the fields were declared or set.
#[derive(Clone, PartialEq)]
pub struct Model {
    type_name: String,
    fields: BTreeMap<String, Value>,
}

impl Model {
    /// Creates an empty instance. Use `RecordType::instantiate` to build a
    /// validated instance from keyword pairs.
    pub(crate) fn empty(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            fields: BTreeMap::new(),
        }
    }

    pub(crate) fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    /// Name of the Record Type this instance belongs to.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns a field value, or `None` when the field is unset.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns true when the field has been set.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterates over the set fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(&self.type_name);
        for (name, value) in &self.fields {
            s.field(name, value);
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_equality_ignores_insertion_order() {
        let mut a = Model::empty("Tag");
        a.set("id", Value::Integer(99));
        a.set("name", "mini".into());

        let mut b = Model::empty("Tag");
        b.set("name", "mini".into());
        b.set("id", Value::Integer(99));

        assert_eq!(a, b);

        let mut c = Model::empty("Category");
        c.set("name", "mini".into());
        c.set("id", Value::Integer(99));
        assert_ne!(a, c);
    }

    #[test]
    fn test_untyped_json_conversion() {
        let wire = json!({"a": [1, 2.5, "x", null, true]});
        let value = Value::from_json(&wire);
        assert_eq!(
            value.field("a").and_then(Value::as_array).map(<[Value]>::len),
            Some(5)
        );
        assert_eq!(value.to_json(), wire);
    }

    #[test]
    fn test_date_renders_iso() {
        let date = NaiveDate::from_ymd_opt(2014, 1, 2).unwrap();
        assert_eq!(Value::Date(date).to_json(), json!("2014-01-02"));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::String("x".into()));
    }
}
