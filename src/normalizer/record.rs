//! Raw input values and the normalized feature record

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Raw form input: field name to value as captured from the user
pub type RawInput = BTreeMap<String, RawValue>;

/// A value as supplied by a form widget or JSON body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    /// Name of the value's type for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "bool",
            RawValue::Int(_) => "integer",
            RawValue::Float(_) => "float",
            RawValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => write!(f, "null"),
            RawValue::Bool(v) => write!(f, "{}", v),
            RawValue::Int(v) => write!(f, "{}", v),
            RawValue::Float(v) => write!(f, "{}", v),
            RawValue::Text(v) => write!(f, "'{}'", v),
        }
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Text(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

/// A validated, correctly typed feature value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Category(String),
    Integer(i64),
    Float(f64),
    #[serde(serialize_with = "serialize_flag")]
    Flag(bool),
}

fn serialize_flag<S: serde::Serializer>(v: &bool, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u8(u8::from(*v))
}

impl FeatureValue {
    /// Numeric view of the value; flags encode as 0.0 / 1.0
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Integer(v) => Some(*v as f64),
            FeatureValue::Float(v) => Some(*v),
            FeatureValue::Flag(v) => Some(if *v { 1.0 } else { 0.0 }),
            FeatureValue::Category(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::Category(v) => Some(v),
            _ => None,
        }
    }
}

/// One vehicle, validated against a feature schema.
///
/// Values are stored in the schema's training order. The record remembers
/// which schema version validated it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarFeatureRecord {
    schema_version: String,
    fields: Vec<(String, FeatureValue)>,
}

impl CarFeatureRecord {
    pub(crate) fn new(schema_version: String, fields: Vec<(String, FeatureValue)>) -> Self {
        Self { schema_version, fields }
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Field names in training order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
