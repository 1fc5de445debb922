//! Tolerant decoding of semi-structured JSON columns.
//!
//! Array- and object-shaped columns have been written over the years both as
//! native JSON and as JSON documents encoded into a string. Every read goes
//! through [`JsonColumn`]; malformed data decodes to an empty value and never
//! fails a read.

use serde_json::{Map, Value};

/// A raw column value as it arrives from storage.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonColumn {
  /// Already-structured JSON (array, object, number, ...).
  Native(Value),
  /// A string that is expected to contain a JSON document.
  Encoded(String),
  Null,
}

impl JsonColumn {
  /// Classify an arbitrary JSON value. JSON strings are treated as encoded
  /// documents.
  pub fn from_value(value: Value) -> Self {
    match value {
      Value::Null => Self::Null,
      Value::String(s) => Self::Encoded(s),
      other => Self::Native(other),
    }
  }

  /// Classify the contents of a TEXT column.
  ///
  /// The text is parsed once; a document that is itself a JSON string (a
  /// double-encoded array) stays [`JsonColumn::Encoded`] and is unwrapped by
  /// the normalizers.
  pub fn from_text(text: Option<&str>) -> Self {
    match text {
      None => Self::Null,
      Some(t) if t.trim().is_empty() => Self::Null,
      Some(t) => match serde_json::from_str::<Value>(t) {
        Ok(value) => Self::from_value(value),
        Err(_) => Self::Encoded(t.to_owned()),
      },
    }
  }

  /// Resolve one level of encoding. Unparseable strings become `Null`.
  pub fn into_value(self) -> Value {
    match self {
      Self::Native(value) => value,
      Self::Encoded(s) => serde_json::from_str(&s).unwrap_or(Value::Null),
      Self::Null => Value::Null,
    }
  }

  /// Normalize to an ordered list of strings. Non-string elements are
  /// dropped.
  pub fn into_string_array(self) -> Vec<String> {
    match self.into_value() {
      Value::Array(items) => items
        .into_iter()
        .filter_map(|item| match item {
          Value::String(s) => Some(s),
          _ => None,
        })
        .collect(),
      _ => Vec::new(),
    }
  }

  /// Normalize to an array of arbitrary JSON values.
  pub fn into_array(self) -> Vec<Value> {
    match self.into_value() {
      Value::Array(items) => items,
      _ => Vec::new(),
    }
  }

  /// Normalize to a JSON object.
  pub fn into_object(self) -> Map<String, Value> {
    match self.into_value() {
      Value::Object(map) => map,
      _ => Map::new(),
    }
  }
}

/// Normalize an array-like value (native or JSON-encoded) to its strings.
pub fn normalize_string_array(raw: &Value) -> Vec<String> {
  JsonColumn::from_value(raw.clone()).into_string_array()
}

/// Normalize an object-like value (native or JSON-encoded).
pub fn normalize_object(raw: &Value) -> Map<String, Value> {
  JsonColumn::from_value(raw.clone()).into_object()
}
