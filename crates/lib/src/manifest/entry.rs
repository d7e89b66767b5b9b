//! Per-entry parse isolation.
//!
//! Each item of a manifest section is parsed on its own so that one
//! malformed entry only fails that entry instead of the whole manifest.

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// Keys consulted, in order, to label an entry that failed to parse.
const LABEL_KEYS: &[&str] = &["name", "path", "target", "url", "user"];

/// A manifest entry that was present but could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidEntry {
  /// Best-effort identifier taken from the raw entry, `"<unnamed>"` otherwise.
  pub label: String,
  /// The deserialization error.
  pub message: String,
}

/// One item of a manifest section, either parsed or rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry<T> {
  Valid(T),
  Invalid(InvalidEntry),
}

impl<T> Entry<T> {
  pub fn as_valid(&self) -> Option<&T> {
    match self {
      Entry::Valid(spec) => Some(spec),
      Entry::Invalid(_) => None,
    }
  }

  pub fn is_valid(&self) -> bool {
    matches!(self, Entry::Valid(_))
  }
}

impl<T> From<T> for Entry<T> {
  fn from(spec: T) -> Self {
    Entry::Valid(spec)
  }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Entry<T> {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match serde_yaml::from_value::<T>(value.clone()) {
      Ok(spec) => Ok(Entry::Valid(spec)),
      Err(e) => Ok(Entry::Invalid(InvalidEntry {
        label: entry_label(&value),
        message: e.to_string(),
      })),
    }
  }
}

fn entry_label(value: &Value) -> String {
  LABEL_KEYS
    .iter()
    .find_map(|key| value.get(*key).and_then(Value::as_str))
    .map(str::to_string)
    .unwrap_or_else(|| "<unnamed>".to_string())
}

/// Deserialize an optional sequence, treating an explicit `null` like a
/// missing key.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a scalar (string, number or boolean) as its string form, so
/// unquoted values like `permissions: 750` or `group: 1000` are accepted.
pub(crate) fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
  scalar_to_string(Value::deserialize(deserializer)?).map_err(de::Error::custom)
}

/// Like [`scalar_string`], with `null` read as absent.
pub(crate) fn optional_scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
  match Option::<Value>::deserialize(deserializer)? {
    None | Some(Value::Null) => Ok(None),
    Some(value) => scalar_to_string(value).map(Some).map_err(de::Error::custom),
  }
}

fn scalar_to_string(value: Value) -> Result<String, String> {
  match value {
    Value::String(s) => Ok(s),
    Value::Number(n) => Ok(n.to_string()),
    Value::Bool(b) => Ok(b.to_string()),
    Value::Null => Err("invalid type: null, expected a string".to_string()),
    Value::Sequence(_) => Err("invalid type: sequence, expected a string".to_string()),
    Value::Mapping(_) => Err("invalid type: map, expected a string".to_string()),
    Value::Tagged(_) => Err("invalid type: tagged value, expected a string".to_string()),
  }
}
