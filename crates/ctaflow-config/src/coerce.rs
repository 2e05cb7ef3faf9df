//! Lenient field coercions for wire records.
//!
//! Each `deserialize_with` helper accepts the loose shapes the flow API
//! produces and yields a strict Rust type. Every helper is total: a value of
//! an unexpected shape becomes the field default instead of an error, so a
//! single odd field never fails the whole record. Pair them with
//! `#[serde(default)]` so missing fields take the same path.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a JSON value as a boolean.
///
/// `true`, non-zero numbers and the strings `true`/`1`/`yes`/`y`/`on` are
/// truthy; everything else (including `null`) is false.
pub fn truthy(value: &Value) -> bool {
  match value {
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
    Value::String(s) => matches!(
      s.trim().to_ascii_lowercase().as_str(),
      "true" | "1" | "yes" | "y" | "on"
    ),
    _ => false,
  }
}

/// Interpret a JSON value as a positive (>= 1) integer.
///
/// Fractions are truncated. Zero, negatives, non-numeric strings and values
/// out of `u32` range yield `None`.
pub fn as_positive_int(value: &Value) -> Option<u32> {
  let n = as_finite_f64(value)?.trunc();
  if n >= 1.0 && n <= f64::from(u32::MAX) {
    Some(n as u32)
  } else {
    None
  }
}

/// Interpret a JSON value as a finite float. Numeric strings are accepted.
pub fn as_finite_f64(value: &Value) -> Option<f64> {
  let n = match value {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => s.trim().parse::<f64>().ok()?,
    _ => return None,
  };
  n.is_finite().then_some(n)
}

/// Interpret a JSON value as text. Numbers and booleans are stringified.
pub fn as_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

pub fn bool_ish<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(value.as_ref().is_some_and(truthy))
}

pub fn positive_int<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(value.as_ref().and_then(as_positive_int))
}

pub fn finite_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(value.as_ref().and_then(as_finite_f64))
}

/// Text field where `null`/missing/non-scalar becomes the empty string.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(value.as_ref().and_then(as_text).unwrap_or_default())
}

/// Optional text field where blank strings collapse to `None`.
pub fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(
    value
      .as_ref()
      .and_then(as_text)
      .filter(|s| !s.trim().is_empty()),
  )
}

/// List field where `null` becomes an empty list.
pub fn list_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Nested record that becomes `None` when it does not have the expected shape.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Timestamp field accepting RFC 3339 strings or epoch milliseconds.
/// Unparseable values become `None`.
pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
      .ok()
      .map(|dt| dt.with_timezone(&Utc)),
    Some(Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
    _ => None,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_truthy_shapes() {
    assert!(truthy(&json!(true)));
    assert!(truthy(&json!(1)));
    assert!(truthy(&json!("TRUE")));
    assert!(truthy(&json!(" yes ")));
    assert!(!truthy(&json!(false)));
    assert!(!truthy(&json!(0)));
    assert!(!truthy(&json!("false")));
    assert!(!truthy(&json!("")));
    assert!(!truthy(&json!(null)));
    assert!(!truthy(&json!([1])));
  }

  #[test]
  fn test_positive_int_shapes() {
    assert_eq!(as_positive_int(&json!(3)), Some(3));
    assert_eq!(as_positive_int(&json!("2")), Some(2));
    assert_eq!(as_positive_int(&json!(2.9)), Some(2));
    assert_eq!(as_positive_int(&json!(0)), None);
    assert_eq!(as_positive_int(&json!(-4)), None);
    assert_eq!(as_positive_int(&json!("abc")), None);
    assert_eq!(as_positive_int(&json!(null)), None);
  }

  #[test]
  fn test_finite_f64_rejects_non_numbers() {
    assert_eq!(as_finite_f64(&json!("12.5")), Some(12.5));
    assert_eq!(as_finite_f64(&json!(true)), None);
    assert_eq!(as_finite_f64(&json!({"x": 1})), None);
  }
}
