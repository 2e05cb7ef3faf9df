//! Tolerant decoding of campaign usage lists.
//!
//! The usage endpoint and the 409 conflict body have both been observed in
//! several shapes. Rather than probing ad hoc, the known shapes are tried in
//! a fixed order; anything else is an error, and an error locks the flow.

use ctaflow_config::{CampaignRef, UsageReport, coerce};
use serde_json::Value;
use tracing::warn;

use crate::error::CodecError;

/// Envelope keys that may wrap the interesting payload.
const ENVELOPE_KEYS: [&str; 4] = ["data", "Data", "result", "Result"];
const CAMPAIGN_KEYS: [&str; 4] = ["campaigns", "Campaigns", "usage", "Usage"];

/// Which known shape a usage document matched.
#[derive(Debug, Clone, PartialEq)]
pub enum UsageShape {
  /// `[{...}, ...]`
  BareList(Vec<CampaignRef>),
  /// `{"campaigns": [...]}`
  Keyed(Vec<CampaignRef>),
  /// `{"data": <bare list or keyed>}`
  Enveloped(Vec<CampaignRef>),
}

impl UsageShape {
  pub fn into_campaigns(self) -> Vec<CampaignRef> {
    match self {
      UsageShape::BareList(c) | UsageShape::Keyed(c) | UsageShape::Enveloped(c) => c,
    }
  }

  fn classify(value: &Value) -> Result<Self, CodecError> {
    if let Some(list) = value.as_array() {
      return Ok(UsageShape::BareList(campaigns_from(list)));
    }
    let object = value.as_object().ok_or(CodecError::UnrecognizedUsage)?;

    let mut keyed = CAMPAIGN_KEYS
      .iter()
      .filter_map(|key| object.get(*key).map(|v| (*key, v)))
      .peekable();
    if keyed.peek().is_some() {
      let mut lists = Vec::new();
      for (key, value) in keyed {
        match value {
          Value::Array(list) => lists.push(list),
          Value::Null => {}
          _ => return Err(CodecError::malformed(format!("usage field `{key}` is not a list"))),
        }
      }
      return Ok(UsageShape::Keyed(
        lists.into_iter().flat_map(|list| campaigns_from(list)).collect(),
      ));
    }

    let inner = ENVELOPE_KEYS
      .iter()
      .find_map(|key| object.get(*key))
      .ok_or(CodecError::UnrecognizedUsage)?;
    match Self::classify(inner)? {
      UsageShape::Enveloped(_) => Err(CodecError::UnrecognizedUsage),
      shape => Ok(UsageShape::Enveloped(shape.into_campaigns())),
    }
  }
}

/// Every entry counts as a campaign. Entries that do not decode as one are
/// kept as a placeholder named after whatever text they carry, so a flow is
/// never reported free because its usage list was unreadable.
fn campaigns_from(list: &[Value]) -> Vec<CampaignRef> {
  list
    .iter()
    .enumerate()
    .map(|(i, entry)| {
      let parsed = entry
        .is_object()
        .then(|| serde_json::from_value::<CampaignRef>(entry.clone()).ok())
        .flatten();
      parsed.unwrap_or_else(|| {
        let label = coerce::as_text(entry).unwrap_or_else(|| format!("campaign #{}", i + 1));
        warn!(entry = %entry, "unreadable usage entry, counting it as a campaign");
        CampaignRef::new(label.clone(), label, "unknown")
      })
    })
    .collect()
}

/// Decode a usage document into a report, trying each known shape in turn.
pub fn decode_usage(value: &Value) -> Result<UsageReport, CodecError> {
  UsageShape::classify(value).map(|shape| UsageReport {
    campaigns: shape.into_campaigns(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn campaign() -> Value {
    json!({ "id": "c1", "name": "Diwali Sale", "status": "Running" })
  }

  #[test]
  fn test_bare_list() {
    let report = decode_usage(&json!([campaign()])).unwrap();
    assert_eq!(report.campaigns[0].name, "Diwali Sale");
  }

  #[test]
  fn test_keyed_object() {
    let report = decode_usage(&json!({ "Campaigns": [campaign()] })).unwrap();
    assert_eq!(report.campaigns.len(), 1);
  }

  #[test]
  fn test_enveloped_object() {
    let shape = UsageShape::classify(&json!({ "data": { "campaigns": [campaign()] } })).unwrap();
    assert!(matches!(shape, UsageShape::Enveloped(ref c) if c.len() == 1));
  }

  #[test]
  fn test_empty_keyed_list_is_not_attached() {
    let report = decode_usage(&json!({ "campaigns": [] })).unwrap();
    assert!(!report.is_attached());
  }

  #[test]
  fn test_unknown_shape_fails_closed() {
    assert!(matches!(
      decode_usage(&json!({ "message": "nope" })),
      Err(CodecError::UnrecognizedUsage)
    ));
    assert!(decode_usage(&json!("campaigns")).is_err());
    assert!(decode_usage(&json!({ "data": { "data": [] } })).is_err());
  }

  #[test]
  fn test_unreadable_entries_count_as_campaigns() {
    let report = decode_usage(&json!([campaign(), 5, "x", null])).unwrap();
    assert_eq!(report.campaigns.len(), 4);
    assert_eq!(report.campaigns[1].id, "5");
    assert_eq!(report.campaigns[2].name, "x");
    assert_eq!(report.campaigns[3].name, "campaign #4");
  }

  #[test]
  fn test_non_list_campaign_field_is_malformed() {
    assert!(matches!(
      decode_usage(&json!({ "campaigns": { "id": "c1" } })),
      Err(CodecError::Malformed { .. })
    ));
    assert!(matches!(
      decode_usage(&json!({ "campaigns": "c1", "usage": [] })),
      Err(CodecError::Malformed { .. })
    ));
  }

  #[test]
  fn test_null_campaign_field_falls_through_to_other_keys() {
    let report = decode_usage(&json!({ "campaigns": null, "Usage": [campaign()] })).unwrap();
    assert_eq!(report.campaigns.len(), 1);
    assert!(!decode_usage(&json!({ "campaigns": null })).unwrap().is_attached());
  }
}
