use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Result of an update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
  /// The flow was live and the saved changes are not live until it is
  /// published again.
  #[serde(default, alias = "NeedsRepublish")]
  pub needs_republish: bool,
}

impl UpdateOutcome {
  pub(crate) fn from_body(body: &Value) -> Self {
    let flag = body
      .get("needsRepublish")
      .or_else(|| body.get("NeedsRepublish"))
      .or_else(|| body.pointer("/data/needsRepublish"));
    Self {
      needs_republish: flag.is_some_and(ctaflow_config::coerce::truthy),
    }
  }
}

const ID_KEYS: [&str; 4] = ["id", "Id", "flowId", "FlowId"];

/// Pull a flow id out of a create or fork response, with or without a
/// `data` envelope.
pub(crate) fn extract_id(body: &Value) -> Result<String, ApiError> {
  let scopes = [Some(body), body.get("data"), body.get("Data")];
  scopes
    .into_iter()
    .flatten()
    .flat_map(|scope| ID_KEYS.iter().filter_map(move |key| scope.get(*key)))
    .find_map(ctaflow_config::coerce::as_text)
    .filter(|id| !id.trim().is_empty())
    .ok_or_else(|| ApiError::decode("response has no flow id"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_extract_id_shapes() {
    assert_eq!(extract_id(&json!({ "id": "f1" })).unwrap(), "f1");
    assert_eq!(extract_id(&json!({ "FlowId": 42 })).unwrap(), "42");
    assert_eq!(extract_id(&json!({ "data": { "id": "f2" } })).unwrap(), "f2");
    assert!(extract_id(&json!({ "ok": true })).is_err());
    assert!(extract_id(&json!({ "id": "" })).is_err());
  }

  #[test]
  fn test_update_outcome_shapes() {
    assert!(UpdateOutcome::from_body(&json!({ "needsRepublish": true })).needs_republish);
    assert!(UpdateOutcome::from_body(&json!({ "NeedsRepublish": "true" })).needs_republish);
    assert!(!UpdateOutcome::from_body(&json!(null)).needs_republish);
  }
}
