use serde::{Deserialize, Serialize};

use crate::coerce;
use crate::template::TemplateType;

/// Persisted canvas coordinate of a step. A missing or non-numeric axis is
/// `None`, and the step is then seeded like one without a position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct WirePosition {
  #[serde(alias = "x", default, deserialize_with = "coerce::finite_f64")]
  pub x: Option<f64>,
  #[serde(alias = "y", default, deserialize_with = "coerce::finite_f64")]
  pub y: Option<f64>,
}

impl WirePosition {
  pub fn new(x: f64, y: f64) -> Self {
    Self {
      x: Some(x),
      y: Some(y),
    }
  }

  /// Both coordinates, when both are usable.
  pub fn coordinates(&self) -> Option<(f64, f64)> {
    Some((self.x?, self.y?))
  }
}

/// A button on a step, in transport shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ButtonWire {
  #[serde(alias = "text", default, deserialize_with = "coerce::text")]
  pub text: String,

  #[serde(
    rename = "Type",
    alias = "type",
    default,
    deserialize_with = "coerce::text"
  )]
  pub button_type: String,

  #[serde(
    alias = "subType",
    default,
    deserialize_with = "coerce::non_blank",
    skip_serializing_if = "Option::is_none"
  )]
  pub sub_type: Option<String>,

  #[serde(
    alias = "value",
    default,
    deserialize_with = "coerce::non_blank",
    skip_serializing_if = "Option::is_none"
  )]
  pub value: Option<String>,

  #[serde(
    alias = "targetNodeId",
    default,
    deserialize_with = "coerce::non_blank"
  )]
  pub target_node_id: Option<String>,

  #[serde(alias = "index", default, deserialize_with = "coerce::positive_int")]
  pub index: Option<u32>,
}

/// A step (node) in transport shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct StepWire {
  #[serde(alias = "id", default, deserialize_with = "coerce::text")]
  pub id: String,

  #[serde(
    alias = "position",
    default,
    deserialize_with = "coerce::lenient",
    skip_serializing_if = "Option::is_none"
  )]
  pub position: Option<WirePosition>,

  #[serde(alias = "templateName", default, deserialize_with = "coerce::text")]
  pub template_name: String,

  #[serde(alias = "templateType", default)]
  pub template_type: TemplateType,

  #[serde(alias = "messageBody", default, deserialize_with = "coerce::text")]
  pub message_body: String,

  #[serde(
    alias = "triggerButtonText",
    default,
    deserialize_with = "coerce::non_blank"
  )]
  pub trigger_button_text: Option<String>,

  #[serde(
    alias = "triggerButtonType",
    default,
    deserialize_with = "coerce::non_blank"
  )]
  pub trigger_button_type: Option<String>,

  #[serde(alias = "requiredTag", default, deserialize_with = "coerce::non_blank")]
  pub required_tag: Option<String>,

  #[serde(
    alias = "requiredSource",
    default,
    deserialize_with = "coerce::non_blank"
  )]
  pub required_source: Option<String>,

  #[serde(alias = "useProfileName", default, deserialize_with = "coerce::bool_ish")]
  pub use_profile_name: bool,

  #[serde(
    alias = "profileNameSlot",
    default,
    deserialize_with = "coerce::positive_int"
  )]
  pub profile_name_slot: Option<u32>,

  #[serde(alias = "buttons", default, deserialize_with = "coerce::list_or_empty")]
  pub buttons: Vec<ButtonWire>,
}

/// A button-triggered transition (edge) in transport shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct TransitionWire {
  #[serde(
    alias = "id",
    default,
    deserialize_with = "coerce::non_blank",
    skip_serializing_if = "Option::is_none"
  )]
  pub id: Option<String>,

  #[serde(alias = "source", default, deserialize_with = "coerce::text")]
  pub source: String,

  #[serde(alias = "target", default, deserialize_with = "coerce::text")]
  pub target: String,

  #[serde(alias = "sourceHandle", default, deserialize_with = "coerce::non_blank")]
  pub source_handle: Option<String>,
}

/// A whole flow as loaded from, or sent to, the flow API.
///
/// The same record serves the load response and the create/update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct FlowRecord {
  #[serde(alias = "flowName", default, deserialize_with = "coerce::text")]
  pub flow_name: String,

  #[serde(alias = "isPublished", default, deserialize_with = "coerce::bool_ish")]
  pub is_published: bool,

  #[serde(alias = "nodes", default, deserialize_with = "coerce::list_or_empty")]
  pub nodes: Vec<StepWire>,

  #[serde(alias = "edges", default, deserialize_with = "coerce::list_or_empty")]
  pub edges: Vec<TransitionWire>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_record_accepts_camel_case_and_loose_values() {
    let record: FlowRecord = serde_json::from_value(json!({
      "flowName": "Onboarding",
      "isPublished": "true",
      "nodes": [{
        "id": "s1",
        "messageBody": "Hello {{1}}",
        "useProfileName": 1,
        "profileNameSlot": "1",
        "buttons": [{ "text": "Yes", "type": "QUICK_REPLY", "index": "1" }]
      }],
      "edges": null
    }))
    .unwrap();

    assert_eq!(record.flow_name, "Onboarding");
    assert!(record.is_published);
    assert!(record.edges.is_empty());
    let step = &record.nodes[0];
    assert!(step.use_profile_name);
    assert_eq!(step.profile_name_slot, Some(1));
    assert_eq!(step.position, None);
    assert_eq!(step.buttons[0].index, Some(1));
    assert_eq!(step.buttons[0].target_node_id, None);
  }

  #[test]
  fn test_odd_positions_do_not_fail_the_record() {
    let record: FlowRecord = serde_json::from_value(json!({
      "nodes": [
        { "id": "s1", "position": { "x": null, "y": 40 } },
        { "id": "s2", "position": "top-left" },
        { "id": "s3", "Position": { "X": "12.5", "Y": 30 } }
      ]
    }))
    .unwrap();

    assert_eq!(record.nodes[0].position.and_then(|p| p.coordinates()), None);
    assert_eq!(record.nodes[1].position, None);
    assert_eq!(
      record.nodes[2].position.and_then(|p| p.coordinates()),
      Some((12.5, 30.0))
    );
  }

  #[test]
  fn test_record_serializes_pascal_case() {
    let record = FlowRecord {
      flow_name: "F".to_string(),
      is_published: false,
      nodes: vec![],
      edges: vec![TransitionWire {
        id: None,
        source: "a".to_string(),
        target: "b".to_string(),
        source_handle: Some("Yes".to_string()),
      }],
    };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["FlowName"], "F");
    assert_eq!(value["IsPublished"], false);
    assert_eq!(value["Nodes"], json!([]));
    assert_eq!(value["Edges"][0]["SourceHandle"], "Yes");
  }
}
