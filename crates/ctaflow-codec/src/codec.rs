use std::collections::HashSet;

use ctaflow_config::{
  ButtonWire, FlowRecord, SeedPositions, StepWire, TransitionWire, WirePosition,
};
use ctaflow_graph::{
  Button, ButtonId, Flow, MAX_BUTTONS, Position, Step, StepId, Transition, TransitionId,
  clamp_profile_name, placeholder_count, validator,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CodecError;

/// Encodes flows for the API and decodes API records back into flows.
#[derive(Debug, Clone, Default)]
pub struct PayloadCodec {
  seed: SeedPositions,
}

impl PayloadCodec {
  pub fn new(seed: SeedPositions) -> Self {
    Self { seed }
  }

  /// Build the create/update request body for a flow.
  ///
  /// The record is always unpublished, booleans are strict, the profile-name
  /// slot is clamped to the body's placeholders, and every list is present.
  pub fn encode(&self, flow: &Flow) -> FlowRecord {
    FlowRecord {
      flow_name: flow.name.clone(),
      is_published: false,
      nodes: flow.steps.iter().map(encode_step).collect(),
      edges: flow.transitions.iter().map(encode_transition).collect(),
    }
  }

  pub fn encode_value(&self, flow: &Flow) -> Result<Value, CodecError> {
    Ok(serde_json::to_value(self.encode(flow))?)
  }

  /// Rebuild a flow from a record loaded from the API.
  ///
  /// Steps without a position are seeded on a grid by their index. Edges
  /// that reference unknown steps, or that repeat a `(source, handle)` pair
  /// already seen, are dropped.
  pub fn decode(&self, flow_id: Option<String>, record: FlowRecord) -> Result<Flow, CodecError> {
    let mut seen = HashSet::new();
    let mut steps = Vec::with_capacity(record.nodes.len());
    for (index, wire) in record.nodes.into_iter().enumerate() {
      let id = wire.id.trim().to_string();
      if id.is_empty() {
        return Err(CodecError::malformed(format!("step at index {index} has no id")));
      }
      if !seen.insert(id.clone()) {
        return Err(CodecError::DuplicateStepId(id));
      }
      steps.push(self.decode_step(index, StepId::from(id), wire)?);
    }

    let mut transitions: Vec<Transition> = Vec::with_capacity(record.edges.len());
    for wire in record.edges {
      let Some(transition) = decode_transition(&steps, wire) else {
        continue;
      };
      if let Err(reason) = validator::check(&transition, &transitions) {
        warn!(transition = %transition.id, %reason, "dropping edge from payload");
        continue;
      }
      transitions.push(transition);
    }

    let flow = Flow {
      id: flow_id,
      name: record.flow_name,
      is_published: record.is_published,
      steps,
      transitions,
    };
    debug!(
      steps = flow.steps.len(),
      transitions = flow.transitions.len(),
      unreachable = flow
        .derive_incoming_warnings()
        .iter()
        .filter(|w| w.has_no_incoming)
        .count(),
      "decoded flow"
    );
    Ok(flow)
  }

  /// Decode a raw JSON load response.
  pub fn decode_value(&self, flow_id: Option<String>, value: Value) -> Result<Flow, CodecError> {
    let record: FlowRecord = serde_json::from_value(value)?;
    self.decode(flow_id, record)
  }

  pub fn decode_str(&self, flow_id: Option<String>, json: &str) -> Result<Flow, CodecError> {
    let record: FlowRecord = serde_json::from_str(json)?;
    self.decode(flow_id, record)
  }

  fn decode_step(&self, index: usize, id: StepId, wire: StepWire) -> Result<Step, CodecError> {
    if wire.buttons.len() > MAX_BUTTONS {
      return Err(CodecError::TooManyButtons {
        step_id: id.to_string(),
        count: wire.buttons.len(),
      });
    }

    let (x, y) = wire
      .position
      .and_then(|p| p.coordinates())
      .unwrap_or_else(|| self.seed.position_for(index));
    let position = Position::new(x, y);

    let buttons = wire
      .buttons
      .into_iter()
      .enumerate()
      .map(|(i, b)| Button {
        id: ButtonId::generate(),
        text: b.text,
        button_type: b.button_type,
        sub_type: b.sub_type,
        value: b.value,
        target_node_id: b.target_node_id.map(StepId::from),
        index: b.index.unwrap_or(i as u32 + 1),
      })
      .collect::<Vec<_>>();

    let mut step = Step {
      id,
      position,
      size: None,
      template_name: wire.template_name,
      template_type: wire.template_type,
      message_body: wire.message_body,
      trigger_button_text: wire.trigger_button_text,
      trigger_button_type: wire.trigger_button_type,
      required_tag: wire.required_tag,
      required_source: wire.required_source,
      use_profile_name: wire.use_profile_name,
      profile_name_slot: wire.profile_name_slot.unwrap_or(1),
      buttons,
    };
    if !step.buttons.is_empty() {
      step.refresh_trigger_button();
    }
    step.normalize_profile_name();
    Ok(step)
  }
}

fn encode_step(step: &Step) -> StepWire {
  let (use_profile_name, slot) = clamp_profile_name(
    step.use_profile_name,
    step.profile_name_slot,
    placeholder_count(&step.message_body),
  );
  StepWire {
    id: step.id.to_string(),
    position: Some(WirePosition::new(step.position.x, step.position.y)),
    template_name: step.template_name.clone(),
    template_type: step.template_type,
    message_body: step.message_body.clone(),
    trigger_button_text: step.trigger_button_text.clone(),
    trigger_button_type: step.trigger_button_type.clone(),
    required_tag: step.required_tag.clone(),
    required_source: step.required_source.clone(),
    use_profile_name,
    profile_name_slot: Some(slot),
    buttons: step
      .buttons
      .iter()
      .enumerate()
      .map(|(i, b)| ButtonWire {
        text: b.text.clone(),
        button_type: b.button_type.clone(),
        sub_type: b.sub_type.clone(),
        value: b.value.clone(),
        target_node_id: b.target_node_id.as_ref().map(ToString::to_string),
        index: Some(if b.index >= 1 { b.index } else { i as u32 + 1 }),
      })
      .collect(),
  }
}

fn encode_transition(transition: &Transition) -> TransitionWire {
  TransitionWire {
    id: Some(transition.id.to_string()),
    source: transition.source.to_string(),
    target: transition.target.to_string(),
    source_handle: Some(transition.source_handle.clone()),
  }
}

/// Resolve one wire edge against the decoded steps. Edges without a handle
/// borrow the text of the source button that already targets the edge's
/// target.
fn decode_transition(steps: &[Step], wire: TransitionWire) -> Option<Transition> {
  let source = steps.iter().find(|s| s.id.as_str() == wire.source.trim());
  let Some(source) = source.filter(|_| steps.iter().any(|s| s.id.as_str() == wire.target.trim()))
  else {
    warn!(source = %wire.source, target = %wire.target, "dropping edge to unknown step");
    return None;
  };
  let target = StepId::from(wire.target.trim());

  let handle = match wire.source_handle {
    Some(handle) => handle,
    None => source
      .buttons
      .iter()
      .find(|b| b.target_node_id.as_ref() == Some(&target))?
      .text
      .clone(),
  };

  let mut transition = Transition::new(source.id.clone(), handle, target);
  if let Some(id) = wire.id {
    transition.id = TransitionId::from(id);
  }
  transition.button_id = source
    .buttons
    .iter()
    .find(|b| b.matches_handle(&transition.source_handle))
    .map(|b| b.id.clone());
  Some(transition)
}
