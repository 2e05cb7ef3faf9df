use ctaflow_config::{TemplateDef, TemplateType};
use ctaflow_layout::{Position, Size};
use serde::{Deserialize, Serialize};

use crate::ids::{ButtonId, StepId};
use crate::placeholder::{clamp_profile_name, placeholder_count};
use crate::transition::normalize_handle;

/// WhatsApp interactive messages carry at most three buttons.
pub const MAX_BUTTONS: usize = 3;

/// Button content without identity, as supplied by the catalog or an edit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ButtonSpec {
  pub text: String,
  pub button_type: String,
  pub sub_type: Option<String>,
  pub value: Option<String>,
}

impl ButtonSpec {
  pub fn quick_reply(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      button_type: "QUICK_REPLY".to_string(),
      sub_type: None,
      value: None,
    }
  }
}

/// A button on a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
  pub id: ButtonId,
  pub text: String,
  pub button_type: String,
  pub sub_type: Option<String>,
  pub value: Option<String>,
  /// Step this button leads to. Mirrors the outgoing transition, but is
  /// left in place when that transition is removed.
  pub target_node_id: Option<StepId>,
  /// 1-based ordinal, stable across re-ordering.
  pub index: u32,
}

impl Button {
  pub fn from_spec(spec: ButtonSpec, index: u32) -> Self {
    Self {
      id: ButtonId::generate(),
      text: spec.text,
      button_type: spec.button_type,
      sub_type: spec.sub_type,
      value: spec.value,
      target_node_id: None,
      index,
    }
  }

  /// Whether this button answers to a connection handle label.
  pub fn matches_handle(&self, handle: &str) -> bool {
    normalize_handle(&self.text) == normalize_handle(handle)
  }
}

/// Content used to create a step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepContent {
  pub template_name: String,
  pub template_type: TemplateType,
  pub message_body: String,
  pub buttons: Vec<ButtonSpec>,
}

impl StepContent {
  /// Copy a catalog template into step content.
  pub fn from_template(template: &TemplateDef) -> Self {
    Self {
      template_name: template.name.clone(),
      template_type: template.template_type,
      message_body: template.body.clone(),
      buttons: template
        .buttons
        .iter()
        .map(|b| ButtonSpec {
          text: b.text.clone(),
          button_type: b.button_type.clone(),
          sub_type: b.sub_type.clone(),
          value: b.value.clone(),
        })
        .collect(),
    }
  }
}

/// A step (node) in a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
  pub id: StepId,
  pub position: Position,
  /// Measured footprint, when the renderer has reported one.
  pub size: Option<Size>,
  pub template_name: String,
  pub template_type: TemplateType,
  pub message_body: String,
  /// Mirrors the first button.
  pub trigger_button_text: Option<String>,
  pub trigger_button_type: Option<String>,
  pub required_tag: Option<String>,
  pub required_source: Option<String>,
  pub use_profile_name: bool,
  /// 1-based placeholder index that receives the profile name.
  pub profile_name_slot: u32,
  pub buttons: Vec<Button>,
}

impl Step {
  /// Build a step from content. Buttons beyond [`MAX_BUTTONS`] are dropped.
  pub fn new(id: StepId, content: StepContent, position: Position) -> Self {
    let buttons = content
      .buttons
      .into_iter()
      .take(MAX_BUTTONS)
      .enumerate()
      .map(|(i, spec)| Button::from_spec(spec, i as u32 + 1))
      .collect();

    let mut step = Self {
      id,
      position,
      size: None,
      template_name: content.template_name,
      template_type: content.template_type,
      message_body: content.message_body,
      trigger_button_text: None,
      trigger_button_type: None,
      required_tag: None,
      required_source: None,
      use_profile_name: false,
      profile_name_slot: 1,
      buttons,
    };
    step.refresh_trigger_button();
    step
  }

  pub fn placeholder_count(&self) -> usize {
    placeholder_count(&self.message_body)
  }

  /// Re-apply the profile-name invariant after the body or slot changed.
  pub fn normalize_profile_name(&mut self) {
    let (enabled, slot) = clamp_profile_name(
      self.use_profile_name,
      self.profile_name_slot,
      self.placeholder_count(),
    );
    self.use_profile_name = enabled;
    self.profile_name_slot = slot;
  }

  /// Re-derive the trigger button mirror fields from the first button.
  pub fn refresh_trigger_button(&mut self) {
    let first = self.buttons.first();
    self.trigger_button_text = first.map(|b| b.text.clone());
    self.trigger_button_type = first.map(|b| b.button_type.clone());
  }

  pub fn button(&self, id: &ButtonId) -> Option<&Button> {
    self.buttons.iter().find(|b| &b.id == id)
  }

  /// Button a new connection with `handle` should bind to: the one whose
  /// text matches, else the first button without a target yet.
  pub(crate) fn connection_slot(&self, handle: &str) -> Option<usize> {
    self
      .buttons
      .iter()
      .position(|b| b.matches_handle(handle))
      .or_else(|| self.buttons.iter().position(|b| b.target_node_id.is_none()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn content(body: &str, buttons: &[&str]) -> StepContent {
    StepContent {
      template_name: "t".to_string(),
      template_type: TemplateType::Text,
      message_body: body.to_string(),
      buttons: buttons.iter().map(|b| ButtonSpec::quick_reply(*b)).collect(),
    }
  }

  #[test]
  fn test_new_step_mirrors_first_button() {
    let step = Step::new(
      StepId::from("s1"),
      content("Hi", &["Yes", "No"]),
      Position::default(),
    );
    assert_eq!(step.trigger_button_text.as_deref(), Some("Yes"));
    assert_eq!(step.trigger_button_type.as_deref(), Some("QUICK_REPLY"));
    assert_eq!(step.buttons[1].index, 2);
  }

  #[test]
  fn test_new_step_caps_buttons() {
    let step = Step::new(
      StepId::from("s1"),
      content("Hi", &["a", "b", "c", "d"]),
      Position::default(),
    );
    assert_eq!(step.buttons.len(), MAX_BUTTONS);
  }

  #[test]
  fn test_connection_slot_prefers_text_match() {
    let mut step = Step::new(
      StepId::from("s1"),
      content("Hi", &["Yes", "No"]),
      Position::default(),
    );
    assert_eq!(step.connection_slot("  no "), Some(1));

    step.buttons[0].target_node_id = Some(StepId::from("s2"));
    assert_eq!(step.connection_slot("Maybe"), Some(1));

    step.buttons[1].target_node_id = Some(StepId::from("s3"));
    assert_eq!(step.connection_slot("Maybe"), None);
  }
}
