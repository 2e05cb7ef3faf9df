use serde::{Deserialize, Serialize};

use crate::ids::{ButtonId, StepId, TransitionId};

/// Canonical form of a handle label for comparisons: trimmed, lowercase.
pub fn normalize_handle(label: &str) -> String {
  label.trim().to_lowercase()
}

/// A transition from one step's button to the next step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
  pub id: TransitionId,
  pub source: StepId,
  pub target: StepId,
  /// Label of the originating button, as shown on the canvas and sent on
  /// the wire.
  pub source_handle: String,
  /// The button this transition leaves from, when it could be resolved.
  pub button_id: Option<ButtonId>,
}

impl Transition {
  pub fn new(source: StepId, source_handle: impl Into<String>, target: StepId) -> Self {
    Self {
      id: TransitionId::generate(),
      source,
      target,
      source_handle: source_handle.into(),
      button_id: None,
    }
  }

  pub fn with_button(mut self, button_id: ButtonId) -> Self {
    self.button_id = Some(button_id);
    self
  }

  pub fn touches(&self, step_id: &StepId) -> bool {
    &self.source == step_id || &self.target == step_id
  }

  /// Whether two transitions leave from the same `(source, handle)` pair.
  ///
  /// Labels are compared in normalized form. Two transitions bound to the
  /// same button also share a handle, whatever their labels say.
  pub fn shares_handle_with(&self, other: &Transition) -> bool {
    if self.source != other.source {
      return false;
    }
    let same_button = matches!((&self.button_id, &other.button_id), (Some(a), Some(b)) if a == b);
    same_button || normalize_handle(&self.source_handle) == normalize_handle(&other.source_handle)
  }
}
