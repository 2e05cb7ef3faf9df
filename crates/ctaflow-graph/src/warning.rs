use serde::Serialize;

use crate::ids::{StepId, TransitionId};

/// Per-step reachability hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomingWarning {
  pub step_id: StepId,
  pub has_no_incoming: bool,
}

/// Authoring hints. None of these block saving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowWarning {
  /// No transition leads to this step.
  Unreachable { step_id: StepId },
  /// The transition's button no longer exists on its source step.
  OrphanedTransition {
    transition_id: TransitionId,
    source: StepId,
    handle: String,
  },
  /// Profile-name injection is on but the body has no placeholder.
  ProfileNameWithoutPlaceholder { step_id: StepId },
}

impl std::fmt::Display for FlowWarning {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      FlowWarning::Unreachable { step_id } => {
        write!(f, "step {} has no incoming connection", step_id)
      }
      FlowWarning::OrphanedTransition { source, handle, .. } => write!(
        f,
        "connection from step {} uses button '{}' which no longer exists",
        source, handle
      ),
      FlowWarning::ProfileNameWithoutPlaceholder { step_id } => write!(
        f,
        "step {} injects the profile name but its body has no placeholder",
        step_id
      ),
    }
  }
}
