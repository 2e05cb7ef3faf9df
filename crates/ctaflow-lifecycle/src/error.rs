use ctaflow_api::ApiError;
use ctaflow_config::CampaignRef;
use thiserror::Error;

use crate::state::{LifecycleAction, LifecycleState};

#[derive(Debug, Error)]
pub enum LifecycleError {
  /// The flow is referenced by live campaigns and cannot be changed in
  /// place. `campaigns` is `None` when they could not be enumerated.
  #[error("flow {flow_id} is used by a running campaign")]
  Locked {
    flow_id: String,
    campaigns: Option<Vec<CampaignRef>>,
  },

  #[error("flow has not been saved yet")]
  NotPersisted,

  #[error("cannot {action} a flow in state {state}")]
  InvalidTransition {
    state: LifecycleState,
    action: LifecycleAction,
  },

  #[error("failed to load flow {flow_id}")]
  LoadFailed {
    flow_id: String,
    #[source]
    source: ApiError,
  },

  #[error("failed to save flow")]
  SaveFailed {
    flow_id: Option<String>,
    #[source]
    source: ApiError,
  },

  #[error("failed to publish flow {flow_id}")]
  PublishFailed {
    flow_id: String,
    #[source]
    source: ApiError,
  },

  #[error("failed to fork flow {flow_id}")]
  ForkFailed {
    flow_id: String,
    #[source]
    source: ApiError,
  },

  #[error("failed to delete flow {flow_id}")]
  DeleteFailed {
    flow_id: String,
    #[source]
    source: ApiError,
  },
}

impl LifecycleError {
  pub fn is_locked(&self) -> bool {
    matches!(self, Self::Locked { .. })
  }

  /// The API error underneath, for action failures.
  pub fn api_error(&self) -> Option<&ApiError> {
    match self {
      Self::LoadFailed { source, .. }
      | Self::SaveFailed { source, .. }
      | Self::PublishFailed { source, .. }
      | Self::ForkFailed { source, .. }
      | Self::DeleteFailed { source, .. } => Some(source),
      _ => None,
    }
  }
}
