use ctaflow_codec::CodecError;
use ctaflow_graph::{ConnectionRejected, GraphError};
use ctaflow_lifecycle::LifecycleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
  /// Another save, publish or fork is still in flight.
  #[error("another request is in progress")]
  Busy,

  #[error("flow is read-only")]
  ReadOnly,

  #[error("session has been closed")]
  TornDown,

  #[error("connection rejected: {0}")]
  Rejected(#[from] ConnectionRejected),

  #[error(transparent)]
  Lifecycle(#[from] LifecycleError),

  #[error(transparent)]
  Codec(#[from] CodecError),

  #[error(transparent)]
  Graph(#[from] GraphError),
}

impl SessionError {
  /// Notification text for the user.
  pub fn user_message(&self) -> String {
    match self {
      Self::Busy => "Please wait for the current request to finish.".to_string(),
      Self::ReadOnly => "This flow is used by a running campaign. Fork it to make changes.".to_string(),
      Self::TornDown => "The editor has been closed.".to_string(),
      Self::Rejected(ConnectionRejected::DuplicateHandle { handle, .. }) => {
        format!("The \"{handle}\" button is already connected.")
      }
      Self::Rejected(_) => "Connect a button to the next step.".to_string(),
      Self::Lifecycle(err) => lifecycle_message(err),
      Self::Codec(err) => format!("This flow could not be opened: {err}."),
      Self::Graph(err) => format!("That change could not be applied: {err}."),
    }
  }
}

fn lifecycle_message(err: &LifecycleError) -> String {
  let detail = err
    .api_error()
    .map(|e| format!(" ({e})"))
    .unwrap_or_default();
  match err {
    LifecycleError::Locked { campaigns, .. } => {
      let names: Vec<&str> = campaigns
        .iter()
        .flatten()
        .map(|c| c.name.as_str())
        .collect();
      if names.is_empty() {
        "This flow is used by a running campaign. Fork it to keep editing.".to_string()
      } else {
        format!(
          "This flow is used by {}. Fork it to keep editing.",
          names.join(", ")
        )
      }
    }
    LifecycleError::NotPersisted => "Save the flow first.".to_string(),
    LifecycleError::InvalidTransition { state, action } => {
      format!("A {state} flow cannot be {}.", past_tense(*action))
    }
    LifecycleError::LoadFailed { .. } => format!("The flow could not be loaded{detail}."),
    LifecycleError::SaveFailed { .. } => {
      format!("Saving failed{detail}. Your changes are kept, so you can try again.")
    }
    LifecycleError::PublishFailed { .. } => {
      format!("Publishing failed{detail}. Your changes are saved; try publishing again.")
    }
    LifecycleError::ForkFailed { .. } => format!("The flow could not be copied{detail}."),
    LifecycleError::DeleteFailed { .. } => format!("The flow could not be deleted{detail}."),
  }
}

fn past_tense(action: ctaflow_lifecycle::LifecycleAction) -> &'static str {
  use ctaflow_lifecycle::LifecycleAction::*;
  match action {
    Save => "saved",
    Publish => "published",
    Fork => "forked",
    Delete => "deleted",
  }
}
