use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  #[error("step not found: {0}")]
  StepNotFound(String),

  #[error("button {button_id} not found on step {step_id}")]
  ButtonNotFound { step_id: String, button_id: String },

  #[error("step {step_id} has {count} buttons (at most 3 allowed)")]
  TooManyButtons { step_id: String, count: usize },
}

/// Why a proposed transition was not added.
///
/// Rejections are local and synchronous; the editor simply does not draw
/// the edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionRejected {
  #[error("connection has no source step")]
  MissingSource,

  #[error("connection has no source button")]
  MissingHandle,

  #[error("button '{handle}' on step {step} already leads to another step")]
  DuplicateHandle { step: String, handle: String },

  #[error("connection references unknown step: {0}")]
  UnknownStep(String),
}
