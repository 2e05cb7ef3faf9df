use thiserror::Error;

/// Fatal decode failures. A flow that hits one of these is shown as an
/// error state rather than partially rendered.
#[derive(Debug, Error)]
pub enum CodecError {
  #[error("malformed flow payload: {message}")]
  Malformed { message: String },

  #[error("duplicate step id in payload: {0}")]
  DuplicateStepId(String),

  #[error("step {step_id} has {count} buttons (at most 3 allowed)")]
  TooManyButtons { step_id: String, count: usize },

  #[error("usage response has an unrecognized shape")]
  UnrecognizedUsage,

  #[error("invalid json: {0}")]
  Json(#[from] serde_json::Error),
}

impl CodecError {
  pub fn malformed(message: impl Into<String>) -> Self {
    Self::Malformed {
      message: message.into(),
    }
  }
}
