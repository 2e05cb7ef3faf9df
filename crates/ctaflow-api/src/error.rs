use ctaflow_config::CampaignRef;
use thiserror::Error;

/// Errors returned by flow API calls.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The request never produced a response.
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("invalid api url: {0}")]
  InvalidUrl(String),

  /// The service answered with a non-success status.
  #[error("service returned {status}: {message}")]
  Status { status: u16, message: String },

  #[error("not found: {0}")]
  NotFound(String),

  /// The flow is referenced by a campaign. `campaigns` is `None` when the
  /// service did not say which ones.
  #[error("flow is in use by a running campaign")]
  Conflict { campaigns: Option<Vec<CampaignRef>> },

  /// The response body did not have the expected shape.
  #[error("failed to decode response: {message}")]
  Decode { message: String },
}

impl ApiError {
  pub fn status(status: u16, message: impl Into<String>) -> Self {
    Self::Status {
      status,
      message: message.into(),
    }
  }

  pub fn decode(message: impl Into<String>) -> Self {
    Self::Decode {
      message: message.into(),
    }
  }

  pub fn is_conflict(&self) -> bool {
    matches!(self, Self::Conflict { .. })
  }
}

impl From<serde_json::Error> for ApiError {
  fn from(err: serde_json::Error) -> Self {
    Self::decode(err.to_string())
  }
}
