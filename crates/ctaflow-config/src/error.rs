use thiserror::Error;

/// Errors raised while loading the editor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse config: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("invalid config value for '{field}': {message}")]
  InvalidValue { field: String, message: String },

  #[error("unknown layout direction: {0} (expected LR or TB)")]
  UnknownDirection(String),
}

impl ConfigError {
  pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::InvalidValue {
      field: field.into(),
      message: message.into(),
    }
  }
}
