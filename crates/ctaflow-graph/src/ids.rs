use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(String);

    impl $name {
      /// Generate a fresh random id.
      pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
      }

      pub fn as_str(&self) -> &str {
        &self.0
      }
    }

    impl From<String> for $name {
      fn from(value: String) -> Self {
        Self(value)
      }
    }

    impl From<&str> for $name {
      fn from(value: &str) -> Self {
        Self(value.to_string())
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
      }
    }

    impl PartialEq<str> for $name {
      fn eq(&self, other: &str) -> bool {
        self.0 == other
      }
    }
  };
}

string_id!(
  /// Identifier of a step, stable across saves.
  StepId
);

string_id!(
  /// Identifier of a button. Local to the editing session: the wire format
  /// addresses buttons by their text.
  ButtonId
);

string_id!(
  /// Identifier of a transition.
  TransitionId
);
