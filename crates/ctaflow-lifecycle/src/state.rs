use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a flow stands with respect to persistence, publishing and campaign
/// usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
  /// Never persisted.
  New,
  /// Persisted, not published.
  DraftUnpublished,
  /// Published and not referenced by any campaign.
  PublishedUnlocked,
  /// Published and referenced by at least one campaign. Read-only until
  /// forked.
  PublishedLocked,
}

/// Mutating requests the controller can be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleAction {
  Save,
  Publish,
  Fork,
  Delete,
}

impl LifecycleState {
  pub fn initial(persisted: bool, is_published: bool) -> Self {
    match (persisted, is_published) {
      (false, _) => Self::New,
      (true, false) => Self::DraftUnpublished,
      (true, true) => Self::PublishedUnlocked,
    }
  }

  pub fn is_persisted(self) -> bool {
    self != Self::New
  }

  pub fn is_published(self) -> bool {
    matches!(self, Self::PublishedUnlocked | Self::PublishedLocked)
  }

  pub fn is_read_only(self) -> bool {
    self == Self::PublishedLocked
  }

  /// State after `action` succeeds, or `None` when the action is not
  /// allowed from this state.
  ///
  /// For [`LifecycleAction::Fork`] the result is the state of the new copy;
  /// the forked flow itself keeps its state. A deleted flow goes back to
  /// [`LifecycleState::New`].
  pub fn next(self, action: LifecycleAction) -> Option<Self> {
    use LifecycleAction::*;
    use LifecycleState::*;

    match (self, action) {
      (New | DraftUnpublished, Save) => Some(DraftUnpublished),
      (New | DraftUnpublished | PublishedUnlocked, Publish) => Some(PublishedUnlocked),
      (PublishedUnlocked, Save) => Some(PublishedUnlocked),
      (PublishedLocked, Fork) => Some(DraftUnpublished),
      (DraftUnpublished | PublishedUnlocked, Delete) => Some(New),
      _ => None,
    }
  }
}

impl fmt::Display for LifecycleState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::New => "new",
      Self::DraftUnpublished => "draft",
      Self::PublishedUnlocked => "published",
      Self::PublishedLocked => "locked",
    };
    f.write_str(name)
  }
}

impl fmt::Display for LifecycleAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Save => "save",
      Self::Publish => "publish",
      Self::Fork => "fork",
      Self::Delete => "delete",
    };
    f.write_str(name)
  }
}
