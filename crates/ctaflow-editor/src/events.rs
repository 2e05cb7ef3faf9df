//! Session events and notifiers.
//!
//! The session reports the outcome of every network action as an event so
//! the UI can show a notification, or the fork-or-close prompt for a locked
//! flow.

use ctaflow_config::CampaignRef;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted by a [`FlowEditorSession`](crate::FlowEditorSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
  /// The flow was created or updated.
  Saved { flow_id: String, created: bool },

  /// Saved changes to a live flow are waiting to be published.
  NeedsRepublish { flow_id: String },

  Published { flow_id: String },

  /// A locked flow was copied into a new draft, which the session now edits.
  Forked { original_id: String, fork_id: String },

  /// The flow is used by live campaigns. The UI should switch to read-only
  /// and offer to fork or close.
  Locked {
    flow_id: String,
    campaigns: Option<Vec<CampaignRef>>,
  },

  Deleted { flow_id: String },

  /// A save, publish, fork or delete failed. `message` is ready to show.
  ActionFailed { action: String, message: String },
}

/// Receives session events.
pub trait SessionNotifier: Send + Sync {
  fn notify(&self, event: SessionEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl SessionNotifier for NoopNotifier {
  fn notify(&self, _event: SessionEvent) {}
}

/// Forwards events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelNotifier {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self { sender }, receiver)
  }
}

impl SessionNotifier for ChannelNotifier {
  fn notify(&self, event: SessionEvent) {
    // The receiver may be gone once the UI closes.
    let _ = self.sender.send(event);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_channel_notifier_forwards() {
    let (notifier, mut receiver) = ChannelNotifier::new();
    notifier.notify(SessionEvent::Published {
      flow_id: "f1".to_string(),
    });
    assert_eq!(
      receiver.try_recv().unwrap(),
      SessionEvent::Published {
        flow_id: "f1".to_string()
      }
    );
  }

  #[test]
  fn test_channel_notifier_survives_closed_receiver() {
    let (notifier, receiver) = ChannelNotifier::new();
    drop(receiver);
    notifier.notify(SessionEvent::Deleted {
      flow_id: "f1".to_string(),
    });
  }
}
