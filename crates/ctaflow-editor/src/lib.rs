//! ctaflow Editor
//!
//! [`FlowEditorSession`] is what a UI binds to. It owns the working copy of
//! the flow, the dirty flag and the busy flag, and drives save, publish and
//! fork through the lifecycle controller.
//!
//! Outcomes of network actions are reported twice: as the returned
//! `Result`, and as a [`SessionEvent`] to the configured
//! [`SessionNotifier`] so notifications can be shown from one place.

mod error;
mod events;
mod session;
mod view_state;

pub use error::SessionError;
pub use events::{ChannelNotifier, NoopNotifier, SessionEvent, SessionNotifier};
pub use session::{FlowEditorSession, LeaveDecision, SessionBuilder, UNSAVED_CHANGES_PROMPT};
pub use view_state::{
  FsViewStateStore, MemoryViewStateStore, ViewState, ViewStateError, ViewStateStore,
};
