//! ctaflow Lifecycle
//!
//! A flow moves through four states:
//!
//! ```text
//! New --save--> DraftUnpublished --publish--> PublishedUnlocked
//!                                                  |
//!                              campaign attached   v
//! DraftUnpublished (new id) <--fork-- PublishedLocked
//! ```
//!
//! [`LifecycleState::next`] is the pure transition table.
//! [`LifecycleController`] applies it around calls to a
//! [`FlowApi`](ctaflow_api::FlowApi): it runs the usage check when a
//! published flow is opened, and turns conflict responses into the locked
//! state.

mod controller;
mod error;
mod state;

pub use controller::{LifecycleController, LockInfo, SaveOutcome};
pub use error::LifecycleError;
pub use state::{LifecycleAction, LifecycleState};
