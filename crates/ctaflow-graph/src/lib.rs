//! ctaflow Graph
//!
//! This crate provides the in-memory representation of a CTA flow: steps
//! (nodes) that each send one message template, and transitions (edges)
//! that fire when the customer taps one of a step's buttons.
//!
//! Key invariants maintained by [`Flow`]:
//! - A button leads to at most one next step: there is never more than one
//!   transition per `(source, handle)` pair.
//! - Removing a step removes every transition that touches it.
//! - A step only injects the recipient's profile name when its body has a
//!   `{{n}}` placeholder, and the chosen slot is always in range.
//!
//! Transitions remember the [`ButtonId`] they leave from, so renaming a
//! button keeps its transition attached. The human-visible handle label is
//! still derived from the button text.

mod error;
mod flow;
mod ids;
mod placeholder;
mod step;
mod transition;
pub mod validator;
mod warning;

pub use error::{ConnectionRejected, GraphError};
pub use flow::Flow;
pub use ids::{ButtonId, StepId, TransitionId};
pub use placeholder::{clamp_profile_name, placeholder_count};
pub use step::{Button, ButtonSpec, MAX_BUTTONS, Step, StepContent};
pub use transition::{Transition, normalize_handle};
pub use warning::{FlowWarning, IncomingWarning};

pub use ctaflow_layout::{Position, Size};
