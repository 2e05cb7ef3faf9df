//! ctaflow Config
//!
//! This crate contains the serializable records exchanged with the flow API
//! and the editor configuration file. These types represent flows as the
//! server stores them, before they are decoded into the in-memory graph.
//!
//! Wire records are deliberately lenient on the way in: the server has been
//! seen sending `"true"`/`1` for booleans, strings for numbers and `null` for
//! lists. The helpers in [`coerce`] normalize those shapes during
//! deserialization so downstream code only sees strict types.

pub mod coerce;
mod error;
mod flow;
mod settings;
mod template;
mod usage;

pub use error::ConfigError;
pub use flow::{ButtonWire, FlowRecord, StepWire, TransitionWire, WirePosition};
pub use settings::{ApiConfig, Direction, EditorConfig, LayoutConfig, SeedPositions};
pub use template::{TemplateButtonDef, TemplateDef, TemplateType};
pub use usage::{CampaignRef, UsageReport};
