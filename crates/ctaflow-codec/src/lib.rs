//! ctaflow Codec
//!
//! Converts between the in-memory [`Flow`](ctaflow_graph::Flow) and the
//! [`FlowRecord`](ctaflow_config::FlowRecord) persisted by the flow API.
//!
//! Encoding always produces an unpublished record: publishing is a separate
//! API call, never a side effect of saving. Decoding recomputes derived
//! fields (trigger button mirror, profile-name clamp), seeds positions for
//! steps the server stored without coordinates, and binds each transition
//! to the button its handle names.

mod codec;
mod error;
mod usage;

pub use codec::PayloadCodec;
pub use error::CodecError;
pub use usage::{UsageShape, decode_usage};
