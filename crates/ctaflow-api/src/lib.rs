//! ctaflow API
//!
//! This crate provides the client-side contract of the flow service and two
//! implementations of it: [`HttpFlowApi`] speaks to the real service, and
//! [`MemoryFlowApi`] keeps flows in process for tests and offline use.
//!
//! The [`FlowApi`] trait covers:
//! - Loading, creating and updating flow records
//! - Publishing and forking flows
//! - Querying which campaigns reference a flow
//!
//! A `409 Conflict` from the service always means the flow is referenced by a
//! running campaign and surfaces as [`ApiError::Conflict`].

mod error;
mod http;
mod memory;
mod types;

pub use error::ApiError;
pub use http::{HttpFlowApi, classify_response};
pub use memory::MemoryFlowApi;
pub use types::UpdateOutcome;

use async_trait::async_trait;
use ctaflow_config::{FlowRecord, TemplateDef, UsageReport};

/// Operations the editor needs from the flow service.
#[async_trait]
pub trait FlowApi: Send + Sync {
  /// Load a flow by id.
  async fn load_flow(&self, flow_id: &str) -> Result<FlowRecord, ApiError>;

  /// Create a new flow, returning its server id.
  async fn create_flow(&self, record: &FlowRecord) -> Result<String, ApiError>;

  /// Replace the content of an existing flow.
  async fn update_flow(&self, flow_id: &str, record: &FlowRecord)
  -> Result<UpdateOutcome, ApiError>;

  /// Make the last saved version of a flow live.
  async fn publish_flow(&self, flow_id: &str) -> Result<(), ApiError>;

  /// Copy a flow into a new unpublished draft, returning the new id.
  async fn fork_flow(&self, flow_id: &str) -> Result<String, ApiError>;

  /// Campaigns currently referencing a flow.
  async fn get_usage(&self, flow_id: &str) -> Result<UsageReport, ApiError>;

  /// Delete a flow.
  async fn delete_flow(&self, flow_id: &str) -> Result<(), ApiError>;
}

/// Source of message templates a step can be built from.
#[async_trait]
pub trait TemplateCatalog: Send + Sync {
  async fn list_templates(&self) -> Result<Vec<TemplateDef>, ApiError>;
}
