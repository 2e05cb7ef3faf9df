use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use ctaflow_config::{CampaignRef, FlowRecord, TemplateDef, UsageReport};
use tracing::debug;

use crate::error::ApiError;
use crate::types::UpdateOutcome;
use crate::{FlowApi, TemplateCatalog};

#[derive(Debug, Clone)]
struct StoredFlow {
  record: FlowRecord,
  published: bool,
  campaigns: Vec<CampaignRef>,
}

/// A one-shot failure, optionally limited to one operation.
#[derive(Debug)]
struct PendingFailure {
  op: Option<&'static str>,
  error: ApiError,
}

#[derive(Debug, Default)]
struct MemoryState {
  flows: BTreeMap<String, StoredFlow>,
  next_id: u64,
  templates: Vec<TemplateDef>,
  fail_next: Option<PendingFailure>,
  usage_unavailable: bool,
  calls: Vec<String>,
}

impl MemoryState {
  fn allocate_id(&mut self) -> String {
    self.next_id += 1;
    format!("flow-{}", self.next_id)
  }

  /// Record a call and consume an injected failure aimed at it, if any.
  fn enter(&mut self, op: &'static str, flow_id: Option<&str>) -> Result<(), ApiError> {
    let call = match flow_id {
      Some(id) => format!("{op} {id}"),
      None => op.to_string(),
    };
    debug!(%call, "memory flow api");
    self.calls.push(call);
    let aimed = self
      .fail_next
      .as_ref()
      .is_some_and(|f| f.op.is_none_or(|target| target == op));
    match self.fail_next.take_if(|_| aimed) {
      Some(failure) => Err(failure.error),
      None => Ok(()),
    }
  }

  fn flow(&mut self, flow_id: &str) -> Result<&mut StoredFlow, ApiError> {
    self
      .flows
      .get_mut(flow_id)
      .ok_or_else(|| ApiError::NotFound(flow_id.to_string()))
  }
}

/// In-process [`FlowApi`] that behaves like the real service: updates to a
/// flow with attached campaigns are refused with a conflict, and updating a
/// published flow reports that it needs republishing.
#[derive(Debug, Default)]
pub struct MemoryFlowApi {
  state: Mutex<MemoryState>,
}

impl MemoryFlowApi {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_templates(templates: Vec<TemplateDef>) -> Self {
    let api = Self::default();
    api.lock().templates = templates;
    api
  }

  fn lock(&self) -> MutexGuard<'_, MemoryState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Seed a flow directly, returning its id.
  pub fn insert_flow(&self, record: FlowRecord, published: bool) -> String {
    let mut state = self.lock();
    let id = state.allocate_id();
    state.flows.insert(
      id.clone(),
      StoredFlow {
        record,
        published,
        campaigns: Vec::new(),
      },
    );
    id
  }

  /// Mark a flow as referenced by a campaign.
  pub fn attach_campaign(&self, flow_id: &str, campaign: CampaignRef) {
    if let Some(flow) = self.lock().flows.get_mut(flow_id) {
      flow.campaigns.push(campaign);
    }
  }

  pub fn detach_campaigns(&self, flow_id: &str) {
    if let Some(flow) = self.lock().flows.get_mut(flow_id) {
      flow.campaigns.clear();
    }
  }

  /// Make the next call, whatever it is, fail with `status`.
  pub fn fail_next_call(&self, status: u16, message: impl Into<String>) {
    self.lock().fail_next = Some(PendingFailure {
      op: None,
      error: ApiError::status(status, message),
    });
  }

  /// Make the next call of `op` (`"publish"`, `"update"`, ...) fail with
  /// `error`. Other calls go through untouched.
  pub fn fail_next(&self, op: &'static str, error: ApiError) {
    self.lock().fail_next = Some(PendingFailure {
      op: Some(op),
      error,
    });
  }

  /// Make usage queries fail until reset.
  pub fn set_usage_unavailable(&self, unavailable: bool) {
    self.lock().usage_unavailable = unavailable;
  }

  /// Last record stored for a flow.
  pub fn stored(&self, flow_id: &str) -> Option<FlowRecord> {
    self.lock().flows.get(flow_id).map(|f| f.record.clone())
  }

  pub fn is_published(&self, flow_id: &str) -> Option<bool> {
    self.lock().flows.get(flow_id).map(|f| f.published)
  }

  pub fn flow_ids(&self) -> Vec<String> {
    self.lock().flows.keys().cloned().collect()
  }

  /// Calls made so far, as `"<op> <id>"`.
  pub fn calls(&self) -> Vec<String> {
    self.lock().calls.clone()
  }
}

#[async_trait]
impl FlowApi for MemoryFlowApi {
  async fn load_flow(&self, flow_id: &str) -> Result<FlowRecord, ApiError> {
    let mut state = self.lock();
    state.enter("load", Some(flow_id))?;
    let flow = state.flow(flow_id)?;
    Ok(FlowRecord {
      is_published: flow.published,
      ..flow.record.clone()
    })
  }

  async fn create_flow(&self, record: &FlowRecord) -> Result<String, ApiError> {
    let mut state = self.lock();
    state.enter("create", None)?;
    let id = state.allocate_id();
    state.flows.insert(
      id.clone(),
      StoredFlow {
        record: record.clone(),
        published: false,
        campaigns: Vec::new(),
      },
    );
    Ok(id)
  }

  async fn update_flow(
    &self,
    flow_id: &str,
    record: &FlowRecord,
  ) -> Result<UpdateOutcome, ApiError> {
    let mut state = self.lock();
    state.enter("update", Some(flow_id))?;
    let flow = state.flow(flow_id)?;
    if !flow.campaigns.is_empty() {
      return Err(ApiError::Conflict {
        campaigns: Some(flow.campaigns.clone()),
      });
    }
    flow.record = record.clone();
    Ok(UpdateOutcome {
      needs_republish: flow.published,
    })
  }

  async fn publish_flow(&self, flow_id: &str) -> Result<(), ApiError> {
    let mut state = self.lock();
    state.enter("publish", Some(flow_id))?;
    state.flow(flow_id)?.published = true;
    Ok(())
  }

  async fn fork_flow(&self, flow_id: &str) -> Result<String, ApiError> {
    let mut state = self.lock();
    state.enter("fork", Some(flow_id))?;
    let record = state.flow(flow_id)?.record.clone();
    let id = state.allocate_id();
    state.flows.insert(
      id.clone(),
      StoredFlow {
        record: FlowRecord {
          is_published: false,
          ..record
        },
        published: false,
        campaigns: Vec::new(),
      },
    );
    Ok(id)
  }

  async fn get_usage(&self, flow_id: &str) -> Result<UsageReport, ApiError> {
    let mut state = self.lock();
    state.enter("usage", Some(flow_id))?;
    if state.usage_unavailable {
      return Err(ApiError::status(503, "usage service unavailable"));
    }
    Ok(UsageReport {
      campaigns: state.flow(flow_id)?.campaigns.clone(),
    })
  }

  async fn delete_flow(&self, flow_id: &str) -> Result<(), ApiError> {
    let mut state = self.lock();
    state.enter("delete", Some(flow_id))?;
    let flow = state.flow(flow_id)?;
    if !flow.campaigns.is_empty() {
      return Err(ApiError::Conflict {
        campaigns: Some(flow.campaigns.clone()),
      });
    }
    state.flows.remove(flow_id);
    Ok(())
  }
}

#[async_trait]
impl TemplateCatalog for MemoryFlowApi {
  async fn list_templates(&self) -> Result<Vec<TemplateDef>, ApiError> {
    let mut state = self.lock();
    state.enter("templates", None)?;
    Ok(state.templates.clone())
  }
}
