use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ctaflow_api::{ApiError, FlowApi};
use ctaflow_config::{CampaignRef, FlowRecord};
use tracing::{info, warn};

use crate::error::LifecycleError;
use crate::state::{LifecycleAction, LifecycleState};

/// Why a flow is locked.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LockInfo {
  /// Campaigns referencing the flow; `None` when the service could not say.
  pub campaigns: Option<Vec<CampaignRef>>,
}

impl LockInfo {
  pub fn campaign_names(&self) -> Vec<&str> {
    self
      .campaigns
      .iter()
      .flatten()
      .map(|c| c.name.as_str())
      .collect()
  }
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
  pub flow_id: String,
  /// The save created the flow.
  pub created: bool,
  /// Saved changes to a published flow are not live until republished.
  pub needs_republish: bool,
}

#[derive(Debug)]
struct ControllerState {
  flow_id: Option<String>,
  state: LifecycleState,
  lock: Option<LockInfo>,
  needs_republish: bool,
}

/// Drives one flow through draft, publish, lock and fork.
///
/// Every network action checks the transition table first, so a locked flow
/// never reaches the service with an update. A conflict response from the
/// service locks the flow even if the last usage check said otherwise.
pub struct LifecycleController {
  api: Arc<dyn FlowApi>,
  inner: Mutex<ControllerState>,
}

impl std::fmt::Debug for LifecycleController {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LifecycleController")
      .field("state", &*self.lock())
      .finish_non_exhaustive()
  }
}

impl LifecycleController {
  /// Controller for a flow that has not been saved yet.
  pub fn new(api: Arc<dyn FlowApi>) -> Self {
    Self::with_state(api, None, LifecycleState::New)
  }

  /// Controller for an unpublished draft the service already has.
  ///
  /// Published flows only come from [`load`](Self::load), which runs the
  /// usage check before allowing edits.
  pub fn draft(api: Arc<dyn FlowApi>, flow_id: impl Into<String>) -> Self {
    Self::with_state(api, Some(flow_id.into()), LifecycleState::DraftUnpublished)
  }

  fn with_state(api: Arc<dyn FlowApi>, flow_id: Option<String>, state: LifecycleState) -> Self {
    Self {
      api,
      inner: Mutex::new(ControllerState {
        flow_id,
        state,
        lock: None,
        needs_republish: false,
      }),
    }
  }

  /// Load a flow and enter edit mode on it.
  pub async fn load(
    api: Arc<dyn FlowApi>,
    flow_id: &str,
  ) -> Result<(Self, FlowRecord), LifecycleError> {
    let record = api
      .load_flow(flow_id)
      .await
      .map_err(|source| LifecycleError::LoadFailed {
        flow_id: flow_id.to_string(),
        source,
      })?;
    let controller = Self::with_state(
      api,
      Some(flow_id.to_string()),
      LifecycleState::initial(true, record.is_published),
    );
    controller.enter_edit().await;
    Ok((controller, record))
  }

  fn lock(&self) -> MutexGuard<'_, ControllerState> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn state(&self) -> LifecycleState {
    self.lock().state
  }

  pub fn flow_id(&self) -> Option<String> {
    self.lock().flow_id.clone()
  }

  pub fn is_read_only(&self) -> bool {
    self.state().is_read_only()
  }

  pub fn lock_info(&self) -> Option<LockInfo> {
    self.lock().lock.clone()
  }

  pub fn needs_republish(&self) -> bool {
    self.lock().needs_republish
  }

  fn snapshot(&self) -> (LifecycleState, Option<String>) {
    let inner = self.lock();
    (inner.state, inner.flow_id.clone())
  }

  fn check(&self, state: LifecycleState, action: LifecycleAction) -> Result<LifecycleState, LifecycleError> {
    if state.is_read_only() && action != LifecycleAction::Fork {
      return Err(self.locked_error());
    }
    state
      .next(action)
      .ok_or(LifecycleError::InvalidTransition { state, action })
  }

  fn locked_error(&self) -> LifecycleError {
    let inner = self.lock();
    LifecycleError::Locked {
      flow_id: inner.flow_id.clone().unwrap_or_default(),
      campaigns: inner.lock.as_ref().and_then(|l| l.campaigns.clone()),
    }
  }

  /// Lock the flow and return the error to report.
  fn enter_locked(&self, campaigns: Option<Vec<CampaignRef>>) -> LifecycleError {
    {
      let mut inner = self.lock();
      inner.state = LifecycleState::PublishedLocked;
      inner.lock = Some(LockInfo { campaigns });
    }
    self.locked_error()
  }

  /// Run the usage check for a published flow before allowing edits.
  ///
  /// Drafts and new flows are returned as-is. A failed check locks the flow
  /// with no campaign list.
  pub async fn enter_edit(&self) -> LifecycleState {
    let (state, flow_id) = self.snapshot();
    let Some(flow_id) = flow_id.filter(|_| state.is_published()) else {
      return state;
    };

    match self.api.get_usage(&flow_id).await {
      Ok(report) if report.is_attached() => {
        info!(flow_id = %flow_id, campaigns = report.campaigns.len(), "flow is locked by campaigns");
        self.enter_locked(Some(report.campaigns));
      }
      Ok(_) => {
        let mut inner = self.lock();
        inner.state = LifecycleState::PublishedUnlocked;
        inner.lock = None;
      }
      Err(error) => {
        warn!(flow_id = %flow_id, %error, "usage check failed, treating flow as locked");
        self.enter_locked(None);
      }
    }
    self.state()
  }

  /// Create or update the flow. The record is always sent unpublished.
  pub async fn save(&self, record: &FlowRecord) -> Result<SaveOutcome, LifecycleError> {
    let (state, flow_id) = self.snapshot();
    let next = self.check(state, LifecycleAction::Save)?;
    let record = FlowRecord {
      is_published: false,
      ..record.clone()
    };

    match flow_id {
      None => {
        let flow_id = self
          .api
          .create_flow(&record)
          .await
          .map_err(|source| LifecycleError::SaveFailed {
            flow_id: None,
            source,
          })?;
        {
          let mut inner = self.lock();
          inner.flow_id = Some(flow_id.clone());
          inner.state = next;
        }
        info!(flow_id = %flow_id, state = %next, "flow created");
        Ok(SaveOutcome {
          flow_id,
          created: true,
          needs_republish: false,
        })
      }
      Some(flow_id) => match self.api.update_flow(&flow_id, &record).await {
        Ok(outcome) => {
          let needs_republish = outcome.needs_republish && next.is_published();
          {
            let mut inner = self.lock();
            inner.state = next;
            inner.needs_republish = needs_republish;
          }
          info!(flow_id = %flow_id, state = %next, needs_republish, "flow saved");
          Ok(SaveOutcome {
            flow_id,
            created: false,
            needs_republish,
          })
        }
        Err(ApiError::Conflict { campaigns }) => {
          warn!(flow_id = %flow_id, "save rejected: flow is in use");
          Err(self.enter_locked(campaigns))
        }
        Err(source) => Err(LifecycleError::SaveFailed {
          flow_id: Some(flow_id),
          source,
        }),
      },
    }
  }

  /// Save, then make the saved version live.
  pub async fn publish(&self, record: &FlowRecord) -> Result<String, LifecycleError> {
    let (state, _) = self.snapshot();
    self.check(state, LifecycleAction::Publish)?;

    let saved = self.save(record).await?;
    match self.api.publish_flow(&saved.flow_id).await {
      Ok(()) => {
        {
          let mut inner = self.lock();
          inner.state = LifecycleState::PublishedUnlocked;
          inner.needs_republish = false;
        }
        info!(flow_id = %saved.flow_id, "flow published");
        Ok(saved.flow_id)
      }
      Err(ApiError::Conflict { campaigns }) => {
        warn!(flow_id = %saved.flow_id, "publish rejected: flow is in use");
        Err(self.enter_locked(campaigns))
      }
      Err(source) => Err(LifecycleError::PublishFailed {
        flow_id: saved.flow_id,
        source,
      }),
    }
  }

  /// Copy a locked flow into a new draft. The original is left untouched;
  /// the returned controller manages the copy.
  pub async fn fork(&self) -> Result<LifecycleController, LifecycleError> {
    let (state, flow_id) = self.snapshot();
    let next = self.check(state, LifecycleAction::Fork)?;
    let flow_id = flow_id.ok_or(LifecycleError::NotPersisted)?;

    let fork_id = self
      .api
      .fork_flow(&flow_id)
      .await
      .map_err(|source| LifecycleError::ForkFailed {
        flow_id: flow_id.clone(),
        source,
      })?;
    info!(flow_id = %flow_id, fork_id = %fork_id, "flow forked");
    Ok(Self::with_state(self.api.clone(), Some(fork_id), next))
  }

  /// Delete the flow from the service.
  pub async fn delete(&self) -> Result<(), LifecycleError> {
    let (state, flow_id) = self.snapshot();
    let Some(flow_id) = flow_id else {
      return Err(LifecycleError::NotPersisted);
    };
    let next = self.check(state, LifecycleAction::Delete)?;

    match self.api.delete_flow(&flow_id).await {
      Ok(()) => {
        {
          let mut inner = self.lock();
          inner.state = next;
          inner.flow_id = None;
          inner.needs_republish = false;
        }
        info!(flow_id = %flow_id, "flow deleted");
        Ok(())
      }
      Err(ApiError::Conflict { campaigns }) => Err(self.enter_locked(campaigns)),
      Err(source) => Err(LifecycleError::DeleteFailed { flow_id, source }),
    }
  }
}
