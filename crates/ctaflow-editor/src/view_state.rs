//! Per-flow editor view state: which steps are collapsed, whether the
//! inspector is open, and the last layout direction.
//!
//! The session restores it when it opens a flow and snapshots it whenever
//! it changes.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use ctaflow_config::Direction;
use ctaflow_graph::StepId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
  pub collapsed_steps: BTreeSet<StepId>,
  pub inspector_collapsed: bool,
  pub direction: Direction,
}

#[derive(Debug, Error)]
pub enum ViewStateError {
  #[error("view state io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid view state: {0}")]
  Json(#[from] serde_json::Error),
}

/// Storage for view state, keyed by flow.
pub trait ViewStateStore: Send + Sync {
  fn load(&self, key: &str) -> Result<Option<ViewState>, ViewStateError>;

  fn save(&self, key: &str, state: &ViewState) -> Result<(), ViewStateError>;
}

#[derive(Debug, Default)]
pub struct MemoryViewStateStore {
  states: Mutex<HashMap<String, ViewState>>,
}

impl MemoryViewStateStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl ViewStateStore for MemoryViewStateStore {
  fn load(&self, key: &str) -> Result<Option<ViewState>, ViewStateError> {
    let states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
    Ok(states.get(key).cloned())
  }

  fn save(&self, key: &str, state: &ViewState) -> Result<(), ViewStateError> {
    let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
    states.insert(key.to_string(), state.clone());
    Ok(())
  }
}

/// One JSON file per flow under a directory.
#[derive(Debug, Clone)]
pub struct FsViewStateStore {
  dir: PathBuf,
}

impl FsViewStateStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  /// One file per key. The key is percent-encoded, so distinct keys never
  /// share a file and none can escape the directory.
  fn path_for(&self, key: &str) -> PathBuf {
    let name: String = form_urlencoded::byte_serialize(key.as_bytes()).collect();
    self.dir.join(format!("{name}.json"))
  }
}

impl ViewStateStore for FsViewStateStore {
  fn load(&self, key: &str) -> Result<Option<ViewState>, ViewStateError> {
    let path = self.path_for(key);
    if !path.exists() {
      return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
  }

  fn save(&self, key: &str, state: &ViewState) -> Result<(), ViewStateError> {
    std::fs::create_dir_all(&self.dir)?;
    let content = serde_json::to_string_pretty(state)?;
    std::fs::write(self.path_for(key), content)?;
    Ok(())
  }
}
