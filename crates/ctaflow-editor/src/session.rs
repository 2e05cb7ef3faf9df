use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ctaflow_api::FlowApi;
use ctaflow_codec::PayloadCodec;
use ctaflow_config::{Direction, EditorConfig, FlowRecord, SeedPositions, TemplateDef};
use ctaflow_graph::{
  ButtonId, ButtonSpec, Flow, FlowWarning, GraphError, IncomingWarning, Position, Size,
  StepContent, StepId, Transition, TransitionId,
};
use ctaflow_layout::{LayeredLayout, LayoutStrategy};
use ctaflow_lifecycle::{
  LifecycleController, LifecycleError, LifecycleState, LockInfo, SaveOutcome,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::events::{NoopNotifier, SessionEvent, SessionNotifier};
use crate::view_state::{MemoryViewStateStore, ViewState, ViewStateStore};

/// Prompt shown before leaving a session with unsaved changes.
pub const UNSAVED_CHANGES_PROMPT: &str = "You have unsaved changes. Leave anyway?";

/// Key under which view state of a never-saved flow is kept.
const NEW_FLOW_KEY: &str = "new";

/// Answer to "may the user navigate away now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
  Leave,
  ConfirmUnsaved(&'static str),
}

struct SessionState {
  flow: Flow,
  controller: Arc<LifecycleController>,
  dirty: bool,
  /// Bumped on every edit, so a save only clears `dirty` when nothing
  /// changed while it was in flight.
  revision: u64,
  view: ViewState,
}

struct SessionInner {
  codec: PayloadCodec,
  seed: SeedPositions,
  layout: Box<dyn LayoutStrategy>,
  notifier: Arc<dyn SessionNotifier>,
  view_store: Arc<dyn ViewStateStore>,
  cancel: CancellationToken,
  busy: AtomicBool,
  state: Mutex<SessionState>,
}

/// Clears the busy flag when an action finishes, however it finishes.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
  fn drop(&mut self) {
    self.0.store(false, Ordering::Release);
  }
}

/// Builds a [`FlowEditorSession`].
pub struct SessionBuilder {
  api: Arc<dyn FlowApi>,
  config: EditorConfig,
  notifier: Arc<dyn SessionNotifier>,
  view_store: Arc<dyn ViewStateStore>,
  layout: Option<Box<dyn LayoutStrategy>>,
}

impl SessionBuilder {
  pub fn new(api: Arc<dyn FlowApi>) -> Self {
    Self {
      api,
      config: EditorConfig::default(),
      notifier: Arc::new(NoopNotifier),
      view_store: Arc::new(MemoryViewStateStore::new()),
      layout: None,
    }
  }

  pub fn config(mut self, config: EditorConfig) -> Self {
    self.config = config;
    self
  }

  pub fn notifier(mut self, notifier: Arc<dyn SessionNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn view_store(mut self, store: Arc<dyn ViewStateStore>) -> Self {
    self.view_store = store;
    self
  }

  /// Use a layout strategy other than the configured [`LayeredLayout`].
  pub fn layout(mut self, layout: Box<dyn LayoutStrategy>) -> Self {
    self.layout = Some(layout);
    self
  }

  /// Start editing a flow that does not exist on the service yet.
  pub fn new_flow(self, name: impl Into<String>) -> FlowEditorSession {
    let controller = LifecycleController::new(self.api.clone());
    self.build(Flow::new(name), controller)
  }

  /// Load an existing flow and enter edit mode on it.
  ///
  /// A flow that fails to load or decode yields an error and no session.
  pub async fn open(self, flow_id: &str) -> Result<FlowEditorSession, SessionError> {
    let (controller, record) = LifecycleController::load(self.api.clone(), flow_id).await?;
    let codec = PayloadCodec::new(self.config.seed_positions);
    let flow = codec.decode(Some(flow_id.to_string()), record)?;
    info!(flow_id, state = %controller.state(), steps = flow.steps.len(), "flow opened");

    let session = self.build(flow, controller);
    session.restore_view_state();
    if let Some(lock) = session.lock_info() {
      session.inner.notifier.notify(SessionEvent::Locked {
        flow_id: flow_id.to_string(),
        campaigns: lock.campaigns,
      });
    }
    Ok(session)
  }

  fn build(self, flow: Flow, controller: LifecycleController) -> FlowEditorSession {
    let layout = self
      .layout
      .unwrap_or_else(|| Box::new(LayeredLayout::new(self.config.layout)) as Box<dyn LayoutStrategy>);
    let view = ViewState {
      direction: self.config.layout.direction,
      ..Default::default()
    };
    FlowEditorSession {
      inner: Arc::new(SessionInner {
        codec: PayloadCodec::new(self.config.seed_positions),
        seed: self.config.seed_positions,
        layout,
        notifier: self.notifier,
        view_store: self.view_store,
        cancel: CancellationToken::new(),
        busy: AtomicBool::new(false),
        state: Mutex::new(SessionState {
          flow,
          controller: Arc::new(controller),
          dirty: false,
          revision: 0,
          view,
        }),
      }),
    }
  }
}

/// The editing session bound to one open flow.
///
/// Edits are synchronous and apply to the in-memory [`Flow`]. Save, publish,
/// fork and delete are async and go through the [`LifecycleController`];
/// only one of them may be in flight at a time. After [`teardown`], late
/// responses are discarded without touching the session.
///
/// [`teardown`]: FlowEditorSession::teardown
#[derive(Clone)]
pub struct FlowEditorSession {
  inner: Arc<SessionInner>,
}

impl std::fmt::Debug for FlowEditorSession {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let state = self.state();
    f.debug_struct("FlowEditorSession")
      .field("flow_id", &state.flow.id)
      .field("steps", &state.flow.steps.len())
      .field("dirty", &state.dirty)
      .field("revision", &state.revision)
      .finish_non_exhaustive()
  }
}

impl FlowEditorSession {
  pub fn builder(api: Arc<dyn FlowApi>) -> SessionBuilder {
    SessionBuilder::new(api)
  }

  fn state(&self) -> MutexGuard<'_, SessionState> {
    self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn controller(&self) -> Arc<LifecycleController> {
    self.state().controller.clone()
  }

  // Queries

  pub fn flow(&self) -> Flow {
    self.state().flow.clone()
  }

  pub fn flow_id(&self) -> Option<String> {
    self.state().flow.id.clone()
  }

  pub fn lifecycle_state(&self) -> LifecycleState {
    self.controller().state()
  }

  pub fn lock_info(&self) -> Option<LockInfo> {
    self.controller().lock_info()
  }

  pub fn is_read_only(&self) -> bool {
    self.controller().is_read_only()
  }

  pub fn is_dirty(&self) -> bool {
    self.state().dirty
  }

  pub fn is_busy(&self) -> bool {
    self.inner.busy.load(Ordering::Acquire)
  }

  pub fn is_torn_down(&self) -> bool {
    self.inner.cancel.is_cancelled()
  }

  pub fn needs_republish(&self) -> bool {
    self.controller().needs_republish()
  }

  pub fn warnings(&self) -> Vec<FlowWarning> {
    self.state().flow.warnings()
  }

  pub fn incoming_warnings(&self) -> Vec<IncomingWarning> {
    self.state().flow.derive_incoming_warnings()
  }

  // Edits

  /// Apply an edit to the flow. Marks the session dirty when the edit
  /// succeeds and `changed` says it changed something.
  fn mutate<T, E>(
    &self,
    edit: impl FnOnce(&mut Flow) -> Result<T, E>,
    changed: impl FnOnce(&T) -> bool,
  ) -> Result<T, SessionError>
  where
    SessionError: From<E>,
  {
    if self.is_torn_down() {
      return Err(SessionError::TornDown);
    }
    let mut state = self.state();
    if state.controller.is_read_only() {
      return Err(SessionError::ReadOnly);
    }
    let out = edit(&mut state.flow)?;
    if changed(&out) {
      state.dirty = true;
      state.revision += 1;
    }
    Ok(out)
  }

  fn edit<T>(&self, edit: impl FnOnce(&mut Flow) -> Result<T, GraphError>) -> Result<T, SessionError> {
    self.mutate(edit, |_| true)
  }

  pub fn rename(&self, name: impl Into<String>) -> Result<(), SessionError> {
    let name = name.into();
    self.edit(|flow| {
      flow.rename(name);
      Ok(())
    })
  }

  pub fn add_step(&self, content: StepContent) -> Result<StepId, SessionError> {
    let seed = &self.inner.seed;
    self.edit(|flow| Ok(flow.add_step_seeded(content, seed)))
  }

  pub fn add_step_at(&self, content: StepContent, position: Position) -> Result<StepId, SessionError> {
    self.edit(|flow| Ok(flow.add_step_at(content, position)))
  }

  pub fn add_step_from_template(&self, template: &TemplateDef) -> Result<StepId, SessionError> {
    self.add_step(StepContent::from_template(template))
  }

  /// Remove a step and its transitions. Removing an unknown step is a no-op.
  pub fn remove_step(&self, id: &StepId) -> Result<bool, SessionError> {
    self.mutate(|flow| Ok::<_, GraphError>(flow.remove_step(id)), |removed| *removed)
  }

  /// Connect a button to a step. A rejected connection leaves the flow and
  /// the dirty flag untouched.
  pub fn add_transition(
    &self,
    source: &StepId,
    source_handle: &str,
    target: &StepId,
  ) -> Result<TransitionId, SessionError> {
    self.mutate(|flow| flow.add_transition(source, source_handle, target), |_| true)
  }

  pub fn remove_transition(&self, id: &TransitionId) -> Result<Option<Transition>, SessionError> {
    self.mutate(
      |flow| Ok::<_, GraphError>(flow.remove_transition(id)),
      Option::is_some,
    )
  }

  pub fn move_step(&self, id: &StepId, position: Position) -> Result<(), SessionError> {
    self.edit(|flow| flow.move_step(id, position))
  }

  /// Record a measured footprint. This is renderer bookkeeping: it is
  /// allowed on read-only flows and does not dirty the session.
  pub fn set_step_size(&self, id: &StepId, size: Size) -> Result<(), SessionError> {
    Ok(self.state().flow.set_step_size(id, size)?)
  }

  pub fn set_message_body(&self, id: &StepId, body: impl Into<String>) -> Result<(), SessionError> {
    let body = body.into();
    self.edit(|flow| flow.set_message_body(id, body))
  }

  pub fn set_profile_name(&self, id: &StepId, enabled: bool, slot: u32) -> Result<(), SessionError> {
    self.edit(|flow| flow.set_profile_name(id, enabled, slot))
  }

  pub fn set_audience(
    &self,
    id: &StepId,
    required_tag: Option<String>,
    required_source: Option<String>,
  ) -> Result<(), SessionError> {
    self.edit(|flow| flow.set_audience(id, required_tag, required_source))
  }

  pub fn set_buttons(&self, id: &StepId, buttons: Vec<ButtonSpec>) -> Result<(), SessionError> {
    self.edit(|flow| flow.set_buttons(id, buttons))
  }

  pub fn rename_button(
    &self,
    step_id: &StepId,
    button_id: &ButtonId,
    text: impl Into<String>,
  ) -> Result<(), SessionError> {
    let text = text.into();
    self.edit(|flow| flow.rename_button(step_id, button_id, text))
  }

  /// Re-position every step with the session's layout strategy.
  pub fn auto_layout(&self, direction: Direction) -> Result<(), SessionError> {
    let layout = self.inner.layout.as_ref();
    self.edit(|flow| {
      flow.apply_layout(layout, direction);
      Ok(())
    })?;
    debug!(%direction, "auto layout applied");
    self.update_view(|view| view.direction = direction);
    Ok(())
  }

  // View state

  fn view_key(&self) -> String {
    self
      .flow_id()
      .unwrap_or_else(|| NEW_FLOW_KEY.to_string())
  }

  pub fn view_state(&self) -> ViewState {
    self.state().view.clone()
  }

  /// Load the stored view state for this flow, if any.
  pub fn restore_view_state(&self) {
    let key = self.view_key();
    match self.inner.view_store.load(&key) {
      Ok(Some(view)) => self.state().view = view,
      Ok(None) => {}
      Err(error) => warn!(%key, %error, "could not restore view state"),
    }
  }

  /// Persist the current view state. Failures are logged, not surfaced.
  pub fn snapshot_view_state(&self) {
    let key = self.view_key();
    let view = self.view_state();
    if let Err(error) = self.inner.view_store.save(&key, &view) {
      warn!(%key, %error, "could not save view state");
    }
  }

  fn update_view(&self, change: impl FnOnce(&mut ViewState)) {
    change(&mut self.state().view);
    self.snapshot_view_state();
  }

  pub fn set_step_collapsed(&self, id: &StepId, collapsed: bool) {
    self.update_view(|view| {
      if collapsed {
        view.collapsed_steps.insert(id.clone());
      } else {
        view.collapsed_steps.remove(id);
      }
    });
  }

  pub fn set_inspector_collapsed(&self, collapsed: bool) {
    self.update_view(|view| view.inspector_collapsed = collapsed);
  }

  // Actions

  fn begin_action(&self) -> Result<BusyGuard<'_>, SessionError> {
    if self.is_torn_down() {
      return Err(SessionError::TornDown);
    }
    self
      .inner
      .busy
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .map_err(|_| SessionError::Busy)?;
    Ok(BusyGuard(&self.inner.busy))
  }

  /// Await an action unless the session is torn down first.
  async fn run<T>(
    &self,
    action: &str,
    future: impl Future<Output = Result<T, LifecycleError>>,
  ) -> Result<T, SessionError> {
    let result = tokio::select! {
      biased;
      _ = self.inner.cancel.cancelled() => None,
      result = future => Some(result),
    };
    if self.is_torn_down() {
      warn!(action, "session closed, ignoring response");
      return Err(SessionError::TornDown);
    }
    match result {
      Some(Ok(value)) => Ok(value),
      Some(Err(err)) => Err(self.report_failure(action, err)),
      None => Err(SessionError::TornDown),
    }
  }

  /// Notify the UI of a failed action and convert the error.
  fn report_failure(&self, action: &str, err: LifecycleError) -> SessionError {
    let locked = match &err {
      LifecycleError::Locked { flow_id, campaigns } => Some(SessionEvent::Locked {
        flow_id: flow_id.clone(),
        campaigns: campaigns.clone(),
      }),
      _ => None,
    };
    let err = SessionError::from(err);
    let event = locked.unwrap_or_else(|| {
      warn!(action, error = %err, "flow action failed");
      SessionEvent::ActionFailed {
        action: action.to_string(),
        message: err.user_message(),
      }
    });
    self.inner.notifier.notify(event);
    err
  }

  /// Snapshot the flow for sending, with the revision it was taken at.
  fn snapshot_for_send(&self) -> (Arc<LifecycleController>, FlowRecord, u64) {
    let state = self.state();
    (
      state.controller.clone(),
      self.inner.codec.encode(&state.flow),
      state.revision,
    )
  }

  /// Mark saved content as persisted.
  fn settle(&self, flow_id: &str, revision: u64, published: Option<bool>) {
    let mut state = self.state();
    state.flow.id = Some(flow_id.to_string());
    if let Some(published) = published {
      state.flow.is_published = published;
    }
    if state.revision == revision {
      state.dirty = false;
    }
  }

  /// Save the flow in place (creating it on first save).
  pub async fn save(&self) -> Result<SaveOutcome, SessionError> {
    let _busy = self.begin_action()?;
    let (controller, record, revision) = self.snapshot_for_send();
    let outcome = self.run("save", controller.save(&record)).await?;

    self.settle(&outcome.flow_id, revision, None);
    if outcome.created {
      self.snapshot_view_state();
    }
    self.inner.notifier.notify(SessionEvent::Saved {
      flow_id: outcome.flow_id.clone(),
      created: outcome.created,
    });
    if outcome.needs_republish {
      self.inner.notifier.notify(SessionEvent::NeedsRepublish {
        flow_id: outcome.flow_id.clone(),
      });
    }
    Ok(outcome)
  }

  /// Save and publish the flow.
  pub async fn publish(&self) -> Result<String, SessionError> {
    let _busy = self.begin_action()?;
    let was_new = self.flow_id().is_none();
    let (controller, record, revision) = self.snapshot_for_send();
    let flow_id = self.run("publish", controller.publish(&record)).await?;

    self.settle(&flow_id, revision, Some(true));
    if was_new {
      self.snapshot_view_state();
    }
    self.inner.notifier.notify(SessionEvent::Published {
      flow_id: flow_id.clone(),
    });
    Ok(flow_id)
  }

  /// Fork a locked flow and continue editing the copy.
  ///
  /// The original flow is not modified. Returns the new flow id.
  pub async fn fork(&self) -> Result<String, SessionError> {
    let _busy = self.begin_action()?;
    let controller = self.controller();
    let original_id = controller.flow_id().unwrap_or_default();
    let forked = self.run("fork", controller.fork()).await?;
    let fork_id = forked.flow_id().unwrap_or_default();

    {
      let mut state = self.state();
      state.controller = Arc::new(forked);
      state.flow.id = Some(fork_id.clone());
      state.flow.is_published = false;
    }
    self.snapshot_view_state();
    self.inner.notifier.notify(SessionEvent::Forked {
      original_id,
      fork_id: fork_id.clone(),
    });
    Ok(fork_id)
  }

  /// Delete the flow from the service.
  pub async fn delete(&self) -> Result<(), SessionError> {
    let _busy = self.begin_action()?;
    let controller = self.controller();
    let flow_id = controller.flow_id().unwrap_or_default();
    self.run("delete", controller.delete()).await?;

    {
      let mut state = self.state();
      state.flow.id = None;
      state.flow.is_published = false;
      state.dirty = false;
    }
    self.inner.notifier.notify(SessionEvent::Deleted { flow_id });
    Ok(())
  }

  // Navigation

  pub fn leave_check(&self) -> LeaveDecision {
    if self.is_dirty() && !self.is_torn_down() {
      LeaveDecision::ConfirmUnsaved(UNSAVED_CHANGES_PROMPT)
    } else {
      LeaveDecision::Leave
    }
  }

  /// Close the session. Pending actions resolve to [`SessionError::TornDown`]
  /// and their responses are ignored.
  pub fn teardown(&self) {
    if !self.is_torn_down() {
      self.snapshot_view_state();
      self.inner.cancel.cancel();
      info!(flow_id = ?self.flow_id(), "editor session closed");
    }
  }
}
