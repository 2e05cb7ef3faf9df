use std::collections::HashSet;

use ctaflow_config::{Direction, SeedPositions};
use ctaflow_layout::{LayoutEdge, LayoutNode, LayoutStrategy, Position, Size};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConnectionRejected, GraphError};
use crate::ids::{ButtonId, StepId, TransitionId};
use crate::step::{Button, ButtonSpec, MAX_BUTTONS, Step, StepContent};
use crate::transition::{Transition, normalize_handle};
use crate::validator;
use crate::warning::{FlowWarning, IncomingWarning};

/// A CTA flow: ordered steps and the button transitions between them.
///
/// This is the editing session's working copy. All mutation goes through
/// the methods below so the graph invariants hold after every call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Flow {
  /// Server id; `None` until the flow is first saved.
  pub id: Option<String>,
  pub name: String,
  pub is_published: bool,
  pub steps: Vec<Step>,
  pub transitions: Vec<Transition>,
}

impl Flow {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Default::default()
    }
  }

  pub fn step(&self, id: &StepId) -> Option<&Step> {
    self.steps.iter().find(|s| &s.id == id)
  }

  fn step_mut(&mut self, id: &StepId) -> Result<&mut Step, GraphError> {
    self
      .steps
      .iter_mut()
      .find(|s| &s.id == id)
      .ok_or_else(|| GraphError::StepNotFound(id.to_string()))
  }

  pub fn transition(&self, id: &TransitionId) -> Option<&Transition> {
    self.transitions.iter().find(|t| &t.id == id)
  }

  /// Transitions leaving a step, in insertion order.
  pub fn outgoing<'a>(&'a self, step_id: &'a StepId) -> impl Iterator<Item = &'a Transition> + 'a {
    self.transitions.iter().filter(move |t| &t.source == step_id)
  }

  /// Append a step at the next position of the default seed grid.
  pub fn add_step(&mut self, content: StepContent) -> StepId {
    self.add_step_seeded(content, &SeedPositions::default())
  }

  /// Append a step at the next position of `seed`.
  pub fn add_step_seeded(&mut self, content: StepContent, seed: &SeedPositions) -> StepId {
    let (x, y) = seed.position_for(self.steps.len());
    self.add_step_at(content, Position::new(x, y))
  }

  pub fn add_step_at(&mut self, content: StepContent, position: Position) -> StepId {
    let id = StepId::generate();
    self.steps.push(Step::new(id.clone(), content, position));
    id
  }

  /// Remove a step and every transition touching it.
  ///
  /// Returns whether a step was removed; removing an unknown id is a no-op.
  pub fn remove_step(&mut self, id: &StepId) -> bool {
    let before = self.steps.len();
    self.steps.retain(|s| &s.id != id);
    if self.steps.len() == before {
      return false;
    }
    self.transitions.retain(|t| !t.touches(id));
    true
  }

  /// Connect `source`'s button labelled `source_handle` to `target`.
  ///
  /// The button is matched by trimmed, case-insensitive text and the
  /// transition is bound to it. When no text matches, the first button
  /// without a target records `target` but the transition stays unbound,
  /// so that button's own label can still be connected. On success the
  /// chosen button's `target_node_id` is set to `target`.
  pub fn add_transition(
    &mut self,
    source: &StepId,
    source_handle: &str,
    target: &StepId,
  ) -> Result<TransitionId, ConnectionRejected> {
    let mut candidate = Transition::new(source.clone(), source_handle, target.clone());
    validator::check(&candidate, &[])?;

    if self.step(target).is_none() {
      return Err(ConnectionRejected::UnknownStep(target.to_string()));
    }
    let slot = {
      let step = self
        .step(source)
        .ok_or_else(|| ConnectionRejected::UnknownStep(source.to_string()))?;
      candidate.button_id = step
        .buttons
        .iter()
        .find(|b| b.matches_handle(source_handle))
        .map(|b| b.id.clone());
      step.connection_slot(source_handle)
    };

    if let Err(reason) = validator::check(&candidate, &self.transitions) {
      debug!(source = %source, handle = source_handle, target = %target, %reason, "connection rejected");
      return Err(reason);
    }

    if let (Some(i), Some(step)) = (slot, self.steps.iter_mut().find(|s| &s.id == source)) {
      step.buttons[i].target_node_id = Some(target.clone());
    }

    let id = candidate.id.clone();
    self.transitions.push(candidate);
    Ok(id)
  }

  /// Remove a transition.
  ///
  /// The source button keeps its `target_node_id`; it is only overwritten
  /// when the button is connected again.
  pub fn remove_transition(&mut self, id: &TransitionId) -> Option<Transition> {
    let index = self.transitions.iter().position(|t| &t.id == id)?;
    Some(self.transitions.remove(index))
  }

  /// For every step, whether no transition leads to it.
  pub fn derive_incoming_warnings(&self) -> Vec<IncomingWarning> {
    let targeted: HashSet<&StepId> = self.transitions.iter().map(|t| &t.target).collect();
    self
      .steps
      .iter()
      .map(|s| IncomingWarning {
        step_id: s.id.clone(),
        has_no_incoming: !targeted.contains(&s.id),
      })
      .collect()
  }

  /// Whether a transition's button has disappeared from its source step.
  pub fn is_orphaned(&self, transition: &Transition) -> bool {
    let Some(step) = self.step(&transition.source) else {
      return true;
    };
    if let Some(button_id) = &transition.button_id {
      if step.button(button_id).is_some() {
        return false;
      }
    }
    !step
      .buttons
      .iter()
      .any(|b| b.matches_handle(&transition.source_handle))
  }

  /// All authoring hints, in step order then transition order.
  pub fn warnings(&self) -> Vec<FlowWarning> {
    let mut warnings: Vec<FlowWarning> = self
      .derive_incoming_warnings()
      .into_iter()
      .filter(|w| w.has_no_incoming)
      .map(|w| FlowWarning::Unreachable { step_id: w.step_id })
      .collect();

    for step in &self.steps {
      if step.use_profile_name && step.placeholder_count() == 0 {
        warnings.push(FlowWarning::ProfileNameWithoutPlaceholder {
          step_id: step.id.clone(),
        });
      }
    }

    for transition in &self.transitions {
      if self.is_orphaned(transition) {
        warnings.push(FlowWarning::OrphanedTransition {
          transition_id: transition.id.clone(),
          source: transition.source.clone(),
          handle: transition.source_handle.clone(),
        });
      }
    }

    warnings
  }

  pub fn rename(&mut self, name: impl Into<String>) {
    self.name = name.into();
  }

  pub fn move_step(&mut self, id: &StepId, position: Position) -> Result<(), GraphError> {
    self.step_mut(id)?.position = position;
    Ok(())
  }

  /// Record the renderer's measurement of a step.
  pub fn set_step_size(&mut self, id: &StepId, size: Size) -> Result<(), GraphError> {
    self.step_mut(id)?.size = Some(size);
    Ok(())
  }

  /// Replace a step's body, re-clamping the profile-name slot.
  pub fn set_message_body(&mut self, id: &StepId, body: impl Into<String>) -> Result<(), GraphError> {
    let step = self.step_mut(id)?;
    step.message_body = body.into();
    step.normalize_profile_name();
    Ok(())
  }

  /// Configure profile-name injection. The slot is clamped to the body's
  /// placeholder count, and the flag is refused when there are none.
  pub fn set_profile_name(&mut self, id: &StepId, enabled: bool, slot: u32) -> Result<(), GraphError> {
    let step = self.step_mut(id)?;
    step.use_profile_name = enabled;
    step.profile_name_slot = slot;
    step.normalize_profile_name();
    Ok(())
  }

  /// Set the audience filters. Blank values clear the filter.
  pub fn set_audience(
    &mut self,
    id: &StepId,
    required_tag: Option<String>,
    required_source: Option<String>,
  ) -> Result<(), GraphError> {
    let step = self.step_mut(id)?;
    step.required_tag = required_tag.filter(|s| !s.trim().is_empty());
    step.required_source = required_source.filter(|s| !s.trim().is_empty());
    Ok(())
  }

  /// Replace a step's buttons.
  ///
  /// A new button whose text matches an existing one inherits that
  /// button's identity and target, so its transition stays attached.
  /// Transitions whose button is gone are re-bound by label when possible
  /// and otherwise left orphaned.
  pub fn set_buttons(&mut self, id: &StepId, specs: Vec<ButtonSpec>) -> Result<(), GraphError> {
    if specs.len() > MAX_BUTTONS {
      return Err(GraphError::TooManyButtons {
        step_id: id.to_string(),
        count: specs.len(),
      });
    }

    let step = self.step_mut(id)?;
    let mut previous = std::mem::take(&mut step.buttons);
    step.buttons = specs
      .into_iter()
      .enumerate()
      .map(|(i, spec)| {
        let reused = previous
          .iter()
          .position(|b| normalize_handle(&b.text) == normalize_handle(&spec.text))
          .map(|p| previous.remove(p));
        let mut button = Button::from_spec(spec, i as u32 + 1);
        if let Some(old) = reused {
          button.id = old.id;
          button.target_node_id = old.target_node_id;
        }
        button
      })
      .collect();
    step.refresh_trigger_button();

    let buttons: Vec<(ButtonId, String)> = step
      .buttons
      .iter()
      .map(|b| (b.id.clone(), normalize_handle(&b.text)))
      .collect();
    for transition in self.transitions.iter_mut().filter(|t| &t.source == id) {
      let still_bound = transition
        .button_id
        .as_ref()
        .is_some_and(|b| buttons.iter().any(|(id, _)| id == b));
      if !still_bound {
        let label = normalize_handle(&transition.source_handle);
        transition.button_id = buttons
          .iter()
          .find(|(_, text)| *text == label)
          .map(|(id, _)| id.clone());
      }
    }

    Ok(())
  }

  /// Change a button's text. Transitions leaving from it follow the new
  /// label.
  pub fn rename_button(
    &mut self,
    step_id: &StepId,
    button_id: &ButtonId,
    text: impl Into<String>,
  ) -> Result<(), GraphError> {
    let text = text.into();
    let step = self.step_mut(step_id)?;
    let button = step
      .buttons
      .iter_mut()
      .find(|b| &b.id == button_id)
      .ok_or_else(|| GraphError::ButtonNotFound {
        step_id: step_id.to_string(),
        button_id: button_id.to_string(),
      })?;
    button.text = text.clone();
    step.refresh_trigger_button();

    for transition in &mut self.transitions {
      if &transition.source == step_id && transition.button_id.as_ref() == Some(button_id) {
        transition.source_handle = text.clone();
      }
    }
    Ok(())
  }

  /// A copy of this flow with positions computed by `strategy`.
  ///
  /// Identity and content are unchanged; only `position` differs.
  pub fn with_layout(&self, strategy: &dyn LayoutStrategy, direction: Direction) -> Flow {
    let mut laid_out = self.clone();
    laid_out.apply_layout(strategy, direction);
    laid_out
  }

  pub fn apply_layout(&mut self, strategy: &dyn LayoutStrategy, direction: Direction) {
    let nodes: Vec<LayoutNode> = self
      .steps
      .iter()
      .map(|s| LayoutNode {
        id: s.id.to_string(),
        size: s.size,
      })
      .collect();
    let edges: Vec<LayoutEdge> = self
      .transitions
      .iter()
      .map(|t| LayoutEdge::new(t.source.to_string(), t.target.to_string()))
      .collect();

    let positions = strategy.arrange(&nodes, &edges, direction);
    for (step, position) in self.steps.iter_mut().zip(positions) {
      step.position = position;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ctaflow_config::TemplateType;

  fn content(body: &str, buttons: &[&str]) -> StepContent {
    StepContent {
      template_name: "tpl".to_string(),
      template_type: TemplateType::Text,
      message_body: body.to_string(),
      buttons: buttons.iter().map(|b| ButtonSpec::quick_reply(*b)).collect(),
    }
  }

  #[test]
  fn test_add_step_seeds_positions() {
    let mut flow = Flow::new("f");
    let a = flow.add_step(content("a", &[]));
    let b = flow.add_step(content("b", &[]));
    assert_eq!(flow.step(&a).unwrap().position, Position::new(120.0, 150.0));
    assert_eq!(flow.step(&b).unwrap().position, Position::new(240.0, 210.0));
  }

  #[test]
  fn test_add_step_uses_given_seed_grid() {
    let seed = SeedPositions {
      origin_x: 0.0,
      step_x: 300.0,
      origin_y: 10.0,
      step_y: 100.0,
      rows: 2,
    };
    let mut flow = Flow::new("f");
    let ids: Vec<StepId> = (0..3).map(|_| flow.add_step_seeded(content("x", &[]), &seed)).collect();
    assert_eq!(flow.step(&ids[1]).unwrap().position, Position::new(300.0, 110.0));
    assert_eq!(flow.step(&ids[2]).unwrap().position, Position::new(600.0, 10.0));
  }

  #[test]
  fn test_add_transition_binds_button() {
    let mut flow = Flow::new("f");
    let s1 = flow.add_step(content("q", &["Yes", "No"]));
    let s2 = flow.add_step(content("a", &[]));

    let id = flow.add_transition(&s1, "yes", &s2).unwrap();
    let step = flow.step(&s1).unwrap();
    assert_eq!(step.buttons[0].target_node_id.as_ref(), Some(&s2));
    assert_eq!(flow.transition(&id).unwrap().button_id.as_ref(), Some(&step.buttons[0].id));
  }

  #[test]
  fn test_add_transition_rejects_unknown_steps() {
    let mut flow = Flow::new("f");
    let s1 = flow.add_step(content("q", &["Yes"]));
    let ghost = StepId::from("ghost");
    assert_eq!(
      flow.add_transition(&s1, "Yes", &ghost),
      Err(ConnectionRejected::UnknownStep("ghost".to_string()))
    );
    assert!(flow.transitions.is_empty());
  }

  #[test]
  fn test_fallback_slot_used_when_label_unknown() {
    let mut flow = Flow::new("f");
    let s1 = flow.add_step(content("q", &["Yes", "No"]));
    let s2 = flow.add_step(content("a", &[]));
    let s3 = flow.add_step(content("b", &[]));

    flow.add_transition(&s1, "Yes", &s2).unwrap();
    let custom = flow.add_transition(&s1, "Custom", &s3).unwrap();
    assert_eq!(flow.step(&s1).unwrap().buttons[1].target_node_id.as_ref(), Some(&s3));
    assert_eq!(flow.transition(&custom).unwrap().button_id, None);
  }

  #[test]
  fn test_remove_transition_keeps_stale_target() {
    let mut flow = Flow::new("f");
    let s1 = flow.add_step(content("q", &["Yes"]));
    let s2 = flow.add_step(content("a", &[]));
    let id = flow.add_transition(&s1, "Yes", &s2).unwrap();

    assert!(flow.remove_transition(&id).is_some());
    assert!(flow.transitions.is_empty());
    assert_eq!(flow.step(&s1).unwrap().buttons[0].target_node_id.as_ref(), Some(&s2));
    assert!(flow.remove_transition(&id).is_none());
  }

  #[test]
  fn test_rename_button_keeps_transition_attached() {
    let mut flow = Flow::new("f");
    let s1 = flow.add_step(content("q", &["Yes"]));
    let s2 = flow.add_step(content("a", &[]));
    flow.add_transition(&s1, "Yes", &s2).unwrap();

    let button = flow.step(&s1).unwrap().buttons[0].id.clone();
    flow.rename_button(&s1, &button, "Sure").unwrap();

    assert_eq!(flow.transitions[0].source_handle, "Sure");
    assert_eq!(flow.step(&s1).unwrap().trigger_button_text.as_deref(), Some("Sure"));
    assert!(flow.warnings().iter().all(|w| !matches!(w, FlowWarning::OrphanedTransition { .. })));
  }

  #[test]
  fn test_set_buttons_orphans_removed_button() {
    let mut flow = Flow::new("f");
    let s1 = flow.add_step(content("q", &["Yes", "No"]));
    let s2 = flow.add_step(content("a", &[]));
    flow.add_transition(&s1, "No", &s2).unwrap();

    flow.set_buttons(&s1, vec![ButtonSpec::quick_reply("Yes")]).unwrap();

    assert!(flow.is_orphaned(&flow.transitions[0]));
    assert!(flow.warnings().contains(&FlowWarning::OrphanedTransition {
      transition_id: flow.transitions[0].id.clone(),
      source: s1.clone(),
      handle: "No".to_string(),
    }));
  }

  #[test]
  fn test_set_buttons_preserves_matching_identity() {
    let mut flow = Flow::new("f");
    let s1 = flow.add_step(content("q", &["Yes", "No"]));
    let s2 = flow.add_step(content("a", &[]));
    flow.add_transition(&s1, "No", &s2).unwrap();
    let no_id = flow.step(&s1).unwrap().buttons[1].id.clone();

    flow
      .set_buttons(
        &s1,
        vec![ButtonSpec::quick_reply("No"), ButtonSpec::quick_reply("Later")],
      )
      .unwrap();

    let step = flow.step(&s1).unwrap();
    assert_eq!(step.buttons[0].id, no_id);
    assert_eq!(step.buttons[0].index, 1);
    assert_eq!(step.buttons[0].target_node_id.as_ref(), Some(&s2));
    assert!(!flow.is_orphaned(&flow.transitions[0]));
  }

  #[test]
  fn test_set_buttons_rejects_more_than_three() {
    let mut flow = Flow::new("f");
    let s1 = flow.add_step(content("q", &[]));
    let specs = ["a", "b", "c", "d"].map(ButtonSpec::quick_reply).to_vec();
    assert!(matches!(
      flow.set_buttons(&s1, specs),
      Err(GraphError::TooManyButtons { count: 4, .. })
    ));
  }

  #[test]
  fn test_body_edit_clamps_profile_slot() {
    let mut flow = Flow::new("f");
    let s1 = flow.add_step(content("Hi {{1}} your code is {{2}} {{3}}", &[]));
    flow.set_profile_name(&s1, true, 3).unwrap();

    flow.set_message_body(&s1, "Hi {{1}}").unwrap();
    let step = flow.step(&s1).unwrap();
    assert!(step.use_profile_name);
    assert_eq!(step.profile_name_slot, 1);

    flow.set_message_body(&s1, "Hi there").unwrap();
    assert!(!flow.step(&s1).unwrap().use_profile_name);
  }

  #[test]
  fn test_set_audience_blank_clears() {
    let mut flow = Flow::new("f");
    let s1 = flow.add_step(content("q", &[]));
    flow
      .set_audience(&s1, Some("vip".to_string()), Some("  ".to_string()))
      .unwrap();
    let step = flow.step(&s1).unwrap();
    assert_eq!(step.required_tag.as_deref(), Some("vip"));
    assert_eq!(step.required_source, None);
  }

  #[test]
  fn test_unknown_step_edits_fail() {
    let mut flow = Flow::new("f");
    let ghost = StepId::from("ghost");
    assert_eq!(
      flow.move_step(&ghost, Position::default()),
      Err(GraphError::StepNotFound("ghost".to_string()))
    );
  }
}
