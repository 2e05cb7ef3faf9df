//! Graph-level behaviour: connection rules, cascade delete, warnings, layout.

use ctaflow_config::{Direction, TemplateButtonDef, TemplateDef, TemplateType};
use ctaflow_graph::{
  ButtonSpec, ConnectionRejected, Flow, FlowWarning, Position, StepContent, StepId,
};
use ctaflow_layout::LayeredLayout;

fn content(buttons: &[&str]) -> StepContent {
  StepContent {
    template_name: "promo".to_string(),
    template_type: TemplateType::Text,
    message_body: "Hello {{1}}".to_string(),
    buttons: buttons.iter().map(|b| ButtonSpec::quick_reply(*b)).collect(),
  }
}

#[test]
fn test_yes_no_scenario() {
  let mut flow = Flow::new("Diwali");
  let s1 = flow.add_step(content(&["Yes", "No"]));
  let s2 = flow.add_step(content(&[]));
  let s3 = flow.add_step(content(&[]));

  flow.add_transition(&s1, "Yes", &s2).unwrap();
  assert_eq!(flow.transitions.len(), 1);
  let edge = &flow.transitions[0];
  assert_eq!(edge.source, s1);
  assert_eq!(edge.source_handle, "Yes");
  assert_eq!(edge.target, s2);

  let rejected = flow.add_transition(&s1, "Yes", &s3);
  assert!(matches!(rejected, Err(ConnectionRejected::DuplicateHandle { .. })));
  assert_eq!(flow.transitions.len(), 1);

  flow.add_transition(&s1, "No", &s3).unwrap();
  assert_eq!(flow.transitions.len(), 2);
}

#[test]
fn test_unknown_label_does_not_claim_another_buttons_handle() {
  let mut flow = Flow::new("f");
  let s1 = flow.add_step(content(&["Yes", "No"]));
  let s2 = flow.add_step(content(&[]));
  let s3 = flow.add_step(content(&[]));
  let s4 = flow.add_step(content(&[]));

  flow.add_transition(&s1, "Yes", &s2).unwrap();
  flow.add_transition(&s1, "Custom", &s3).unwrap();
  let no = flow.add_transition(&s1, "No", &s4).unwrap();

  assert_eq!(flow.transitions.len(), 3);
  let step = flow.step(&s1).unwrap();
  assert_eq!(flow.transition(&no).unwrap().button_id.as_ref(), Some(&step.buttons[1].id));
  assert_eq!(step.buttons[1].target_node_id.as_ref(), Some(&s4));
}

#[test]
fn test_no_duplicate_outgoing_edges_under_repeated_connects() {
  let mut flow = Flow::new("f");
  let hub = flow.add_step(content(&["A", "B", "C"]));
  let targets: Vec<StepId> = (0..4).map(|_| flow.add_step(content(&[]))).collect();

  for target in &targets {
    for handle in ["A", "B", "C", "a ", "Other"] {
      let _ = flow.add_transition(&hub, handle, target);
    }
  }

  let mut seen = std::collections::HashSet::new();
  for transition in &flow.transitions {
    let key = (
      transition.source.clone(),
      transition.button_id.clone(),
      transition.source_handle.trim().to_lowercase(),
    );
    assert!(seen.insert(key));
  }
  let bound: Vec<_> = flow.transitions.iter().filter_map(|t| t.button_id.clone()).collect();
  let unique: std::collections::HashSet<_> = bound.iter().collect();
  assert_eq!(bound.len(), unique.len());
}

#[test]
fn test_remove_step_cascades_and_is_idempotent() {
  let mut flow = Flow::new("f");
  let s1 = flow.add_step(content(&["Go"]));
  let s2 = flow.add_step(content(&["Back"]));
  let s3 = flow.add_step(content(&[]));
  flow.add_transition(&s1, "Go", &s2).unwrap();
  flow.add_transition(&s2, "Back", &s1).unwrap();
  flow.add_transition(&s2, "Other", &s3).unwrap();

  assert_eq!(flow.transitions.len(), 3);

  assert!(flow.remove_step(&s2));
  assert!(flow.transitions.is_empty());
  let snapshot = flow.clone();

  assert!(!flow.remove_step(&s2));
  assert_eq!(flow, snapshot);

  for t in &flow.transitions {
    assert!(flow.step(&t.source).is_some() && flow.step(&t.target).is_some());
  }
}

#[test]
fn test_incoming_warnings_flag_unreachable_steps() {
  let mut flow = Flow::new("f");
  let s1 = flow.add_step(content(&["Next"]));
  let s2 = flow.add_step(content(&[]));
  let s3 = flow.add_step(content(&[]));
  flow.add_transition(&s1, "Next", &s2).unwrap();

  let incoming = flow.derive_incoming_warnings();
  let flags: Vec<bool> = incoming.iter().map(|w| w.has_no_incoming).collect();
  assert_eq!(flags, vec![true, false, true]);

  let warnings = flow.warnings();
  assert!(warnings.contains(&FlowWarning::Unreachable { step_id: s3 }));
  assert!(!warnings.contains(&FlowWarning::Unreachable { step_id: s2 }));
}

#[test]
fn test_profile_name_slot_clamped_to_placeholders() {
  let mut flow = Flow::new("f");
  let step = flow.add_step(StepContent {
    message_body: "Hi {{1}}, your order {{2}} is ready".to_string(),
    ..content(&[])
  });

  flow.set_profile_name(&step, true, 5).unwrap();
  assert_eq!(flow.step(&step).unwrap().profile_name_slot, 2);

  flow.set_message_body(&step, "Your order is ready").unwrap();
  let s = flow.step(&step).unwrap();
  assert!(!s.use_profile_name);
}

#[test]
fn test_with_layout_only_moves_steps() {
  let mut flow = Flow::new("f");
  let s1 = flow.add_step(content(&["Yes"]));
  let s2 = flow.add_step(content(&[]));
  flow.add_transition(&s1, "Yes", &s2).unwrap();

  let laid_out = flow.with_layout(&LayeredLayout::default(), Direction::LeftRight);

  assert_eq!(laid_out.steps.len(), flow.steps.len());
  assert_eq!(laid_out.transitions, flow.transitions);
  for (before, after) in flow.steps.iter().zip(&laid_out.steps) {
    assert_eq!(before.id, after.id);
    assert_eq!(before.buttons, after.buttons);
    assert_eq!(before.message_body, after.message_body);
  }
  assert_eq!(laid_out.step(&s1).unwrap().position, Position::new(20.0, 20.0));
  assert_eq!(laid_out.step(&s2).unwrap().position, Position::new(370.0, 20.0));
  // The source flow is untouched.
  assert_eq!(flow.step(&s1).unwrap().position, Position::new(120.0, 150.0));
}

#[test]
fn test_step_content_from_template() {
  let template = TemplateDef {
    name: "diwali_offer".to_string(),
    template_type: TemplateType::Image,
    body: "Hi {{1}}, 20% off today".to_string(),
    buttons: vec![TemplateButtonDef {
      text: "Shop now".to_string(),
      button_type: "QUICK_REPLY".to_string(),
      sub_type: None,
      value: None,
    }],
  };

  let mut flow = Flow::new("f");
  let id = flow.add_step(StepContent::from_template(&template));
  let step = flow.step(&id).unwrap();
  assert_eq!(step.template_name, "diwali_offer");
  assert_eq!(step.template_type, TemplateType::Image);
  assert_eq!(step.trigger_button_text.as_deref(), Some("Shop now"));
}

#[test]
fn test_button_may_lead_back_to_its_own_step() {
  let mut flow = Flow::new("f");
  let s1 = flow.add_step(content(&["Try again", "Done"]));
  let s2 = flow.add_step(content(&[]));

  flow.add_transition(&s1, "Try again", &s1).unwrap();
  assert!(matches!(
    flow.add_transition(&s1, "Try again", &s2),
    Err(ConnectionRejected::DuplicateHandle { .. })
  ));
  flow.add_transition(&s1, "Done", &s2).unwrap();
  assert_eq!(flow.transitions.len(), 2);
}
