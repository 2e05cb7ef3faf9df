//! Connection rules.
//!
//! A transition may be added only if it names a source step and a source
//! button, and that button does not already lead somewhere. The checks are
//! pure and total: malformed candidates are rejected, never panicked on.

use crate::error::ConnectionRejected;
use crate::transition::Transition;

/// Check a candidate transition against the existing set.
pub fn check(candidate: &Transition, existing: &[Transition]) -> Result<(), ConnectionRejected> {
  if candidate.source.as_str().trim().is_empty() {
    return Err(ConnectionRejected::MissingSource);
  }
  if candidate.source_handle.trim().is_empty() {
    return Err(ConnectionRejected::MissingHandle);
  }
  if existing.iter().any(|t| t.shares_handle_with(candidate)) {
    return Err(ConnectionRejected::DuplicateHandle {
      step: candidate.source.to_string(),
      handle: candidate.source_handle.clone(),
    });
  }
  Ok(())
}

/// Boolean form of [`check`].
pub fn is_valid(candidate: &Transition, existing: &[Transition]) -> bool {
  check(candidate, existing).is_ok()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ids::{ButtonId, StepId};

  fn edge(source: &str, handle: &str, target: &str) -> Transition {
    Transition::new(StepId::from(source), handle, StepId::from(target))
  }

  #[test]
  fn test_rejects_missing_source_or_handle() {
    assert_eq!(
      check(&edge("", "Yes", "s2"), &[]),
      Err(ConnectionRejected::MissingSource)
    );
    assert_eq!(
      check(&edge("s1", "  ", "s2"), &[]),
      Err(ConnectionRejected::MissingHandle)
    );
  }

  #[test]
  fn test_rejects_second_edge_from_same_handle() {
    let existing = vec![edge("s1", "Yes", "s2")];
    assert!(!is_valid(&edge("s1", "Yes", "s3"), &existing));
    assert!(!is_valid(&edge("s1", " yes ", "s3"), &existing));
    assert!(is_valid(&edge("s1", "No", "s3"), &existing));
    assert!(is_valid(&edge("s2", "Yes", "s3"), &existing));
  }

  #[test]
  fn test_same_button_or_same_label_is_a_duplicate() {
    let button = ButtonId::from("b1");
    let existing = vec![edge("s1", "Old label", "s2").with_button(button.clone())];

    assert!(!is_valid(&edge("s1", "New label", "s3").with_button(button), &existing));
    assert!(!is_valid(&edge("s1", "Old label", "s3").with_button(ButtonId::from("b2")), &existing));
    assert!(!is_valid(&edge("s1", "old label", "s3"), &existing));
    assert!(is_valid(&edge("s1", "Other", "s3").with_button(ButtonId::from("b2")), &existing));
  }

  #[test]
  fn test_unbound_edges_compare_by_label_only() {
    let existing = vec![edge("s1", "Custom", "s2")];
    assert!(is_valid(&edge("s1", "No", "s3").with_button(ButtonId::from("b2")), &existing));
  }
}
