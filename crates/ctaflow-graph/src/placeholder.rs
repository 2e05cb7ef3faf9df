//! `{{n}}` body placeholders and the profile-name slot rule.

use std::collections::BTreeSet;

/// Number of distinct numbered placeholders (`{{1}}`, `{{ 2 }}`, ...) in a
/// message body. Repeated uses of the same number count once.
pub fn placeholder_count(body: &str) -> usize {
  let mut seen = BTreeSet::new();
  let mut rest = body;

  while let Some(start) = rest.find("{{") {
    let after = &rest[start + 2..];
    let Some(end) = after.find("}}") else {
      break;
    };
    let inner = after[..end].trim();
    if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
      seen.insert(inner.trim_start_matches('0').to_string());
      rest = &after[end + 2..];
    } else {
      // Not a numbered placeholder; rescan from the next character.
      rest = &rest[start + 1..];
    }
  }

  seen.len()
}

/// Apply the profile-name invariant for a body with `count` placeholders.
///
/// With no placeholders the feature is forced off and the slot resets to 1;
/// otherwise the slot is clamped into `[1, count]`.
pub fn clamp_profile_name(use_profile_name: bool, slot: u32, count: usize) -> (bool, u32) {
  if count == 0 {
    return (false, 1);
  }
  let max = u32::try_from(count).unwrap_or(u32::MAX);
  (use_profile_name, slot.clamp(1, max))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_counts_distinct_placeholders() {
    assert_eq!(placeholder_count("Hi {{1}}, order {{2}} ships {{1}}"), 2);
    assert_eq!(placeholder_count("Hello {{ 3 }}"), 1);
    assert_eq!(placeholder_count("no placeholders"), 0);
    assert_eq!(placeholder_count("{{name}} and {{1}}"), 1);
    assert_eq!(placeholder_count("broken {{1"), 0);
    assert_eq!(placeholder_count("{{{1}}}"), 1);
  }

  #[test]
  fn test_clamp_slot_into_range() {
    assert_eq!(clamp_profile_name(true, 5, 2), (true, 2));
    assert_eq!(clamp_profile_name(true, 0, 2), (true, 1));
    assert_eq!(clamp_profile_name(false, 2, 3), (false, 2));
  }

  #[test]
  fn test_zero_placeholders_clear_flag() {
    assert_eq!(clamp_profile_name(true, 2, 0), (false, 1));
  }
}
