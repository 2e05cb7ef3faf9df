//! Behavioural tests for the layered layout.

use ctaflow_layout::{
  Direction, LayeredLayout, LayoutConfig, LayoutEdge, LayoutNode, LayoutStrategy, Position, Size,
};

fn nodes(ids: &[&str]) -> Vec<LayoutNode> {
  ids.iter().map(|id| LayoutNode::new(*id)).collect()
}

fn edges(pairs: &[(&str, &str)]) -> Vec<LayoutEdge> {
  pairs.iter().map(|(a, b)| LayoutEdge::new(*a, *b)).collect()
}

fn overlaps(a: Position, b: Position, size: Size) -> bool {
  a.x < b.x + size.width && b.x < a.x + size.width && a.y < b.y + size.height && b.y < a.y + size.height
}

#[test]
fn test_empty_graph_yields_empty_layout() {
  let layout = LayeredLayout::default();
  assert!(layout.arrange(&[], &[], Direction::LeftRight).is_empty());
}

#[test]
fn test_layout_is_deterministic() {
  let layout = LayeredLayout::default();
  let n = nodes(&["welcome", "yes", "no", "followup", "bye"]);
  let e = edges(&[
    ("welcome", "yes"),
    ("welcome", "no"),
    ("yes", "followup"),
    ("no", "bye"),
    ("followup", "bye"),
  ]);

  let first = layout.arrange(&n, &e, Direction::TopBottom);
  let second = layout.arrange(&n, &e, Direction::TopBottom);
  assert_eq!(first, second);
  assert_eq!(layout.ranks(&n, &e), layout.ranks(&n, &e));
  assert_eq!(layout.ranks(&n, &e), vec![0, 1, 1, 2, 3]);
}

#[test]
fn test_cycle_terminates_with_finite_positions() {
  let layout = LayeredLayout::default();
  let n = nodes(&["a", "b"]);
  let e = edges(&[("a", "b"), ("b", "a")]);

  let positions = layout.arrange(&n, &e, Direction::LeftRight);
  assert_eq!(positions.len(), 2);
  assert!(positions.iter().all(Position::is_finite));
  assert_eq!(layout.ranks(&n, &e), vec![0, 1]);
}

#[test]
fn test_disconnected_components_do_not_overlap() {
  let layout = LayeredLayout::default();
  let n = nodes(&["a", "b", "c", "d", "lonely"]);
  let e = edges(&[("a", "b"), ("c", "d")]);
  let size = Size::new(260.0, 140.0);

  for direction in [Direction::LeftRight, Direction::TopBottom] {
    let positions = layout.arrange(&n, &e, direction);
    for i in 0..positions.len() {
      for j in (i + 1)..positions.len() {
        assert!(
          !overlaps(positions[i], positions[j], size),
          "nodes {} and {} overlap in {}",
          i,
          j,
          direction
        );
      }
    }
  }
}

#[test]
fn test_siblings_are_spaced_along_cross_axis() {
  let layout = LayeredLayout::default();
  let n = nodes(&["root", "left", "right"]);
  let e = edges(&[("root", "left"), ("root", "right")]);

  let positions = layout.arrange(&n, &e, Direction::TopBottom);
  assert_eq!(positions[1].y, positions[2].y);
  // 260 width + 50 node spacing
  assert_eq!((positions[2].x - positions[1].x).abs(), 310.0);
}

#[test]
fn test_measured_sizes_override_default_footprint() {
  let layout = LayeredLayout::new(LayoutConfig {
    rank_spacing: 10.0,
    ..LayoutConfig::default()
  });
  let n = vec![
    LayoutNode::new("a").with_size(Size::new(100.0, 40.0)),
    LayoutNode::new("b").with_size(Size::new(100.0, 40.0)),
  ];
  let e = edges(&[("a", "b")]);

  let positions = layout.arrange(&n, &e, Direction::LeftRight);
  assert_eq!(positions[1].x - positions[0].x, 110.0);
}

#[test]
fn test_back_edge_does_not_reorder_ranks() {
  let layout = LayeredLayout::default();
  let n = nodes(&["start", "ask", "confirm"]);
  let e = edges(&[("start", "ask"), ("ask", "confirm"), ("confirm", "ask")]);
  assert_eq!(layout.ranks(&n, &e), vec![0, 1, 2]);
}
