use ctaflow_config::Direction;

use crate::geometry::{Position, Size};

/// A node handed to a layout strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
  pub id: String,
  /// `None` until the renderer has measured the node; strategies fall back
  /// to their default footprint.
  pub size: Option<Size>,
}

impl LayoutNode {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      size: None,
    }
  }

  pub fn with_size(mut self, size: Size) -> Self {
    self.size = Some(size);
    self
  }
}

/// A directed connection between two layout nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEdge {
  pub source: String,
  pub target: String,
}

impl LayoutEdge {
  pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
    Self {
      source: source.into(),
      target: target.into(),
    }
  }
}

/// Computes canvas positions for a node set.
///
/// Implementations must be pure and total: they never mutate their input,
/// return exactly one finite position per node (in input order), tolerate
/// cycles and edges that reference unknown nodes, and return an empty
/// vector for an empty node set.
pub trait LayoutStrategy: Send + Sync {
  fn arrange(&self, nodes: &[LayoutNode], edges: &[LayoutEdge], direction: Direction)
  -> Vec<Position>;
}
