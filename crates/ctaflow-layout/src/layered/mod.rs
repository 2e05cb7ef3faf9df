//! Hierarchical (layered) layout.

mod order;
mod rank;

use std::collections::{HashMap, VecDeque};

use ctaflow_config::{Direction, LayoutConfig};
use tracing::debug;

use crate::geometry::{Position, Size};
use crate::strategy::{LayoutEdge, LayoutNode, LayoutStrategy};

/// Dense adjacency over node indices.
///
/// Self loops, duplicate edges and edges with unknown endpoints are dropped
/// at construction; none of them influence a layering.
#[derive(Debug, Clone)]
struct IndexGraph {
  successors: Vec<Vec<usize>>,
  neighbours: Vec<Vec<usize>>,
}

impl IndexGraph {
  fn with_len(n: usize) -> Self {
    Self {
      successors: vec![Vec::new(); n],
      neighbours: vec![Vec::new(); n],
    }
  }

  fn build(nodes: &[LayoutNode], edges: &[LayoutEdge]) -> Self {
    let index: HashMap<&str, usize> = nodes
      .iter()
      .enumerate()
      .map(|(i, node)| (node.id.as_str(), i))
      .collect();

    let mut graph = Self::with_len(nodes.len());
    for edge in edges {
      if let (Some(&a), Some(&b)) = (
        index.get(edge.source.as_str()),
        index.get(edge.target.as_str()),
      ) {
        graph.connect(a, b);
      }
    }
    graph
  }

  fn connect(&mut self, a: usize, b: usize) {
    if a == b || self.successors[a].contains(&b) {
      return;
    }
    self.successors[a].push(b);
    self.neighbours[a].push(b);
    self.neighbours[b].push(a);
  }

  fn len(&self) -> usize {
    self.successors.len()
  }

  /// Weakly connected components, ordered by their first node in input
  /// order. Members are sorted ascending.
  fn components(&self) -> Vec<Vec<usize>> {
    let mut seen = vec![false; self.len()];
    let mut components = Vec::new();

    for start in 0..self.len() {
      if seen[start] {
        continue;
      }
      seen[start] = true;
      let mut members = vec![start];
      let mut queue = VecDeque::from([start]);
      while let Some(node) = queue.pop_front() {
        for &next in &self.neighbours[node] {
          if !seen[next] {
            seen[next] = true;
            members.push(next);
            queue.push_back(next);
          }
        }
      }
      members.sort_unstable();
      components.push(members);
    }

    components
  }
}

/// Per-component result before packing.
struct ComponentLayout {
  members: Vec<usize>,
  /// (rank-axis offset, cross-axis offset) relative to the component origin.
  offsets: Vec<(f64, f64)>,
  cross_extent: f64,
}

/// Sugiyama-style layered layout with fixed spacing.
#[derive(Debug, Clone, Default)]
pub struct LayeredLayout {
  config: LayoutConfig,
}

impl LayeredLayout {
  pub fn new(config: LayoutConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &LayoutConfig {
    &self.config
  }

  /// Rank of each node (in input order) after cycle breaking.
  ///
  /// Exposed so callers can inspect the layering independently of
  /// coordinates.
  pub fn ranks(&self, nodes: &[LayoutNode], edges: &[LayoutEdge]) -> Vec<usize> {
    let graph = IndexGraph::build(nodes, edges);
    let mut ranks = vec![0usize; graph.len()];
    for members in graph.components() {
      let forward = rank::acyclic_successors(&graph, &members);
      rank::assign_ranks(&forward, &members, &mut ranks);
    }
    ranks
  }

  fn size_of(&self, node: &LayoutNode) -> Size {
    node
      .size
      .filter(|s| s.width.is_finite() && s.height.is_finite() && s.width > 0.0 && s.height > 0.0)
      .unwrap_or(Size::new(
        self.config.default_node_width,
        self.config.default_node_height,
      ))
  }

  fn layout_component(
    &self,
    graph: &IndexGraph,
    members: Vec<usize>,
    sizes: &[Size],
    direction: Direction,
    ranks: &mut [usize],
  ) -> ComponentLayout {
    let forward = rank::acyclic_successors(graph, &members);
    rank::assign_ranks(&forward, &members, ranks);

    let mut backward: Vec<Vec<usize>> = vec![Vec::new(); graph.len()];
    for &node in &members {
      for &next in &forward[node] {
        backward[next].push(node);
      }
    }

    let order = order::reduce_crossings(
      order::initial_order(&members, ranks),
      &forward,
      &backward,
      ranks,
      self.config.ordering_iterations,
    );

    // Extent of a node along the rank axis and along the cross axis.
    let extents = |node: usize| -> (f64, f64) {
      let size = sizes[node];
      match direction {
        Direction::LeftRight => (size.width, size.height),
        Direction::TopBottom => (size.height, size.width),
      }
    };

    let rank_lengths: Vec<f64> = order
      .iter()
      .map(|rank| {
        let total: f64 = rank.iter().map(|&n| extents(n).1).sum();
        total + self.config.node_spacing * rank.len().saturating_sub(1) as f64
      })
      .collect();
    let cross_extent = rank_lengths.iter().copied().fold(0.0, f64::max);

    let mut offsets = vec![(0.0, 0.0); graph.len()];
    let mut rank_offset = 0.0;
    for (rank, length) in order.iter().zip(&rank_lengths) {
      let thickness = rank.iter().map(|&n| extents(n).0).fold(0.0, f64::max);
      let mut cross = (cross_extent - length) / 2.0;
      for &node in rank {
        offsets[node] = (rank_offset, cross);
        cross += extents(node).1 + self.config.node_spacing;
      }
      rank_offset += thickness + self.config.rank_spacing;
    }

    ComponentLayout {
      offsets: members.iter().map(|&n| offsets[n]).collect(),
      members,
      cross_extent,
    }
  }
}

impl LayoutStrategy for LayeredLayout {
  fn arrange(
    &self,
    nodes: &[LayoutNode],
    edges: &[LayoutEdge],
    direction: Direction,
  ) -> Vec<Position> {
    if nodes.is_empty() {
      return Vec::new();
    }

    let graph = IndexGraph::build(nodes, edges);
    let sizes: Vec<Size> = nodes.iter().map(|n| self.size_of(n)).collect();
    let mut ranks = vec![0usize; nodes.len()];
    let mut positions = vec![Position::default(); nodes.len()];

    let margin = self.config.margin;
    let mut cross_origin = margin;
    let components = graph.components();
    let component_count = components.len();

    for members in components {
      let component = self.layout_component(&graph, members, &sizes, direction, &mut ranks);
      for (&node, &(along, across)) in component.members.iter().zip(&component.offsets) {
        positions[node] = match direction {
          Direction::LeftRight => Position::new(margin + along, cross_origin + across),
          Direction::TopBottom => Position::new(cross_origin + across, margin + along),
        };
      }
      cross_origin += component.cross_extent + self.config.node_spacing;
    }

    debug!(
      nodes = nodes.len(),
      components = component_count,
      direction = %direction,
      "layered layout computed"
    );

    positions
  }
}
