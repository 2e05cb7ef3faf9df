//! Cycle breaking and longest-path layering.

use std::collections::VecDeque;

use super::IndexGraph;

/// Remove DFS back edges from the component so it becomes acyclic.
///
/// Returns the forward adjacency (node -> successors) restricted to the
/// component. Traversal visits members and successors in input order, so
/// the set of dropped edges is deterministic.
pub(super) fn acyclic_successors(graph: &IndexGraph, members: &[usize]) -> Vec<Vec<usize>> {
  const WHITE: u8 = 0;
  const GRAY: u8 = 1;
  const BLACK: u8 = 2;

  let mut color = vec![WHITE; graph.len()];
  let mut forward: Vec<Vec<usize>> = vec![Vec::new(); graph.len()];

  for &root in members {
    if color[root] != WHITE {
      continue;
    }

    // Explicit stack of (node, next successor slot) to avoid recursion.
    let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
    color[root] = GRAY;

    while let Some(top) = stack.last_mut() {
      let (node, slot) = *top;
      if let Some(&next) = graph.successors[node].get(slot) {
        top.1 += 1;
        match color[next] {
          WHITE => {
            forward[node].push(next);
            color[next] = GRAY;
            stack.push((next, 0));
          }
          GRAY => {
            // Back edge: ignored for ranking.
          }
          _ => forward[node].push(next),
        }
      } else {
        color[node] = BLACK;
        stack.pop();
      }
    }
  }

  forward
}

/// Longest-path ranks over an acyclic adjacency. Sources get rank 0.
///
/// Ranks are written into `ranks` for component members only.
pub(super) fn assign_ranks(forward: &[Vec<usize>], members: &[usize], ranks: &mut [usize]) {
  let mut in_degree = vec![0usize; forward.len()];
  for &node in members {
    for &next in &forward[node] {
      in_degree[next] += 1;
    }
  }

  let mut queue: VecDeque<usize> = members
    .iter()
    .copied()
    .filter(|&node| in_degree[node] == 0)
    .collect();
  for &node in members {
    ranks[node] = 0;
  }

  while let Some(node) = queue.pop_front() {
    for &next in &forward[node] {
      ranks[next] = ranks[next].max(ranks[node] + 1);
      in_degree[next] -= 1;
      if in_degree[next] == 0 {
        queue.push_back(next);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn graph(n: usize, edges: &[(usize, usize)]) -> IndexGraph {
    let mut graph = IndexGraph::with_len(n);
    for &(a, b) in edges {
      graph.connect(a, b);
    }
    graph
  }

  #[test]
  fn test_back_edge_is_dropped() {
    let g = graph(2, &[(0, 1), (1, 0)]);
    let forward = acyclic_successors(&g, &[0, 1]);
    assert_eq!(forward[0], vec![1]);
    assert!(forward[1].is_empty());
  }

  #[test]
  fn test_longest_path_wins() {
    // 0 -> 1 -> 2 and 0 -> 2: node 2 sits at rank 2, not 1.
    let g = graph(3, &[(0, 1), (1, 2), (0, 2)]);
    let forward = acyclic_successors(&g, &[0, 1, 2]);
    let mut ranks = vec![0; 3];
    assign_ranks(&forward, &[0, 1, 2], &mut ranks);
    assert_eq!(ranks, vec![0, 1, 2]);
  }

  #[test]
  fn test_three_cycle_terminates() {
    let g = graph(3, &[(0, 1), (1, 2), (2, 0)]);
    let forward = acyclic_successors(&g, &[0, 1, 2]);
    let mut ranks = vec![0; 3];
    assign_ranks(&forward, &[0, 1, 2], &mut ranks);
    assert_eq!(ranks, vec![0, 1, 2]);
  }
}
