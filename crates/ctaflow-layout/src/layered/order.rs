//! Crossing reduction within ranks (barycenter heuristic).

use std::cmp::Ordering;

/// Ordering state: the node indices in each rank, top to bottom.
pub(super) type RankOrder = Vec<Vec<usize>>;

/// Bucket component members by rank, keeping input order inside each rank.
pub(super) fn initial_order(members: &[usize], ranks: &[usize]) -> RankOrder {
  let depth = members.iter().map(|&n| ranks[n]).max().map_or(0, |r| r + 1);
  let mut order: RankOrder = vec![Vec::new(); depth];
  for &node in members {
    order[ranks[node]].push(node);
  }
  order
}

/// Run `iterations` down+up barycenter sweeps and keep the ordering with
/// the fewest crossings between adjacent ranks.
pub(super) fn reduce_crossings(
  mut order: RankOrder,
  successors: &[Vec<usize>],
  predecessors: &[Vec<usize>],
  ranks: &[usize],
  iterations: usize,
) -> RankOrder {
  let mut slot = vec![0usize; ranks.len()];
  refresh_slots(&order, &mut slot);

  let mut best = order.clone();
  let mut best_crossings = count_crossings(&order, successors, ranks, &slot);

  for _ in 0..iterations {
    if best_crossings == 0 {
      break;
    }

    for r in 1..order.len() {
      sort_by_barycenter(&mut order[r], predecessors, &slot);
      refresh_slots(&order, &mut slot);
    }
    for r in (0..order.len().saturating_sub(1)).rev() {
      sort_by_barycenter(&mut order[r], successors, &slot);
      refresh_slots(&order, &mut slot);
    }

    let crossings = count_crossings(&order, successors, ranks, &slot);
    if crossings < best_crossings {
      best_crossings = crossings;
      best = order.clone();
    }
  }

  best
}

fn refresh_slots(order: &RankOrder, slot: &mut [usize]) {
  for rank in order {
    for (i, &node) in rank.iter().enumerate() {
      slot[node] = i;
    }
  }
}

/// Reorder one rank by the mean slot of each node's neighbours.
///
/// Nodes without neighbours keep their current slot as their key, and ties
/// fall back to the current slot, so the sort is stable and deterministic.
fn sort_by_barycenter(rank: &mut [usize], neighbours: &[Vec<usize>], slot: &[usize]) {
  let mut keyed: Vec<(f64, usize, usize)> = rank
    .iter()
    .map(|&node| {
      let adjacent = &neighbours[node];
      let key = if adjacent.is_empty() {
        slot[node] as f64
      } else {
        adjacent.iter().map(|&n| slot[n] as f64).sum::<f64>() / adjacent.len() as f64
      };
      (key, slot[node], node)
    })
    .collect();

  keyed.sort_by(|a, b| {
    a.0
      .partial_cmp(&b.0)
      .unwrap_or(Ordering::Equal)
      .then(a.1.cmp(&b.1))
  });

  for (target, (_, _, node)) in rank.iter_mut().zip(keyed) {
    *target = node;
  }
}

/// Count pairwise crossings among edges that join adjacent ranks.
pub(super) fn count_crossings(
  order: &RankOrder,
  successors: &[Vec<usize>],
  ranks: &[usize],
  slot: &[usize],
) -> usize {
  let mut total = 0;
  for rank in order {
    let mut segments: Vec<(usize, usize)> = Vec::new();
    for &node in rank {
      for &next in &successors[node] {
        if ranks[next] == ranks[node] + 1 {
          segments.push((slot[node], slot[next]));
        }
      }
    }
    for i in 0..segments.len() {
      for j in (i + 1)..segments.len() {
        let (a, b) = (segments[i], segments[j]);
        if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
          total += 1;
        }
      }
    }
  }
  total
}
