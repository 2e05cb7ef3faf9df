//! ctaflow Layout
//!
//! Automatic arrangement of flow steps on the canvas.
//!
//! The editor talks to layout through the [`LayoutStrategy`] trait so the
//! algorithm can be swapped or tested without a rendering library. The
//! bundled [`LayeredLayout`] is a Sugiyama-style hierarchical layout:
//!
//! 1. Split the graph into weakly connected components.
//! 2. Break cycles by ignoring DFS back edges.
//! 3. Rank nodes by longest path from the sources.
//! 4. Order nodes within ranks with barycenter sweeps.
//! 5. Assign coordinates at fixed rank/node spacing and pack components
//!    side by side along the cross axis.
//!
//! The output is deterministic: the same nodes, edges and direction always
//! produce the same positions.

mod geometry;
mod layered;
mod strategy;

pub use ctaflow_config::{Direction, LayoutConfig};
pub use geometry::{Position, Size};
pub use layered::LayeredLayout;
pub use strategy::{LayoutEdge, LayoutNode, LayoutStrategy};
