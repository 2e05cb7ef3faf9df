use serde::{Deserialize, Serialize};

/// Top-left corner of a node on the canvas, in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

impl Position {
  pub fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }

  pub fn is_finite(&self) -> bool {
    self.x.is_finite() && self.y.is_finite()
  }
}

/// Measured footprint of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
  pub width: f64,
  pub height: f64,
}

impl Size {
  pub fn new(width: f64, height: f64) -> Self {
    Self { width, height }
  }
}
