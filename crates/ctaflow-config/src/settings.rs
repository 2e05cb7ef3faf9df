//! Editor configuration file.
//!
//! ```json
//! {
//!   "api": { "base_url": "https://console.example.com/api", "auth_token": "..." },
//!   "layout": { "direction": "TB", "rank_spacing": 90, "node_spacing": 50 },
//!   "seed_positions": { "rows": 5 }
//! }
//! ```
//!
//! Every field is optional; missing fields take the defaults below.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Flow direction of an automatic layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
  /// Ranks advance along x.
  #[default]
  #[serde(rename = "LR", alias = "lr")]
  LeftRight,
  /// Ranks advance along y.
  #[serde(rename = "TB", alias = "tb")]
  TopBottom,
}

impl fmt::Display for Direction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Direction::LeftRight => write!(f, "LR"),
      Direction::TopBottom => write!(f, "TB"),
    }
  }
}

impl FromStr for Direction {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "LR" => Ok(Direction::LeftRight),
      "TB" => Ok(Direction::TopBottom),
      _ => Err(ConfigError::UnknownDirection(s.to_string())),
    }
  }
}

/// Where the flow API lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub auth_token: Option<String>,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8080/api".to_string(),
      auth_token: None,
    }
  }
}

/// Spacing and footprint parameters for the layered layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
  pub direction: Direction,
  /// Gap between consecutive ranks.
  pub rank_spacing: f64,
  /// Gap between neighbouring nodes within a rank, and between packed components.
  pub node_spacing: f64,
  pub margin: f64,
  /// Footprint used for nodes that have not been measured yet.
  pub default_node_width: f64,
  pub default_node_height: f64,
  /// Barycenter sweep iterations (each is one down and one up pass).
  pub ordering_iterations: usize,
}

impl Default for LayoutConfig {
  fn default() -> Self {
    Self {
      direction: Direction::LeftRight,
      rank_spacing: 90.0,
      node_spacing: 50.0,
      margin: 20.0,
      default_node_width: 260.0,
      default_node_height: 140.0,
      ordering_iterations: 4,
    }
  }
}

/// Staggered grid used for steps that arrive without coordinates.
///
/// Step `i` lands at `(origin_x + i * step_x, origin_y + (i % rows) * step_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedPositions {
  pub origin_x: f64,
  pub step_x: f64,
  pub origin_y: f64,
  pub step_y: f64,
  pub rows: usize,
}

impl Default for SeedPositions {
  fn default() -> Self {
    Self {
      origin_x: 120.0,
      step_x: 120.0,
      origin_y: 150.0,
      step_y: 60.0,
      rows: 5,
    }
  }
}

impl SeedPositions {
  pub fn position_for(&self, index: usize) -> (f64, f64) {
    let rows = self.rows.max(1);
    (
      self.origin_x + index as f64 * self.step_x,
      self.origin_y + (index % rows) as f64 * self.step_y,
    )
  }
}

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EditorConfig {
  pub api: ApiConfig,
  pub layout: LayoutConfig,
  pub seed_positions: SeedPositions,
}

impl EditorConfig {
  /// Parse and validate a configuration document.
  pub fn from_json(content: &str) -> Result<Self, ConfigError> {
    let config: EditorConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Read a configuration file.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Self::from_json(&content)
  }

  /// Read a configuration file, using defaults when it does not exist.
  pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
    if path.exists() {
      Self::from_file(path)
    } else {
      Ok(Self::default())
    }
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.api.base_url.trim().is_empty() {
      return Err(ConfigError::invalid("api.base_url", "must not be empty"));
    }

    let spacings = [
      ("layout.rank_spacing", self.layout.rank_spacing),
      ("layout.node_spacing", self.layout.node_spacing),
      ("layout.margin", self.layout.margin),
    ];
    for (field, value) in spacings {
      if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::invalid(field, "must be a non-negative number"));
      }
    }

    let footprint = [
      ("layout.default_node_width", self.layout.default_node_width),
      ("layout.default_node_height", self.layout.default_node_height),
    ];
    for (field, value) in footprint {
      if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::invalid(field, "must be a positive number"));
      }
    }

    if self.seed_positions.rows == 0 {
      return Err(ConfigError::invalid("seed_positions.rows", "must be at least 1"));
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_match_layout_contract() {
    let config = EditorConfig::default();
    assert_eq!(config.layout.rank_spacing, 90.0);
    assert_eq!(config.layout.node_spacing, 50.0);
    assert_eq!(config.layout.margin, 20.0);
    assert_eq!(config.layout.default_node_width, 260.0);
    assert_eq!(config.layout.default_node_height, 140.0);
  }

  #[test]
  fn test_partial_document_takes_defaults() {
    let config = EditorConfig::from_json(r#"{ "layout": { "direction": "TB" } }"#).unwrap();
    assert_eq!(config.layout.direction, Direction::TopBottom);
    assert_eq!(config.layout.rank_spacing, 90.0);
    assert_eq!(config.api, ApiConfig::default());
  }

  #[test]
  fn test_rejects_negative_spacing() {
    let err = EditorConfig::from_json(r#"{ "layout": { "node_spacing": -1 } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "layout.node_spacing"));
  }

  #[test]
  fn test_direction_from_str() {
    assert_eq!("lr".parse::<Direction>().unwrap(), Direction::LeftRight);
    assert_eq!(" TB ".parse::<Direction>().unwrap(), Direction::TopBottom);
    assert!("diagonal".parse::<Direction>().is_err());
  }

  #[test]
  fn test_seed_positions_stagger() {
    let seed = SeedPositions::default();
    assert_eq!(seed.position_for(0), (120.0, 150.0));
    assert_eq!(seed.position_for(1), (240.0, 210.0));
    assert_eq!(seed.position_for(5), (720.0, 150.0));
  }
}
