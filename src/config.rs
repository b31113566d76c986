//! Session configuration.

use crate::error::ConfigError;
use crate::model::parse_color;
use serde::{Deserialize, Serialize};
use slint::Color;

/// Default click and hover radius in pixels.
pub const DEFAULT_THRESHOLD: f32 = 20.0;
/// Default spatial grid cell side in pixels.
pub const DEFAULT_CELL_SIZE: f32 = 50.0;
/// Connection count that triggers `on_complete` with the default policy.
pub const DEFAULT_COMPLETION_COUNT: usize = 3;

/// When the drawing engine reports a finished exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Fire after every successful connection once at least `n` exist.
    ConnectionCount(usize),
    /// Fire when every rule is completed and no forbidden wire is present.
    AllRulesComplete,
    /// Never fire.
    Never,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self::ConnectionCount(DEFAULT_COMPLETION_COUNT)
    }
}

/// Configuration of a wiring session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WiringConfig {
    /// Radius for confirming a click on a terminal
    pub click_threshold: f32,
    /// Radius for hover highlighting
    pub hover_threshold: f32,
    /// Side of a spatial grid cell; tuning only
    pub cell_size: f32,
    pub completion: CompletionPolicy,
    /// Count entries marked optional when deciding whether a rule is completed
    pub count_optional_requirements: bool,
    /// Color of newly drawn wires, `#rrggbb` or `#rrggbbaa`
    pub wire_color: String,
}

impl Default for WiringConfig {
    fn default() -> Self {
        Self {
            click_threshold: DEFAULT_THRESHOLD,
            hover_threshold: DEFAULT_THRESHOLD,
            cell_size: DEFAULT_CELL_SIZE,
            completion: CompletionPolicy::default(),
            count_optional_requirements: true,
            wire_color: "#ffcc33".to_string(),
        }
    }
}

impl WiringConfig {
    /// Parse and validate a JSON configuration. Missing keys take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: WiringConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        for (name, value) in [
            ("click_threshold", self.click_threshold),
            ("hover_threshold", self.hover_threshold),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidThreshold { name, value });
            }
        }
        self.wire_color()?;
        Ok(())
    }

    pub fn wire_color(&self) -> Result<Color, ConfigError> {
        Ok(parse_color(&self.wire_color)?)
    }
}
