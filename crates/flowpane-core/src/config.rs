//! Tunable interaction settings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Wheel delta that changes the scale by 1.0.
pub const DEFAULT_SCROLL_DIVISOR: f64 = 600.0;
/// Resize grab margin in unscaled pixels.
pub const DEFAULT_EDGE_THRESHOLD: f64 = 10.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings shared by the viewport and the shape controllers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Wheel sensitivity; `Scale` receives `delta_y / scroll_divisor`.
    pub scroll_divisor: f64,
    /// Base edge grab margin, multiplied by the current scale.
    pub edge_threshold: f64,
    /// Recenter the origin under the container's midpoint once it is attached.
    pub center_on_attach: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            scroll_divisor: DEFAULT_SCROLL_DIVISOR,
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            center_on_attach: true,
        }
    }
}

impl ViewportConfig {
    /// Parse and validate a config from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.scroll_divisor.is_finite() || self.scroll_divisor <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "scroll_divisor must be positive, got {}",
                self.scroll_divisor
            )));
        }
        if !self.edge_threshold.is_finite() || self.edge_threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "edge_threshold must be non-negative, got {}",
                self.edge_threshold
            )));
        }
        Ok(())
    }
}
