//! Client tuning, loadable from TOML.
//!
//! ```toml
//! player_speed = 10.0
//! frame_interval_ms = 16
//!
//! [viewport]
//! canvas_width = 1600.0
//! canvas_height = 900.0
//! margin = 0.1
//!
//! [aim]
//! max_range_cells = 5.0
//!
//! [grenade]
//! paint_delay_ms = 100
//! ```
//!
//! Every field is optional; missing fields keep their default.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tilewar_shared::PLAYER_SPEED;

use crate::error::ConfigError;

/// Virtual canvas the map is drawn on.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Canvas width in pixels.
    pub canvas_width: f64,
    /// Canvas height in pixels.
    pub canvas_height: f64,
    /// Share of each axis reserved left of and above the map.
    pub margin: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1600.0,
            canvas_height: 900.0,
            margin: 0.1,
        }
    }
}

/// Aim range and aim line tuning.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AimConfig {
    /// Range growth in cells per second of holding.
    pub range_growth_cells: f64,
    /// Range at the moment the trigger is pressed, in cells.
    pub base_range_cells: f64,
    /// Range cap in cells.
    pub max_range_cells: f64,
    /// Length of the aim line in cells.
    pub line_length: f64,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            range_growth_cells: 1.0,
            base_range_cells: 2.0,
            max_range_cells: 5.0,
            line_length: 0.4,
        }
    }
}

/// Grenade effect timings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GrenadeConfig {
    /// Delay between release and the terrain paint.
    pub paint_delay_ms: u64,
    /// How long a release stays visible.
    pub release_display_ms: u64,
}

impl GrenadeConfig {
    /// Paint delay as a duration.
    #[must_use]
    pub const fn paint_delay(&self) -> Duration {
        Duration::from_millis(self.paint_delay_ms)
    }

    /// Release display time as a duration.
    #[must_use]
    pub const fn release_display(&self) -> Duration {
        Duration::from_millis(self.release_display_ms)
    }
}

impl Default for GrenadeConfig {
    fn default() -> Self {
        Self {
            paint_delay_ms: 100,
            release_display_ms: 600,
        }
    }
}

/// Client configuration.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Movement speed in cells per second.
    pub player_speed: f64,
    /// Driver tick period.
    pub frame_interval_ms: u64,
    /// Canvas geometry.
    pub viewport: ViewportConfig,
    /// Aim tuning.
    pub aim: AimConfig,
    /// Grenade timings.
    pub grenade: GrenadeConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            player_speed: PLAYER_SPEED,
            frame_interval_ms: 16,
            viewport: ViewportConfig::default(),
            aim: AimConfig::default(),
            grenade: GrenadeConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] if the document is not valid.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if it is not valid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Driver tick period as a duration, at least one millisecond.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(ClientConfig::from_toml_str("").unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = ClientConfig::from_toml_str(
            r"
            player_speed = 12.5

            [grenade]
            paint_delay_ms = 50
            ",
        )
        .unwrap();

        assert!((config.player_speed - 12.5).abs() < f64::EPSILON);
        assert_eq!(config.grenade.paint_delay(), Duration::from_millis(50));
        assert_eq!(config.grenade.release_display(), Duration::from_millis(600));
        assert_eq!(config.aim, AimConfig::default());
    }

    #[test]
    fn test_invalid_document() {
        let err = ClientConfig::from_toml_str("player_speed = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ClientConfig::load("/nonexistent/tilewar.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
