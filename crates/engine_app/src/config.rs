//! Run configuration, loaded from an optional JSON file.
//!
//! Every field has a default, so a file only needs the values it changes:
//!
//! ```json
//! { "tick": { "tick_rate": 30.0 }, "demo": { "entity_count": 100 } }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::tick::TickConfig;

/// Parameters of the demo simulation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of entities spawned at startup.
    pub entity_count: usize,
    /// Width of the wrap-around play field.
    pub width: f32,
    /// Height of the wrap-around play field.
    pub height: f32,
    /// Initial speed of every entity, in units per second.
    pub speed: f32,
    /// Base lifetime in milliseconds. Zero spawns immortal entities.
    pub lifetime_ms: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            entity_count: 16,
            width: 800.0,
            height: 600.0,
            speed: 60.0,
            lifetime_ms: 0.0,
        }
    }
}

/// Everything a run needs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tick: TickConfig,
    pub demo: DemoConfig,
}

impl AppConfig {
    /// Parse a config from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid config JSON")
    }

    /// Read and parse the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_json_overrides_only_given_fields() {
        let config =
            AppConfig::from_json(r#"{ "tick": { "max_ticks": 10 }, "demo": { "width": 64.0 } }"#)
                .unwrap();
        assert_eq!(config.tick.max_ticks, 10);
        assert_eq!(config.tick.tick_rate, 60.0);
        assert_eq!(config.demo.width, 64.0);
        assert_eq!(config.demo.entity_count, 16);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(AppConfig::from_json("{ tick: ").is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = AppConfig::load(Path::new("/nonexistent/engine_app.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
