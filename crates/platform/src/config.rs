//! Runtime configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest touch slot count accepted from configuration
pub const MAX_TOUCH_POINTS: usize = 16;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Platform configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keyboard configuration
    pub keyboard: KeyboardConfig,

    /// Touch screen configuration
    pub touch: TouchConfig,

    /// Surface resize reconciliation
    pub resize: ResizeConfig,
}

/// Keyboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// XKB rules
    pub rules: String,

    /// XKB model
    pub model: String,

    /// XKB layout
    pub layout: String,

    /// XKB variant
    pub variant: String,

    /// XKB options
    pub options: String,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            rules: "evdev".to_string(),
            model: "pc105".to_string(),
            layout: "us".to_string(),
            variant: String::new(),
            options: String::new(),
        }
    }
}

/// How Move events are matched to occupied touch slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveMatching {
    /// Each pointer updates the slot named by its id
    #[default]
    ById,
    /// Pointers update occupied slots in slot order
    SlotOrder,
}

/// Touch screen configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchConfig {
    /// Number of touch slots (concurrent contacts)
    pub max_point_count: usize,

    /// Raw pressure reported for a full-strength press
    pub max_pressure: f64,

    /// Move event matching strategy
    pub move_matching: MoveMatching,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            max_point_count: 10,
            // Galaxy Nexus panel; the input stack has no per-device query yet
            max_pressure: 1.28,
            move_matching: MoveMatching::default(),
        }
    }
}

/// Surface resize reconciliation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// Extra redraws attempted after a compositor resize before giving up
    pub catch_up_attempts: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self { catch_up_attempts: 2 }
    }
}

impl Config {
    /// Load configuration from the standard locations, falling back to defaults
    pub fn load() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("surfacebridge/config.toml")),
            Some(PathBuf::from("/etc/surfacebridge/config.toml")),
        ];

        for path in config_paths.into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            match Self::from_file(&path) {
                Ok(config) => {
                    tracing::info!(?path, "loaded configuration");
                    return config;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring configuration file");
                }
            }
        }

        tracing::info!("using default configuration");
        Self::default()
    }

    /// Load and validate a specific configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate();
        Ok(config)
    }

    /// Clamp values the input layer can't work with
    pub fn validate(&mut self) {
        let touch = &mut self.touch;
        if touch.max_point_count == 0 || touch.max_point_count > MAX_TOUCH_POINTS {
            let clamped = touch.max_point_count.clamp(1, MAX_TOUCH_POINTS);
            tracing::warn!(
                requested = touch.max_point_count,
                clamped,
                "touch.max_point_count out of range"
            );
            touch.max_point_count = clamped;
        }

        if !(touch.max_pressure.is_finite() && touch.max_pressure > 0.0) {
            tracing::warn!(
                requested = touch.max_pressure,
                "touch.max_pressure must be positive, using default"
            );
            touch.max_pressure = TouchConfig::default().max_pressure;
        }
    }
}

/// Helper for getting XDG directories
mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_has_expected_values() {
        let config = Config::default();

        assert_eq!(config.keyboard.rules, "evdev");
        assert_eq!(config.keyboard.model, "pc105");
        assert_eq!(config.keyboard.layout, "us");
        assert!(config.keyboard.variant.is_empty());
        assert!(config.keyboard.options.is_empty());
        assert_eq!(config.touch.max_point_count, 10);
        assert!((config.touch.max_pressure - 1.28).abs() < 1e-9);
        assert_eq!(config.touch.move_matching, MoveMatching::ById);
        assert_eq!(config.resize.catch_up_attempts, 2);
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut config = Config::default();
        config.keyboard.layout = "de".to_string();
        config.touch.max_point_count = 5;
        config.touch.move_matching = MoveMatching::SlotOrder;
        config.resize.catch_up_attempts = 4;

        let toml_str = toml::to_string(&config).expect("Failed to serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("Failed to deserialize");

        assert_eq!(parsed, config);
    }

    #[test]
    fn config_partial_toml_uses_defaults() {
        let partial_toml = r#"
            [touch]
            max_pressure = 2.0
            move_matching = "slot_order"
        "#;

        let parsed: Config = toml::from_str(partial_toml).expect("Failed to parse partial TOML");

        assert!((parsed.touch.max_pressure - 2.0).abs() < 1e-9);
        assert_eq!(parsed.touch.move_matching, MoveMatching::SlotOrder);
        assert_eq!(parsed.touch.max_point_count, 10);
        assert_eq!(parsed.keyboard.layout, "us");
        assert_eq!(parsed.resize.catch_up_attempts, 2);
    }

    #[test]
    fn config_invalid_toml_returns_error() {
        let result: Result<Config, _> = toml::from_str("this is not valid { toml [");
        assert!(result.is_err());
    }

    #[test]
    fn validate_clamps_point_count() {
        let mut config = Config::default();
        config.touch.max_point_count = 0;
        config.validate();
        assert_eq!(config.touch.max_point_count, 1);

        config.touch.max_point_count = 64;
        config.validate();
        assert_eq!(config.touch.max_point_count, MAX_TOUCH_POINTS);
    }

    #[test]
    fn validate_rejects_non_positive_pressure() {
        let mut config = Config::default();
        config.touch.max_pressure = 0.0;
        config.validate();
        assert!((config.touch.max_pressure - 1.28).abs() < 1e-9);

        config.touch.max_pressure = f64::NAN;
        config.validate();
        assert!((config.touch.max_pressure - 1.28).abs() < 1e-9);
    }

    #[test]
    fn from_file_reports_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/surfacebridge.toml"))
            .expect_err("missing file must fail");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
