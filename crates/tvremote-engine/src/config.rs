//! Engine configuration loaded from TOML.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub touchpad: TouchpadConfig,
    #[serde(default)]
    pub keys: KeyConfig,
}

impl Config {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        let sensitivity = self.touchpad.sensitivity;
        if !sensitivity.is_finite() || sensitivity <= 0.0 {
            return Err(EngineError::InvalidSensitivity(sensitivity));
        }
        if !self.touchpad.move_threshold.is_finite() || self.touchpad.move_threshold < 0.0 {
            return Err(EngineError::Config(format!(
                "touchpad.move_threshold must be a non-negative number, got {}",
                self.touchpad.move_threshold
            )));
        }
        if !self.touchpad.min_delta.is_finite() || self.touchpad.min_delta < 0.0 {
            return Err(EngineError::Config(format!(
                "touchpad.min_delta must be a non-negative number, got {}",
                self.touchpad.min_delta
            )));
        }
        if self.keys.repeat_interval_ms == 0 {
            return Err(EngineError::Config(
                "keys.repeat_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Event loop and logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Interval between connectivity heartbeats; 0 disables them.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }
}

/// Touchpad gesture thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TouchpadConfig {
    /// Initial pointer speed multiplier.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    /// Minimum spacing between accepted move samples.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// Manhattan distance from the origin beyond which a contact is a drag.
    #[serde(default = "default_move_threshold")]
    pub move_threshold: f64,
    /// Contacts shorter than this (and not dragged) are taps.
    #[serde(default = "default_tap_max_ms")]
    pub tap_max_ms: u64,
    /// Scaled deltas at or below this on both axes are not emitted.
    #[serde(default = "default_min_delta")]
    pub min_delta: f64,
}

impl Default for TouchpadConfig {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            throttle_ms: default_throttle_ms(),
            move_threshold: default_move_threshold(),
            tap_max_ms: default_tap_max_ms(),
            min_delta: default_min_delta(),
        }
    }
}

/// Key repeat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyConfig {
    #[serde(default = "default_repeat_interval_ms")]
    pub repeat_interval_ms: u64,
    /// Longest wait for a key-down acknowledgment before repeating anyway.
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            repeat_interval_ms: default_repeat_interval_ms(),
            ack_timeout_ms: default_ack_timeout_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_heartbeat_interval_ms() -> u64 {
    10_000
}

fn default_sensitivity() -> f64 {
    1.5
}

fn default_throttle_ms() -> u64 {
    16
}

fn default_move_threshold() -> f64 {
    10.0
}

fn default_tap_max_ms() -> u64 {
    300
}

fn default_min_delta() -> f64 {
    0.5
}

fn default_repeat_interval_ms() -> u64 {
    100
}

fn default_ack_timeout_ms() -> u64 {
    1_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("repeat_interval_ms = 100"));
        assert!(toml_str.contains("throttle_ms = 16"));
    }

    #[test]
    fn parse_partial_config() {
        let toml_str = r#"
[engine]
log_level = "debug"
heartbeat_interval_ms = 0

[touchpad]
sensitivity = 2.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.log_level, "debug");
        assert_eq!(config.engine.heartbeat_interval_ms, 0);
        assert!((config.touchpad.sensitivity - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.touchpad.tap_max_ms, 300);
        assert_eq!(config.keys.ack_timeout_ms, 1_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_positive_sensitivity_rejected() {
        let mut config = Config::default();
        config.touchpad.sensitivity = 0.0;
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidSensitivity(_))
        ));
    }

    #[test]
    fn zero_repeat_interval_rejected() {
        let mut config = Config::default();
        config.keys.repeat_interval_ms = 0;
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }
}
