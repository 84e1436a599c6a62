//! Runtime configuration, loaded from JSON. Every field has a default.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::{DispatchPolicy, SerialSettings};
use crate::motion::MotionPlanner;
use crate::tracker::{MatchPolicy, TrackerConfig};

/// COCO class index for "person".
pub const PERSON_CLASS_ID: u32 = 0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub write_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        let settings = SerialSettings::default();
        Self {
            port: settings.port,
            baud_rate: settings.baud_rate,
            write_timeout_ms: settings.write_timeout.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowConfig {
    /// Detector class to follow.
    pub target_class: u32,
    /// Half-width of the forward dead-band around frame center, in pixels.
    pub dead_band: f32,
    pub select_policy: MatchPolicy,
    pub update_policy: MatchPolicy,
    pub dispatch_policy: DispatchPolicy,
    /// Adopt the largest detection whenever no target is held.
    pub auto_acquire: bool,
    /// Minimum cycle period; unset runs at the detector's pace.
    pub cycle_interval_ms: Option<u64>,
    pub serial: SerialConfig,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            target_class: PERSON_CLASS_ID,
            dead_band: 50.0,
            select_policy: MatchPolicy::default(),
            update_policy: MatchPolicy::default(),
            dispatch_policy: DispatchPolicy::default(),
            auto_acquire: false,
            cycle_interval_ms: None,
            serial: SerialConfig::default(),
        }
    }
}

impl FollowConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dead_band.is_finite() || self.dead_band < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "dead_band must be a non-negative number, got {}",
                self.dead_band
            )));
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Invalid("serial.baud_rate must be positive".into()));
        }
        if self.serial.write_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "serial.write_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            select_policy: self.select_policy,
            update_policy: self.update_policy,
            auto_acquire: self.auto_acquire,
        }
    }

    pub fn planner(&self) -> MotionPlanner {
        MotionPlanner::new(self.dead_band)
    }

    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings {
            port: self.serial.port.clone(),
            baud_rate: self.serial.baud_rate,
            write_timeout: Duration::from_millis(self.serial.write_timeout_ms),
        }
    }

    pub fn cycle_interval(&self) -> Option<Duration> {
        self.cycle_interval_ms.map(Duration::from_millis)
    }
}
