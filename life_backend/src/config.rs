//! Simulation settings, loaded from JSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::observers::DEFAULT_OUTBOX_CAPACITY;
use crate::pattern::{PatternError, PatternLibrary};
use crate::world::MAX_DIMENSION;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Every field is optional in the JSON; missing ones take the defaults below.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub width: u32,
    pub height: u32,
    pub workers_sqrt: u32,
    pub blend_colors: bool,
    pub target_fps: u32,
    pub start_paused: bool,
    pub idle_interval_ms: u64,
    pub intent_queue_capacity: usize,
    pub outbox_capacity: usize,
    pub pattern_dir: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            width: 1000,
            height: 1000,
            workers_sqrt: 3,
            blend_colors: true,
            target_fps: 60,
            start_paused: false,
            idle_interval_ms: 50,
            intent_queue_capacity: 256,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            pattern_dir: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("width", self.width), ("height", self.height)] {
            if !(2..=MAX_DIMENSION).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{} not in 2..={}", value, MAX_DIMENSION),
                });
            }
        }
        if self.workers_sqrt == 0 {
            return Err(invalid("workers_sqrt"));
        }
        let max_fan_out = self.width.min(self.height);
        if self.workers_sqrt > max_fan_out {
            return Err(ConfigError::Invalid {
                field: "workers_sqrt",
                reason: format!("{} exceeds the smaller side {}", self.workers_sqrt, max_fan_out),
            });
        }
        if self.target_fps == 0 {
            return Err(invalid("target_fps"));
        }
        if self.intent_queue_capacity == 0 {
            return Err(invalid("intent_queue_capacity"));
        }
        if self.outbox_capacity == 0 {
            return Err(invalid("outbox_capacity"));
        }
        Ok(())
    }

    /// Wall time one tick may take before the next starts late.
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    /// Patterns from `pattern_dir`, or an empty library when none is set.
    pub fn load_patterns(&self) -> Result<PatternLibrary, PatternError> {
        match &self.pattern_dir {
            Some(dir) => PatternLibrary::load_dir(dir),
            None => Ok(PatternLibrary::new()),
        }
    }
}

fn invalid(field: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason: "must be at least 1".to_string() }
}
