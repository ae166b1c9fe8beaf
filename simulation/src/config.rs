//! Tunable rates and durations for the pet engine
//!
//! Loaded from a JSON file; every field falls back to the built-in default.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::error::{PetError, Result};

/// Points per second removed from every stat.
pub const DECAY_RATE: f64 = 2.0;
/// Time a pet may spend at zero hunger or health before it dies.
pub const GRACE_PERIOD_MS: i64 = 60_000;
/// Elapsed time after birth at which a juvenile becomes an adult.
/// In-app copy calls this "one week"; the shipped value is one minute.
pub const MATURATION_MS: i64 = 60_000;
pub const TICK_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub decay_rate: f64,
    pub grace_period_ms: i64,
    pub maturation_ms: i64,
    pub tick_interval_ms: u64,
    pub log_level: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            decay_rate: DECAY_RATE,
            grace_period_ms: GRACE_PERIOD_MS,
            maturation_ms: MATURATION_MS,
            tick_interval_ms: TICK_INTERVAL_MS,
            log_level: "info".to_string(),
        }
    }
}

impl SimulationConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PetError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(raw)
            .map_err(|e| PetError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.decay_rate.is_finite() || self.decay_rate <= 0.0 {
            return Err(PetError::Config(format!(
                "decay_rate must be positive, got {}",
                self.decay_rate
            )));
        }
        if self.grace_period_ms < 0 {
            return Err(PetError::Config("grace_period_ms must not be negative".into()));
        }
        if self.maturation_ms < 0 {
            return Err(PetError::Config("maturation_ms must not be negative".into()));
        }
        if self.tick_interval_ms == 0 {
            return Err(PetError::Config("tick_interval_ms must be at least 1".into()));
        }
        self.tracing_level()?;
        Ok(())
    }

    pub fn tracing_level(&self) -> Result<Level> {
        self.log_level
            .parse::<Level>()
            .map_err(|_| PetError::Config(format!("unknown log level '{}'", self.log_level)))
    }
}
