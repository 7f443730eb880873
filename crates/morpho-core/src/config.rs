//! Controller configuration: plan horizon, recomputation interval, worker
//! pool sizing, and candidate sampling knobs.
//!
//! Loadable from TOML; every field has a default so a partial file (or none
//! at all) yields a runnable configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_horizon() -> usize {
    5
}
const fn default_interval() -> u32 {
    30
}
const fn default_samples() -> usize {
    32
}
const fn default_position_stddev() -> f32 {
    0.4
}
const fn default_velocity_stddev() -> f32 {
    0.0
}

// ---------------------------------------------------------------------------
// ControllerConfig
// ---------------------------------------------------------------------------

/// MPC controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Number of forward simulation steps each rollout evaluates (default: 5).
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Number of live control steps between plan recomputations (default: 30).
    #[serde(default = "default_interval")]
    pub interval: u32,

    /// Rollout worker thread count. `None` uses the host's available
    /// parallelism.
    #[serde(default)]
    pub thread_count: Option<usize>,

    /// Number of candidate action sequences sampled per round (default: 32).
    #[serde(default = "default_samples")]
    pub samples: usize,

    /// Standard deviation of Gaussian perturbations applied to candidate
    /// joint position targets, in radians (default: 0.4).
    #[serde(default = "default_position_stddev")]
    pub position_stddev: f32,

    /// Standard deviation of Gaussian perturbations applied to candidate
    /// joint velocity targets (default: 0.0 = position control only).
    #[serde(default = "default_velocity_stddev")]
    pub velocity_stddev: f32,

    /// Root seed for candidate sampling. Each recomputation round derives
    /// its own child seed, so results are reproducible end to end.
    #[serde(default)]
    pub seed: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            interval: default_interval(),
            thread_count: None,
            samples: default_samples(),
            position_stddev: default_position_stddev(),
            velocity_stddev: default_velocity_stddev(),
            seed: 0,
        }
    }
}

impl ControllerConfig {
    /// Load a configuration from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon == 0 {
            return Err(invalid("horizon", "must be >= 1"));
        }
        if self.interval == 0 {
            return Err(invalid("interval", "must be >= 1"));
        }
        if self.samples == 0 {
            return Err(invalid("samples", "must be >= 1"));
        }
        if self.thread_count == Some(0) {
            return Err(invalid("thread_count", "must be >= 1 when set"));
        }
        if !self.position_stddev.is_finite() || self.position_stddev < 0.0 {
            return Err(invalid("position_stddev", "must be finite and >= 0"));
        }
        if !self.velocity_stddev.is_finite() || self.velocity_stddev < 0.0 {
            return Err(invalid("velocity_stddev", "must be finite and >= 0"));
        }
        Ok(())
    }

    /// Worker pool size: the configured count, or the host's available
    /// parallelism (at least 1).
    pub fn effective_thread_count(&self) -> usize {
        self.thread_count.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        })
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
