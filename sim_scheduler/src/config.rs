//! Simulator configuration
//!
//! Both the quantum and the process capacity are fixed for the lifetime of a
//! simulator. Configurations can be stored as JSON next to scenario scripts.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// CPU time granted to a process per dispatch
    pub quantum: f64,
    /// Number of pids, handed out from `1..=max_procs`
    pub max_procs: usize,
    /// Maximum sub-steps per `advance_time` call before the simulator
    /// declares itself stuck (None = unlimited)
    ///
    /// A healthy call takes at least one sub-step per quantum expiry or burst
    /// boundary it crosses, so the limit also caps how far a single valid
    /// call can advance. Raise it or set `None` for long advances.
    pub max_steps_per_advance: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            quantum: 1.0,
            max_procs: 8,
            max_steps_per_advance: Some(100_000),
        }
    }
}

impl SchedulerConfig {
    /// Creates a configuration with the default step limit
    pub fn new(quantum: f64, max_procs: usize) -> Self {
        Self {
            quantum,
            max_procs,
            ..Self::default()
        }
    }

    /// Sets the step limit
    pub fn with_max_steps(mut self, max_steps_per_advance: Option<u64>) -> Self {
        self.max_steps_per_advance = max_steps_per_advance;
        self
    }

    /// Checks the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.quantum.is_finite() || self.quantum <= 0.0 {
            return Err(ConfigError::InvalidQuantum(self.quantum));
        }
        if self.max_procs == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.max_steps_per_advance == Some(0) {
            return Err(ConfigError::InvalidStepLimit);
        }
        Ok(())
    }

    /// Reads and validates a configuration from JSON bytes
    ///
    /// Missing fields take their default values.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: SchedulerConfig =
            serde_json::from_slice(bytes).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to pretty JSON bytes
    pub fn to_json_vec(&self) -> Result<Vec<u8>, ConfigError> {
        serde_json::to_vec_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}
