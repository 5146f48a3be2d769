//! # Host Runtime
//!
//! Resolves the configuration, replays the script and renders the report.
//!
//! Configuration layers, last one wins: built-in defaults, the JSON config
//! file, the script header, command-line overrides.

use log::{debug, info};
use sim_scheduler::{ConfigError, Scenario, ScenarioError, ScenarioReport, SchedulerConfig};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Host runtime error types
#[derive(Debug, Error)]
pub enum HostRuntimeError {
    #[error("Script error: {0}")]
    ScriptError(#[from] ScenarioError),

    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Failed to read {path}: {message}")]
    IoError { path: String, message: String },

    #[error("Render error: {0}")]
    RenderError(String),
}

/// Command-line values that override the script header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub quantum: Option<f64>,
    pub max_procs: Option<usize>,
    /// Step limit (Some(None) = unlimited)
    pub max_steps: Option<Option<u64>>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut SchedulerConfig) {
        if let Some(quantum) = self.quantum {
            config.quantum = quantum;
        }
        if let Some(max_procs) = self.max_procs {
            config.max_procs = max_procs;
        }
        if let Some(max_steps) = self.max_steps {
            config.max_steps_per_advance = max_steps;
        }
    }
}

/// Host runtime configuration
#[derive(Debug, Clone, Default)]
pub struct HostRuntimeConfig {
    /// Scenario script text
    pub script: String,
    /// Configuration the script header starts from
    pub base: SchedulerConfig,
    /// Command-line overrides
    pub overrides: ConfigOverrides,
    /// Whether to include the audit trail in the report
    pub audit: bool,
}

/// Host runtime
pub struct HostRuntime {
    /// Parsed scenario with the final configuration
    scenario: Scenario,
    /// Whether to keep the audit trail
    audit: bool,
}

impl HostRuntime {
    /// Creates a new host runtime
    pub fn new(config: HostRuntimeConfig) -> Result<Self, HostRuntimeError> {
        let mut scenario = Scenario::from_text_with_config(&config.script, config.base)?;
        config.overrides.apply(&mut scenario.config);
        scenario.config.validate()?;

        debug!(
            "scenario: {} steps, quantum {}, max_procs {}",
            scenario.steps.len(),
            scenario.config.quantum,
            scenario.config.max_procs
        );

        Ok(Self {
            scenario,
            audit: config.audit,
        })
    }

    /// Replays the scenario
    pub fn run(&self) -> Result<ScenarioReport, HostRuntimeError> {
        let report = self.scenario.run_with_audit(self.audit)?;
        let rejected = report.admissions.iter().filter(|a| a.pid.is_none()).count();
        info!(
            "replayed {} steps: {} admissions ({} rejected), {} snapshots",
            self.scenario.steps.len(),
            report.admissions.len(),
            rejected,
            report.snapshots.len()
        );
        Ok(report)
    }

    /// Replays the scenario and renders the report as pretty JSON
    pub fn run_to_json(&self) -> Result<String, HostRuntimeError> {
        let report = self.run()?;
        render_report(&report)
    }

    /// Returns the resolved configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.scenario.config
    }

    /// Returns the parsed scenario
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }
}

/// Renders a report as pretty JSON
pub fn render_report(report: &ScenarioReport) -> Result<String, HostRuntimeError> {
    serde_json::to_string_pretty(report).map_err(|e| HostRuntimeError::RenderError(e.to_string()))
}

/// Reads a file to a string
pub fn read_text_file(path: &Path) -> Result<String, HostRuntimeError> {
    fs::read_to_string(path).map_err(|e| HostRuntimeError::IoError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Loads a scheduler configuration from a JSON file
pub fn load_config_file(path: &Path) -> Result<SchedulerConfig, HostRuntimeError> {
    let bytes = fs::read(path).map_err(|e| HostRuntimeError::IoError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(SchedulerConfig::from_json_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_for(script: &str) -> HostRuntimeConfig {
        HostRuntimeConfig {
            script: script.to_string(),
            ..HostRuntimeConfig::default()
        }
    }

    #[test]
    fn test_runtime_creation() {
        let runtime = HostRuntime::new(config_for("quantum 2.0\nadd 1.0\n")).unwrap();
        assert_eq!(runtime.config().quantum, 2.0);
        assert_eq!(runtime.scenario().steps.len(), 1);
    }

    #[test]
    fn test_runtime_empty_script() {
        let result = HostRuntime::new(config_for("# nothing to do\n"));
        assert!(matches!(
            result,
            Err(HostRuntimeError::ScriptError(ScenarioError::EmptyScript))
        ));
    }

    #[test]
    fn test_overrides_beat_script_header() {
        let mut config = config_for("quantum 2.0\nmax_procs 1\nadd 1.0\nadd 1.0\n");
        config.overrides = ConfigOverrides {
            quantum: Some(0.5),
            max_procs: Some(2),
            max_steps: Some(None),
        };

        let runtime = HostRuntime::new(config).unwrap();
        assert_eq!(runtime.config().quantum, 0.5);
        assert_eq!(runtime.config().max_procs, 2);
        assert_eq!(runtime.config().max_steps_per_advance, None);

        let report = runtime.run().unwrap();
        assert!(report.admissions.iter().all(|a| a.pid.is_some()));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let mut config = config_for("add 1.0\n");
        config.overrides.max_procs = Some(0);
        assert!(matches!(
            HostRuntime::new(config),
            Err(HostRuntimeError::ConfigError(ConfigError::ZeroCapacity))
        ));
    }

    #[test]
    fn test_base_config_used_without_header() {
        let mut config = config_for("add 1.0\n");
        config.base = SchedulerConfig::new(3.0, 5);

        let runtime = HostRuntime::new(config).unwrap();
        assert_eq!(runtime.config().quantum, 3.0);
        assert_eq!(runtime.config().max_procs, 5);
    }

    #[test]
    fn test_run_to_json() {
        let mut config = config_for("quantum 1.0\nadd 2.0\nadvance 1.5\nsnapshot\n");
        config.audit = true;

        let runtime = HostRuntime::new(config).unwrap();
        let json: serde_json::Value = serde_json::from_str(&runtime.run_to_json().unwrap()).unwrap();

        assert_eq!(json["config"]["quantum"], 1.0);
        assert_eq!(json["snapshots"][0]["running"]["pid"], 1);
        assert_eq!(json["snapshots"][0]["blocked"], serde_json::json!([]));
        assert!(json["audit"].as_array().is_some_and(|a| !a.is_empty()));
    }

    #[test]
    fn test_load_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"quantum": 0.25, "max_procs": 3}"#).unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.quantum, 0.25);
        assert_eq!(config.max_procs, 3);
        assert_eq!(config.max_steps_per_advance, Some(100_000));
    }

    #[test]
    fn test_load_config_file_errors() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();
        assert!(matches!(
            load_config_file(file.path()),
            Err(HostRuntimeError::ConfigError(ConfigError::Parse(_)))
        ));

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load_config_file(&missing),
            Err(HostRuntimeError::IoError { .. })
        ));
    }

    #[test]
    fn test_read_text_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"add 1.0\n").unwrap();
        assert_eq!(read_text_file(file.path()).unwrap(), "add 1.0\n");
    }
}
