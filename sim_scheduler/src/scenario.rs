//! # Scenario Scripts
//!
//! A line-based script format for replaying admissions and time advances
//! against a fresh simulator, the way a grading harness drives it.
//!
//! ## Format
//!
//! - Header (before any command): `quantum <q>`, `max_procs <n>`,
//!   `max_steps <n>` or `max_steps none`
//! - `add <b0> <b1> ...`: admit a process
//! - `advance <t>`: advance the clock
//! - `snapshot`: record the ready, blocked and running views
//! - `expect_pid <n>`: the previous `add` must have returned pid `n`
//! - `expect_reject`: the previous `add` must have been rejected
//! - Comments: `# ...`, whole-line or trailing
//!
//! ## Example
//!
//! ```text
//! quantum 1.0
//! max_procs 2
//! add 1.0 1.0 1.0   # pid 1
//! add 5.0           # pid 2
//! advance 1.0
//! snapshot
//! ```

use crate::audit::ScheduleEvent;
use crate::config::SchedulerConfig;
use crate::error::{AdmissionError, ConfigError};
use crate::process::Pid;
use crate::scheduler::{validate_bursts, SchedulerSimulator, SchedulerSnapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scenario error types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Empty script")]
    EmptyScript,

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Admission mismatch at line {line}: expected {expected}, got {actual}")]
    AdmissionMismatch {
        line: usize,
        expected: String,
        actual: String,
    },
}

/// A single scripted action
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioStep {
    Add(Vec<f64>),
    Advance(f64),
    Snapshot,
    ExpectPid(Pid),
    ExpectReject,
}

/// Parsed scenario: a configuration plus the steps to replay
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub config: SchedulerConfig,
    /// Steps paired with the 1-based script line they came from
    pub steps: Vec<(usize, ScenarioStep)>,
}

/// Result of one `add` line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionOutcome {
    pub line: usize,
    pub pid: Option<Pid>,
}

/// Everything a scenario run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub config: SchedulerConfig,
    pub admissions: Vec<AdmissionOutcome>,
    pub snapshots: Vec<SchedulerSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audit: Vec<ScheduleEvent>,
}

impl Scenario {
    /// Parses a scenario from text, starting from the default configuration
    pub fn from_text(text: &str) -> Result<Self, ScenarioError> {
        Self::from_text_with_config(text, SchedulerConfig::default())
    }

    /// Parses a scenario from text; header lines override `base`
    pub fn from_text_with_config(
        text: &str,
        base: SchedulerConfig,
    ) -> Result<Self, ScenarioError> {
        let mut config = base;
        let mut steps = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line_num = index + 1;
            let line = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();

            // Skip empty lines and comments
            if line.is_empty() {
                continue;
            }

            let mut words = line.split_whitespace();
            let keyword = words.next().unwrap_or_default();
            let args: Vec<&str> = words.collect();

            match keyword {
                "quantum" | "max_procs" | "max_steps" => {
                    if !steps.is_empty() {
                        return Err(parse_error(
                            line_num,
                            format!("'{}' must appear before any command", keyword),
                        ));
                    }
                    let value = single_arg(keyword, &args, line_num)?;
                    match keyword {
                        "quantum" => config.quantum = parse_number(value, line_num)?,
                        "max_procs" => config.max_procs = parse_count(value, line_num)?,
                        _ => {
                            config.max_steps_per_advance = if value == "none" {
                                None
                            } else {
                                Some(parse_count(value, line_num)? as u64)
                            }
                        }
                    }
                }
                "add" => {
                    if args.is_empty() {
                        return Err(parse_error(line_num, "'add' needs at least one burst"));
                    }
                    let bursts = args
                        .iter()
                        .map(|arg| parse_number(arg, line_num))
                        .collect::<Result<Vec<f64>, _>>()?;
                    validate_bursts(&bursts).map_err(|e| parse_error(line_num, e.to_string()))?;
                    steps.push((line_num, ScenarioStep::Add(bursts)));
                }
                "advance" => {
                    let value = parse_number(single_arg(keyword, &args, line_num)?, line_num)?;
                    if !value.is_finite() || value < 0.0 {
                        return Err(parse_error(
                            line_num,
                            format!("cannot advance by {}", value),
                        ));
                    }
                    steps.push((line_num, ScenarioStep::Advance(value)));
                }
                "snapshot" => {
                    no_args(keyword, &args, line_num)?;
                    steps.push((line_num, ScenarioStep::Snapshot));
                }
                "expect_pid" => {
                    let pid = parse_count(single_arg(keyword, &args, line_num)?, line_num)?;
                    steps.push((line_num, ScenarioStep::ExpectPid(pid)));
                }
                "expect_reject" => {
                    no_args(keyword, &args, line_num)?;
                    steps.push((line_num, ScenarioStep::ExpectReject));
                }
                other => {
                    return Err(parse_error(line_num, format!("unknown command '{}'", other)));
                }
            }
        }

        if steps.is_empty() {
            return Err(ScenarioError::EmptyScript);
        }
        config.validate()?;

        Ok(Self { config, steps })
    }

    /// Replays the scenario against a fresh simulator
    pub fn run(&self) -> Result<ScenarioReport, ScenarioError> {
        self.run_with_audit(false)
    }

    /// Replays the scenario, optionally keeping the full audit trail
    pub fn run_with_audit(&self, keep_audit: bool) -> Result<ScenarioReport, ScenarioError> {
        let mut simulator = SchedulerSimulator::with_config(self.config.clone())?;
        let mut admissions: Vec<AdmissionOutcome> = Vec::new();
        let mut snapshots = Vec::new();

        for (line, step) in &self.steps {
            match step {
                ScenarioStep::Add(bursts) => {
                    let pid = match simulator.try_add_process(bursts.clone()) {
                        Ok(pid) => Some(pid),
                        Err(AdmissionError::CapacityExhausted(_)) => None,
                        Err(e) => return Err(parse_error(*line, e.to_string())),
                    };
                    admissions.push(AdmissionOutcome { line: *line, pid });
                }
                ScenarioStep::Advance(delta) => {
                    if !delta.is_finite() || *delta < 0.0 {
                        return Err(parse_error(*line, format!("cannot advance by {}", delta)));
                    }
                    simulator.advance_time(*delta);
                }
                ScenarioStep::Snapshot => snapshots.push(simulator.snapshot()),
                ScenarioStep::ExpectPid(expected) => {
                    let actual = last_admission(&admissions, *line)?;
                    if actual != Some(*expected) {
                        return Err(ScenarioError::AdmissionMismatch {
                            line: *line,
                            expected: format!("pid {}", expected),
                            actual: describe(actual),
                        });
                    }
                }
                ScenarioStep::ExpectReject => {
                    let actual = last_admission(&admissions, *line)?;
                    if actual.is_some() {
                        return Err(ScenarioError::AdmissionMismatch {
                            line: *line,
                            expected: "rejection".to_string(),
                            actual: describe(actual),
                        });
                    }
                }
            }
        }

        Ok(ScenarioReport {
            config: self.config.clone(),
            admissions,
            snapshots,
            audit: if keep_audit {
                simulator.audit_log().to_vec()
            } else {
                Vec::new()
            },
        })
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> ScenarioError {
    ScenarioError::ParseError {
        line,
        message: message.into(),
    }
}

fn single_arg<'a>(keyword: &str, args: &[&'a str], line: usize) -> Result<&'a str, ScenarioError> {
    match args {
        [value] => Ok(*value),
        _ => Err(parse_error(
            line,
            format!("'{}' takes exactly one argument", keyword),
        )),
    }
}

fn no_args(keyword: &str, args: &[&str], line: usize) -> Result<(), ScenarioError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(parse_error(line, format!("'{}' takes no arguments", keyword)))
    }
}

fn parse_number(text: &str, line: usize) -> Result<f64, ScenarioError> {
    text.parse::<f64>()
        .map_err(|_| parse_error(line, format!("invalid number '{}'", text)))
}

fn parse_count(text: &str, line: usize) -> Result<usize, ScenarioError> {
    text.parse::<usize>()
        .map_err(|_| parse_error(line, format!("invalid integer '{}'", text)))
}

fn last_admission(admissions: &[AdmissionOutcome], line: usize) -> Result<Option<Pid>, ScenarioError> {
    admissions
        .last()
        .map(|outcome| outcome.pid)
        .ok_or_else(|| parse_error(line, "no 'add' precedes this expectation"))
}

fn describe(pid: Option<Pid>) -> String {
    match pid {
        Some(pid) => format!("pid {}", pid),
        None => "rejection".to_string(),
    }
}
