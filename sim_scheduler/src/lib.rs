//! # Scheduler Simulator
//!
//! A deterministic, single-CPU round-robin scheduler with blocking I/O.
//!
//! ## Philosophy
//!
//! - **Determinism first**: Same admissions + same advances => same state.
//! - **Explicit time**: The clock only moves inside `advance_time`.
//! - **Deferred transitions**: A burst that ends exactly when a call ends is
//!   transitioned by the next call, never by the one that finished it.
//! - **Loud invariants**: Broken internal state panics; only admission and
//!   configuration produce errors.
//!
//! ## Model
//!
//! Every process carries an ordered list of bursts, alternating CPU and I/O
//! and starting with CPU. The CPU runs the front of the ready queue for at
//! most one quantum. When a CPU burst ends the process blocks for its next
//! I/O burst; all I/O proceeds in parallel. A process whose last CPU burst
//! ends is terminated and its pid returns to the pool.
//!
//! ## Example
//!
//! ```
//! use sim_scheduler::SchedulerSimulator;
//!
//! let mut simulator = SchedulerSimulator::new(1.0, 4);
//! let pid = simulator.add_process(vec![2.0]).unwrap();
//!
//! simulator.advance_time(1.5);
//! let running = simulator.running().unwrap();
//! assert_eq!(running.pid, pid);
//! assert_eq!(running.bursts, vec![0.5]);
//! ```

pub mod audit;
pub mod classifier;
pub mod config;
pub mod error;
pub mod process;
mod queues;
pub mod scenario;
pub mod scheduler;
mod transitions;

pub use audit::{PreemptionReason, ScheduleEvent};
pub use classifier::{Classification, Decision};
pub use config::SchedulerConfig;
pub use error::{AdmissionError, ConfigError};
pub use process::{BurstKind, Pid, ProcessSnapshot, ProcessStatus};
pub use scenario::{AdmissionOutcome, Scenario, ScenarioError, ScenarioReport, ScenarioStep};
pub use scheduler::{validate_bursts, SchedulerSimulator, SchedulerSnapshot};

/// Tolerance used wherever a decreasing duration is compared against zero
pub const ALMOST_ZERO: f64 = 1e-5;
