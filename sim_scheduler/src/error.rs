//! Simulator error types
//!
//! Only caller-reachable conditions are errors. Broken internal invariants
//! panic instead.

use thiserror::Error;

/// Why a process was not admitted
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdmissionError {
    /// Every pid in `1..=max_procs` is owned by a live process
    #[error("No free pid: all {0} slots are in use")]
    CapacityExhausted(usize),

    /// The burst list was empty
    #[error("A process needs at least one CPU burst")]
    EmptyBursts,

    /// The list ends on an I/O burst, so the process could never terminate
    #[error("Burst list of length {0} does not end with a CPU burst")]
    MissingFinalCpuBurst(usize),

    /// A burst was negative, NaN or infinite
    #[error("Invalid burst at index {index}: {value}")]
    InvalidBurst { index: usize, value: f64 },
}

/// Invalid simulator configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Quantum must be a positive finite number, got {0}")]
    InvalidQuantum(f64),

    #[error("Process capacity must be at least 1")]
    ZeroCapacity,

    #[error("Step limit must be at least 1 when set")]
    InvalidStepLimit,

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),
}
