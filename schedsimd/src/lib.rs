//! # Scheduler Simulator Host
//!
//! Runs scenario scripts against the round-robin simulator and renders the
//! results.
//!
//! ## Philosophy
//!
//! - **Host owns I/O**: The simulator never reads files or prints
//! - **Output is snapshot rendering**: Reports are plain JSON values
//! - **Deterministic**: The same script always renders the same report

pub mod runtime;

pub use runtime::{
    load_config_file, read_text_file, render_report, ConfigOverrides, HostRuntime,
    HostRuntimeConfig, HostRuntimeError,
};
