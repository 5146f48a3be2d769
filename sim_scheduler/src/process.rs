//! Process records
//!
//! A process is a pid plus an ordered ledger of bursts. The head of the
//! ledger is always the burst that is currently being consumed: a CPU burst
//! while the process is ready or running, an I/O burst while it is blocked.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Process identifier, drawn from `1..=max_procs`
pub type Pid = usize;

/// Where a live process currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessStatus {
    /// Waiting in the ready queue
    Ready,
    /// Holding the CPU
    Running,
    /// Waiting for its I/O burst to complete
    Blocked,
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStatus::Ready => write!(f, "Ready"),
            ProcessStatus::Running => write!(f, "Running"),
            ProcessStatus::Blocked => write!(f, "Blocked"),
        }
    }
}

/// Semantic type of a burst
///
/// Even positions of the admitted sequence are CPU bursts, odd positions
/// are I/O bursts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurstKind {
    Cpu,
    Io,
}

/// A live process
#[derive(Debug, Clone)]
pub struct Process {
    pid: Pid,
    bursts: VecDeque<f64>,
    /// Bursts already popped off the front; its parity gives the head's kind
    consumed: usize,
    status: ProcessStatus,
}

impl Process {
    /// Creates a ready process
    ///
    /// Callers validate `bursts` first: it must not be empty.
    pub(crate) fn new(pid: Pid, bursts: Vec<f64>) -> Self {
        assert!(!bursts.is_empty(), "Process::new(): empty burst list");
        Self {
            pid,
            bursts: bursts.into(),
            consumed: 0,
            status: ProcessStatus::Ready,
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn status(&self) -> ProcessStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: ProcessStatus) {
        self.status = status;
    }

    /// Remaining time of the active burst
    pub fn head(&self) -> f64 {
        self.bursts[0]
    }

    pub(crate) fn head_mut(&mut self) -> &mut f64 {
        &mut self.bursts[0]
    }

    /// Kind of the active burst
    pub fn head_kind(&self) -> BurstKind {
        if self.consumed % 2 == 0 {
            BurstKind::Cpu
        } else {
            BurstKind::Io
        }
    }

    /// Number of bursts left, the active one included
    pub fn remaining_bursts(&self) -> usize {
        self.bursts.len()
    }

    /// True when only the terminal CPU burst is left
    pub fn is_final_burst(&self) -> bool {
        self.bursts.len() == 1
    }

    /// Drops the finished head burst, making the next one active
    pub(crate) fn pop_head(&mut self) -> f64 {
        assert!(
            self.bursts.len() > 1,
            "Process::pop_head(): pid {} has no burst after the active one",
            self.pid
        );
        self.consumed += 1;
        self.bursts.pop_front().unwrap_or_default()
    }

    /// Snapshot with values reported verbatim
    pub fn snapshot(&self) -> ProcessSnapshot {
        ProcessSnapshot {
            pid: self.pid,
            bursts: self.bursts.iter().copied().collect(),
        }
    }

    /// Snapshot with negative values clamped to zero
    ///
    /// A blocked head keeps counting down past zero until the next
    /// reconciliation; the overshoot is internal bookkeeping only.
    pub fn clamped_snapshot(&self) -> ProcessSnapshot {
        ProcessSnapshot {
            pid: self.pid,
            bursts: self.bursts.iter().map(|b| b.max(0.0)).collect(),
        }
    }
}

/// Read-only view of a process handed out by the query surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub pid: Pid,
    pub bursts: Vec<f64>,
}

impl fmt::Display for ProcessSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {} {:?}", self.pid, self.bursts)
    }
}
