//! Scheduling audit trail
//!
//! Every transition the simulator performs is recorded, in order, with the
//! simulated time at which it happened. Tests use the trail to check
//! interleavings that the queue snapshots alone cannot show.

use crate::process::Pid;
use serde::{Deserialize, Serialize};

/// Scheduling event for audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScheduleEvent {
    /// Process was admitted into the ready queue
    ProcessAdmitted { pid: Pid, timestamp: f64 },
    /// Process was selected to run
    ProcessSelected { pid: Pid, timestamp: f64 },
    /// Process left the CPU without terminating
    ProcessPreempted {
        pid: Pid,
        reason: PreemptionReason,
        timestamp: f64,
    },
    /// Process finished its I/O burst and rejoined the ready queue
    ProcessWoken { pid: Pid, timestamp: f64 },
    /// Process finished its last CPU burst; its pid is free again
    ProcessExited { pid: Pid, timestamp: f64 },
}

impl ScheduleEvent {
    pub fn pid(&self) -> Pid {
        match self {
            ScheduleEvent::ProcessAdmitted { pid, .. }
            | ScheduleEvent::ProcessSelected { pid, .. }
            | ScheduleEvent::ProcessPreempted { pid, .. }
            | ScheduleEvent::ProcessWoken { pid, .. }
            | ScheduleEvent::ProcessExited { pid, .. } => *pid,
        }
    }

    pub fn timestamp(&self) -> f64 {
        match self {
            ScheduleEvent::ProcessAdmitted { timestamp, .. }
            | ScheduleEvent::ProcessSelected { timestamp, .. }
            | ScheduleEvent::ProcessPreempted { timestamp, .. }
            | ScheduleEvent::ProcessWoken { timestamp, .. }
            | ScheduleEvent::ProcessExited { timestamp, .. } => *timestamp,
        }
    }
}

/// Reason for preemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreemptionReason {
    /// Time quantum expired
    QuantumExpired,
    /// CPU burst finished and the process now waits on I/O
    Blocked,
}
