//! Round-robin scheduler simulator
//!
//! Owns the queue set and drives the event-stepped clock.
//!
//! ## Time stepping
//!
//! `advance_time` never ticks at a fixed resolution. Each sub-step first
//! settles the running slot (kill, pause or block), reconciles the blocked set
//! and dispatches if the CPU is free, then jumps straight to the next event
//! horizon: the end of the budget, of the quantum, or of the active burst.
//!
//! A burst that lands exactly on its boundary at the end of a call is not
//! transitioned in that call. Callers stopping on a boundary observe the
//! process in its previous role with a zero remaining time.

use crate::audit::ScheduleEvent;
use crate::classifier::{classify, Decision};
use crate::config::SchedulerConfig;
use crate::error::{AdmissionError, ConfigError};
use crate::process::{BurstKind, Pid, Process, ProcessSnapshot, ProcessStatus};
use crate::queues::{BlockedSet, PidPool, ReadyQueue, RunningSlot};
use crate::ALMOST_ZERO;
use log::{debug, error};
use serde::{Deserialize, Serialize};

/// Single-CPU round-robin scheduler with blocking I/O
#[derive(Debug, Clone)]
pub struct SchedulerSimulator {
    pub(crate) config: SchedulerConfig,
    pub(crate) pids: PidPool,
    pub(crate) ready: ReadyQueue,
    pub(crate) blocked: BlockedSet,
    pub(crate) running: Option<RunningSlot>,
    /// Total simulated time, used only to stamp audit events
    pub(crate) elapsed: f64,
    pub(crate) audit_log: Vec<ScheduleEvent>,
}

/// Full view of the scheduler at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    pub elapsed: f64,
    pub ready: Vec<ProcessSnapshot>,
    pub blocked: Vec<ProcessSnapshot>,
    pub running: Option<ProcessSnapshot>,
}

impl SchedulerSimulator {
    /// Creates a simulator with the given quantum and process capacity
    ///
    /// # Panics
    ///
    /// Panics if `quantum` is not a positive finite number or `max_procs`
    /// is zero. Use [`SchedulerSimulator::with_config`] to get an error
    /// instead.
    pub fn new(quantum: f64, max_procs: usize) -> Self {
        match Self::with_config(SchedulerConfig::new(quantum, max_procs)) {
            Ok(simulator) => simulator,
            Err(e) => panic!("SchedulerSimulator::new(): {}", e),
        }
    }

    /// Creates a simulator from a validated configuration
    pub fn with_config(config: SchedulerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            pids: PidPool::new(config.max_procs),
            ready: ReadyQueue::new(),
            blocked: BlockedSet::new(),
            running: None,
            elapsed: 0.0,
            audit_log: Vec::new(),
            config,
        })
    }

    /// Admits a process, returning its pid
    ///
    /// Returns `None` when every pid is taken or the burst list is invalid;
    /// nothing changes in that case.
    pub fn add_process(&mut self, bursts: Vec<f64>) -> Option<Pid> {
        self.try_add_process(bursts).ok()
    }

    /// Admits a process at the back of the ready queue
    ///
    /// The process gets the smallest free pid. `bursts` alternates CPU and
    /// I/O durations, starting with CPU.
    pub fn try_add_process(&mut self, bursts: Vec<f64>) -> Result<Pid, AdmissionError> {
        validate_bursts(&bursts)?;

        let Some(pid) = self.pids.allocate() else {
            debug!(
                "admission rejected: all {} pids in use",
                self.pids.capacity()
            );
            return Err(AdmissionError::CapacityExhausted(self.pids.capacity()));
        };

        debug!("admitted pid {} with bursts {:?}", pid, bursts);
        self.ready.enqueue(Process::new(pid, bursts));
        self.audit_log.push(ScheduleEvent::ProcessAdmitted {
            pid,
            timestamp: self.elapsed,
        });
        Ok(pid)
    }

    /// Advances the simulation by `delta_time`
    ///
    /// May perform zero, one or many context switches. All blocked processes
    /// progress on their I/O in parallel.
    ///
    /// # Panics
    ///
    /// Panics if `delta_time` is negative or not finite, or if an internal
    /// invariant breaks (a non-positive time step or a runaway step count).
    pub fn advance_time(&mut self, delta_time: f64) {
        assert!(
            delta_time.is_finite() && delta_time >= 0.0,
            "SchedulerSimulator::advance_time(): invalid delta {}",
            delta_time
        );

        let mut remaining = delta_time;
        let mut steps: u64 = 0;

        while remaining > ALMOST_ZERO {
            if let Some(limit) = self.config.max_steps_per_advance {
                if steps >= limit {
                    error!(
                        "advance_time({}) exceeded {} sub-steps with {} left",
                        delta_time, limit, remaining
                    );
                    panic!("SchedulerSimulator::advance_time(): infinite loop");
                }
            }
            steps += 1;

            let classification = classify(self.running.as_ref());
            match classification.decision {
                Decision::Kill => self.kill_running(),
                Decision::Pause => self.pause_running(),
                Decision::Block => self.block_running(),
                Decision::Keep => {}
            }

            if classification.blocked_handling_needed() {
                self.reconcile_blocked();
            }
            if classification.dispatch_needed {
                self.dispatch_with_retry();
            }

            let timestep = self.next_timestep(remaining);
            assert!(
                timestep > 0.0,
                "SchedulerSimulator::advance_time(): timestep = {}",
                timestep
            );
            self.consume(timestep);
            remaining -= timestep;
        }

        #[cfg(debug_assertions)]
        self.check_invariants();
    }

    /// Size of the next sub-step: the distance to the nearest event
    fn next_timestep(&self, remaining: f64) -> f64 {
        match &self.running {
            Some(slot) => remaining
                .min(slot.remaining_quantum)
                .min(slot.process.head()),
            None => {
                // Reconciliation already promoted every finished I/O burst
                assert!(
                    self.blocked.iter().all(|p| p.head() >= ALMOST_ZERO),
                    "SchedulerSimulator::advance_time(): idle CPU with finished I/O pending"
                );
                self.blocked
                    .min_head()
                    .map_or(remaining, |head| remaining.min(head))
            }
        }
    }

    /// Moves every active duration forward by `timestep`
    fn consume(&mut self, timestep: f64) {
        if let Some(slot) = self.running.as_mut() {
            *slot.process.head_mut() -= timestep;
            slot.remaining_quantum -= timestep;
        }
        for process in self.blocked.iter_mut() {
            *process.head_mut() -= timestep;
        }
        self.elapsed += timestep;
    }

    /// Ready processes, front of the queue first
    pub fn ready_list(&self) -> Vec<ProcessSnapshot> {
        self.ready.iter().map(Process::snapshot).collect()
    }

    /// Blocked processes in the order they blocked
    ///
    /// I/O overshoot past zero is reported as zero.
    pub fn blocked_list(&self) -> Vec<ProcessSnapshot> {
        self.blocked.iter().map(Process::clamped_snapshot).collect()
    }

    /// The running process, if any
    pub fn running(&self) -> Option<ProcessSnapshot> {
        self.running.as_ref().map(|slot| slot.process.snapshot())
    }

    /// Ready, blocked and running views in one value
    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            elapsed: self.elapsed,
            ready: self.ready_list(),
            blocked: self.blocked_list(),
            running: self.running(),
        }
    }

    pub fn quantum(&self) -> f64 {
        self.config.quantum
    }

    pub fn max_procs(&self) -> usize {
        self.config.max_procs
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// CPU time left to the running process, if any
    pub fn remaining_quantum(&self) -> Option<f64> {
        self.running.as_ref().map(|slot| slot.remaining_quantum)
    }

    /// Pids available for admission, ascending
    pub fn free_pids(&self) -> Vec<Pid> {
        self.pids.free_pids()
    }

    /// Number of live processes
    pub fn process_count(&self) -> usize {
        self.ready.len() + self.blocked.len() + usize::from(self.running.is_some())
    }

    /// True when no process is live
    pub fn is_idle(&self) -> bool {
        self.process_count() == 0
    }

    /// Total simulated time advanced so far
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Current status of a live process
    pub fn status_of(&self, pid: Pid) -> Option<ProcessStatus> {
        if let Some(slot) = &self.running {
            if slot.process.pid() == pid {
                return Some(slot.process.status());
            }
        }
        self.ready
            .iter()
            .chain(self.blocked.iter())
            .find(|p| p.pid() == pid)
            .map(Process::status)
    }

    /// Returns a reference to the audit log
    pub fn audit_log(&self) -> &[ScheduleEvent] {
        &self.audit_log
    }

    /// Clears the audit log
    pub fn clear_audit_log(&mut self) {
        self.audit_log.clear();
    }

    /// Verifies the queue set against the pid pool
    ///
    /// # Panics
    ///
    /// Panics if a pid is live twice or is both live and free, if the pool
    /// and the live set do not add up to the capacity, or if a process sits
    /// in a queue that does not match its status or active burst kind.
    pub fn check_invariants(&self) {
        let mut live: Vec<Pid> = Vec::with_capacity(self.process_count());

        for process in self.ready.iter() {
            assert_eq!(process.status(), ProcessStatus::Ready, "pid {}", process.pid());
            assert_eq!(process.head_kind(), BurstKind::Cpu, "pid {}", process.pid());
            live.push(process.pid());
        }
        for process in self.blocked.iter() {
            assert_eq!(
                process.status(),
                ProcessStatus::Blocked,
                "pid {}",
                process.pid()
            );
            assert_eq!(process.head_kind(), BurstKind::Io, "pid {}", process.pid());
            live.push(process.pid());
        }
        if let Some(slot) = &self.running {
            assert_eq!(
                slot.process.status(),
                ProcessStatus::Running,
                "pid {}",
                slot.process.pid()
            );
            assert_eq!(
                slot.process.head_kind(),
                BurstKind::Cpu,
                "pid {}",
                slot.process.pid()
            );
            live.push(slot.process.pid());
        }

        assert!(
            live.len() <= self.pids.capacity(),
            "{} live processes exceed capacity {}",
            live.len(),
            self.pids.capacity()
        );
        for pid in &live {
            assert!(!self.pids.is_free(*pid), "pid {} is both live and free", pid);
        }

        live.sort_unstable();
        let before = live.len();
        live.dedup();
        assert_eq!(before, live.len(), "duplicate live pid");
        assert_eq!(
            live.len() + self.pids.available(),
            self.pids.capacity(),
            "pid pool out of sync with live processes"
        );
    }
}

/// Checks a burst list without admitting it
///
/// The list must be non-empty, end on a CPU burst (odd length) and hold only
/// finite, non-negative durations.
pub fn validate_bursts(bursts: &[f64]) -> Result<(), AdmissionError> {
    if bursts.is_empty() {
        return Err(AdmissionError::EmptyBursts);
    }
    if bursts.len() % 2 == 0 {
        return Err(AdmissionError::MissingFinalCpuBurst(bursts.len()));
    }
    if let Some((index, &value)) = bursts
        .iter()
        .enumerate()
        .find(|(_, b)| !b.is_finite() || **b < 0.0)
    {
        return Err(AdmissionError::InvalidBurst { index, value });
    }
    Ok(())
}
