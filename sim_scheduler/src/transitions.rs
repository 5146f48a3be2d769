//! Transition executor
//!
//! Each transition moves one process between the running slot and the
//! queues. Preconditions are asserted: a violation means the clock asked for
//! a transition that the classifier would never have produced.

use crate::audit::{PreemptionReason, ScheduleEvent};
use crate::process::{Pid, ProcessStatus};
use crate::queues::RunningSlot;
use crate::scheduler::SchedulerSimulator;
use crate::ALMOST_ZERO;
use log::trace;

impl SchedulerSimulator {
    /// Terminates the running process and frees its pid
    pub(crate) fn kill_running(&mut self) {
        let Some(slot) = self.running.take() else {
            panic!("SchedulerSimulator::kill_running(): There is no running process");
        };
        let process = slot.process;
        assert!(
            process.is_final_burst(),
            "SchedulerSimulator::kill_running(): pid {} still has bursts",
            process.pid()
        );
        assert!(
            process.head() <= ALMOST_ZERO,
            "SchedulerSimulator::kill_running(): pid {} has not finished yet",
            process.pid()
        );

        let pid = process.pid();
        self.pids.release(pid);
        trace!("t={:.6} kill pid {}", self.elapsed, pid);
        self.audit_log.push(ScheduleEvent::ProcessExited {
            pid,
            timestamp: self.elapsed,
        });
    }

    /// Sends the running process to the back of the ready queue
    pub(crate) fn pause_running(&mut self) {
        let Some(slot) = self.running.take() else {
            panic!("SchedulerSimulator::pause_running(): There is no running process");
        };
        assert!(
            slot.remaining_quantum < ALMOST_ZERO,
            "SchedulerSimulator::pause_running(): Quantum has not expired yet"
        );

        let mut process = slot.process;
        let pid = process.pid();
        process.set_status(ProcessStatus::Ready);
        self.ready.enqueue(process);
        trace!("t={:.6} pause pid {}", self.elapsed, pid);
        self.audit_log.push(ScheduleEvent::ProcessPreempted {
            pid,
            reason: PreemptionReason::QuantumExpired,
            timestamp: self.elapsed,
        });
    }

    /// Moves the running process to the blocked set, starting its I/O burst
    pub(crate) fn block_running(&mut self) {
        let Some(slot) = self.running.take() else {
            panic!("SchedulerSimulator::block_running(): There is no running process");
        };
        let mut process = slot.process;
        assert!(
            process.head() < ALMOST_ZERO,
            "SchedulerSimulator::block_running(): pid {} has not finished yet",
            process.pid()
        );

        process.pop_head();
        process.set_status(ProcessStatus::Blocked);
        let pid = process.pid();
        self.blocked.insert(process);
        trace!("t={:.6} block pid {}", self.elapsed, pid);
        self.audit_log.push(ScheduleEvent::ProcessPreempted {
            pid,
            reason: PreemptionReason::Blocked,
            timestamp: self.elapsed,
        });
    }

    /// Moves a blocked process whose I/O is done to the back of the ready queue
    pub(crate) fn ready_blocked(&mut self, pid: Pid, threshold: f64) {
        let Some(process) = self.blocked.get(pid) else {
            panic!("SchedulerSimulator::ready_blocked(): pid {} is not blocked", pid);
        };
        assert!(
            process.head() < threshold,
            "SchedulerSimulator::ready_blocked(): pid {} has not finished yet",
            pid
        );

        let Some(mut process) = self.blocked.remove(pid) else {
            unreachable!();
        };
        process.pop_head();
        process.set_status(ProcessStatus::Ready);
        self.ready.enqueue(process);
        trace!("t={:.6} wake pid {}", self.elapsed, pid);
        self.audit_log.push(ScheduleEvent::ProcessWoken {
            pid,
            timestamp: self.elapsed,
        });
    }

    /// Puts the front of the ready queue on the CPU with a fresh quantum
    pub(crate) fn dispatch_next(&mut self) {
        assert!(
            self.running.is_none(),
            "SchedulerSimulator::dispatch_next(): There is already a running process"
        );
        let Some(mut process) = self.ready.dequeue() else {
            panic!("SchedulerSimulator::dispatch_next(): There are no ready processes");
        };

        process.set_status(ProcessStatus::Running);
        let pid = process.pid();
        self.running = Some(RunningSlot::new(process, self.config.quantum));
        trace!("t={:.6} dispatch pid {}", self.elapsed, pid);
        self.audit_log.push(ScheduleEvent::ProcessSelected {
            pid,
            timestamp: self.elapsed,
        });
    }

    /// Completion threshold for blocked I/O bursts
    ///
    /// With ready work queued, a burst sitting at exactly zero is left for a
    /// later reconciliation. With nothing ready it completes now, so the idle
    /// CPU can pick it up in the same sub-step.
    pub(crate) fn completion_threshold(&self) -> f64 {
        if self.ready.is_empty() {
            ALMOST_ZERO
        } else {
            -ALMOST_ZERO
        }
    }

    /// Promotes every blocked process whose I/O burst has completed
    pub(crate) fn reconcile_blocked(&mut self) {
        let threshold = self.completion_threshold();
        for pid in self.blocked.pids() {
            let done = self
                .blocked
                .get(pid)
                .is_some_and(|process| process.head() < threshold);
            if done {
                self.ready_blocked(pid, threshold);
            }
        }
    }

    /// Dispatches until a process with CPU work left holds the CPU
    ///
    /// A process can reach the front of the ready queue with its CPU burst
    /// already used up (it was paused on the same boundary). It is moved on
    /// immediately instead of running for a zero-length step. If that drains
    /// the ready queue, I/O left at zero by the earlier reconciliation is
    /// promoted and dispatch is retried, so the CPU never idles on finished
    /// I/O.
    pub(crate) fn dispatch_with_retry(&mut self) {
        loop {
            while self.running.is_none() && !self.ready.is_empty() {
                self.dispatch_next();

                let Some(slot) = self.running.as_ref() else {
                    unreachable!();
                };
                if slot.process.head() < ALMOST_ZERO {
                    if slot.process.is_final_burst() {
                        self.kill_running();
                    } else {
                        self.block_running();
                    }
                }
            }

            let finished_io = self.blocked.iter().any(|p| p.head() < ALMOST_ZERO);
            if self.running.is_some() || !finished_io {
                break;
            }
            self.reconcile_blocked();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::audit::{PreemptionReason, ScheduleEvent};
    use crate::process::{ProcessSnapshot, ProcessStatus};
    use crate::scheduler::SchedulerSimulator;
    use crate::ALMOST_ZERO;

    fn snap(pid: usize, bursts: &[f64]) -> ProcessSnapshot {
        ProcessSnapshot {
            pid,
            bursts: bursts.to_vec(),
        }
    }

    #[test]
    fn test_dispatch_resets_quantum() {
        let mut simulator = SchedulerSimulator::new(2.0, 2);
        simulator.add_process(vec![5.0]);
        simulator.dispatch_next();

        assert_eq!(simulator.running(), Some(snap(1, &[5.0])));
        assert_eq!(simulator.remaining_quantum(), Some(2.0));
        assert_eq!(simulator.status_of(1), Some(ProcessStatus::Running));
    }

    #[test]
    #[should_panic(expected = "There are no ready processes")]
    fn test_dispatch_empty_queue_panics() {
        let mut simulator = SchedulerSimulator::new(1.0, 1);
        simulator.dispatch_next();
    }

    #[test]
    #[should_panic(expected = "There is no running process")]
    fn test_kill_without_running_panics() {
        let mut simulator = SchedulerSimulator::new(1.0, 1);
        simulator.kill_running();
    }

    #[test]
    #[should_panic(expected = "still has bursts")]
    fn test_kill_with_pending_io_panics() {
        let mut simulator = SchedulerSimulator::new(1.0, 1);
        simulator.add_process(vec![0.0, 1.0, 1.0]);
        simulator.dispatch_next();
        simulator.kill_running();
    }

    #[test]
    #[should_panic(expected = "Quantum has not expired yet")]
    fn test_pause_before_quantum_expiry_panics() {
        let mut simulator = SchedulerSimulator::new(1.0, 1);
        simulator.add_process(vec![2.0]);
        simulator.dispatch_next();
        simulator.pause_running();
    }

    #[test]
    #[should_panic(expected = "has not finished yet")]
    fn test_block_unfinished_burst_panics() {
        let mut simulator = SchedulerSimulator::new(1.0, 1);
        simulator.add_process(vec![2.0, 1.0, 1.0]);
        simulator.dispatch_next();
        simulator.block_running();
    }

    #[test]
    #[should_panic(expected = "is not blocked")]
    fn test_ready_unknown_pid_panics() {
        let mut simulator = SchedulerSimulator::new(1.0, 1);
        simulator.ready_blocked(1, ALMOST_ZERO);
    }

    #[test]
    fn test_block_pops_cpu_burst() {
        let mut simulator = SchedulerSimulator::new(1.0, 1);
        simulator.add_process(vec![0.0, 2.0, 1.0]);
        simulator.dispatch_next();
        simulator.block_running();

        assert_eq!(simulator.running(), None);
        assert_eq!(simulator.blocked_list(), vec![snap(1, &[2.0, 1.0])]);
        assert_eq!(simulator.status_of(1), Some(ProcessStatus::Blocked));
    }

    #[test]
    fn test_ready_pops_io_burst() {
        let mut simulator = SchedulerSimulator::new(1.0, 1);
        simulator.add_process(vec![0.0, 0.0, 3.0]);
        simulator.dispatch_next();
        simulator.block_running();
        simulator.ready_blocked(1, ALMOST_ZERO);

        assert!(simulator.blocked_list().is_empty());
        assert_eq!(simulator.ready_list(), vec![snap(1, &[3.0])]);
    }

    #[test]
    fn test_completion_threshold_depends_on_ready_queue() {
        let mut simulator = SchedulerSimulator::new(1.0, 2);
        assert_eq!(simulator.completion_threshold(), ALMOST_ZERO);

        simulator.add_process(vec![1.0]);
        assert_eq!(simulator.completion_threshold(), -ALMOST_ZERO);
    }

    #[test]
    fn test_reconcile_keeps_zero_io_when_ready_nonempty() {
        let mut simulator = SchedulerSimulator::new(1.0, 2);
        simulator.add_process(vec![0.0, 0.0, 1.0]);
        simulator.dispatch_next();
        simulator.block_running();
        simulator.add_process(vec![1.0]);

        simulator.reconcile_blocked();
        assert_eq!(simulator.blocked_list(), vec![snap(1, &[0.0, 1.0])]);
        assert_eq!(simulator.ready_list(), vec![snap(2, &[1.0])]);
    }

    #[test]
    fn test_reconcile_promotes_zero_io_when_ready_empty() {
        let mut simulator = SchedulerSimulator::new(1.0, 2);
        simulator.add_process(vec![0.0, 0.0, 1.0]);
        simulator.dispatch_next();
        simulator.block_running();

        simulator.reconcile_blocked();
        assert!(simulator.blocked_list().is_empty());
        assert_eq!(simulator.ready_list(), vec![snap(1, &[1.0])]);
    }

    #[test]
    fn test_dispatch_retry_skips_finished_cpu_burst() {
        let mut simulator = SchedulerSimulator::new(1.0, 3);
        simulator.add_process(vec![0.0, 2.0, 1.0]);
        simulator.add_process(vec![0.0]);
        simulator.add_process(vec![3.0]);

        simulator.dispatch_with_retry();

        assert_eq!(simulator.running(), Some(snap(3, &[3.0])));
        assert_eq!(simulator.blocked_list(), vec![snap(1, &[2.0, 1.0])]);
        assert_eq!(simulator.free_pids(), vec![2]);
        assert!(simulator.ready_list().is_empty());

        let reasons: Vec<&ScheduleEvent> = simulator
            .audit_log()
            .iter()
            .filter(|e| matches!(e, ScheduleEvent::ProcessPreempted { .. }))
            .collect();
        assert_eq!(reasons.len(), 1);
        assert!(matches!(
            reasons[0],
            ScheduleEvent::ProcessPreempted {
                pid: 1,
                reason: PreemptionReason::Blocked,
                ..
            }
        ));
    }

    #[test]
    fn test_dispatch_retry_exhausts_queue() {
        let mut simulator = SchedulerSimulator::new(1.0, 1);
        simulator.add_process(vec![0.0, 1.0, 1.0]);

        simulator.dispatch_with_retry();
        assert_eq!(simulator.running(), None);
        assert_eq!(simulator.blocked_list(), vec![snap(1, &[1.0, 1.0])]);
    }

    #[test]
    fn test_dispatch_retry_promotes_zero_io_once_cpu_idles() {
        let mut simulator = SchedulerSimulator::new(1.0, 2);
        simulator.add_process(vec![0.0, 0.0, 1.0]);
        simulator.dispatch_next();
        simulator.block_running();
        simulator.add_process(vec![0.0]);

        simulator.reconcile_blocked();
        assert_eq!(simulator.blocked_list(), vec![snap(1, &[0.0, 1.0])]);

        simulator.dispatch_with_retry();
        assert_eq!(simulator.running(), Some(snap(1, &[1.0])));
        assert!(simulator.blocked_list().is_empty());
        assert_eq!(simulator.free_pids(), vec![2]);
    }
}
