//! Scheduler Integration Test Utilities
//!
//! Shared helpers for the cross-crate scheduler tests.
//!
//! ## Test Philosophy
//!
//! - **Invariants after every call**: Pid accounting is checked, not assumed
//! - **Binary-exact times**: Durations are sums of powers of two, so float
//!   comparisons are exact
//! - **Observable state only**: Tests go through the query surface

use sim_scheduler::{Pid, ProcessSnapshot, SchedulerSimulator};

/// Creates a simulator and admits every burst list in order
///
/// Panics if any admission is rejected.
pub fn test_simulator(quantum: f64, max_procs: usize, processes: &[&[f64]]) -> SchedulerSimulator {
    let mut simulator = SchedulerSimulator::new(quantum, max_procs);
    for bursts in processes {
        simulator
            .add_process(bursts.to_vec())
            .unwrap_or_else(|| panic!("admission of {:?} rejected", bursts));
    }
    simulator
}

/// Builds the expected snapshot of one process
pub fn snap(pid: Pid, bursts: &[f64]) -> ProcessSnapshot {
    ProcessSnapshot {
        pid,
        bursts: bursts.to_vec(),
    }
}

/// Live pids across the ready queue, the blocked set and the CPU, sorted
pub fn live_pids(simulator: &SchedulerSimulator) -> Vec<Pid> {
    let mut pids: Vec<Pid> = simulator
        .ready_list()
        .iter()
        .chain(simulator.blocked_list().iter())
        .chain(simulator.running().iter())
        .map(|p| p.pid)
        .collect();
    pids.sort_unstable();
    pids
}

/// Asserts that live and free pids partition `1..=max_procs`
pub fn assert_pid_partition(simulator: &SchedulerSimulator) {
    let live = live_pids(simulator);
    let free = simulator.free_pids();
    assert!(live.len() <= simulator.max_procs());

    let mut all: Vec<Pid> = live.iter().chain(free.iter()).copied().collect();
    all.sort_unstable();
    let expected: Vec<Pid> = (1..=simulator.max_procs()).collect();
    assert_eq!(all, expected, "live {:?} free {:?}", live, free);
}

/// Asserts a process list against `(pid, bursts)` pairs, bursts within `1e-9`
///
/// For durations that are not exact in binary, such as 0.1 or 0.3.
pub fn assert_close(actual: &[ProcessSnapshot], expected: &[(Pid, &[f64])]) {
    let pids: Vec<Pid> = actual.iter().map(|p| p.pid).collect();
    let expected_pids: Vec<Pid> = expected.iter().map(|(pid, _)| *pid).collect();
    assert_eq!(pids, expected_pids);

    for (process, (_, bursts)) in actual.iter().zip(expected) {
        assert_eq!(process.bursts.len(), bursts.len(), "pid {}", process.pid);
        for (got, want) in process.bursts.iter().zip(bursts.iter()) {
            assert!(
                (got - want).abs() < 1e-9,
                "pid {}: {:?} != {:?}",
                process.pid,
                process.bursts,
                bursts
            );
        }
    }
}
