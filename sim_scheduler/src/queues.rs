//! Queue set
//!
//! The ready queue, the blocked set, the running slot and the free pid pool.
//! These containers only move processes around; every scheduling rule lives
//! in the classifier and the transition executor.

use crate::process::{Pid, Process};
use std::collections::{BTreeSet, VecDeque};

/// Pool of pids not owned by any live process
///
/// Always hands out the smallest free pid.
#[derive(Debug, Clone)]
pub(crate) struct PidPool {
    free: BTreeSet<Pid>,
    capacity: usize,
}

impl PidPool {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            free: (1..=capacity).collect(),
            capacity,
        }
    }

    /// Takes the smallest free pid, if any
    pub(crate) fn allocate(&mut self) -> Option<Pid> {
        self.free.pop_first()
    }

    /// Returns a pid to the pool
    pub(crate) fn release(&mut self, pid: Pid) {
        assert!(
            (1..=self.capacity).contains(&pid),
            "PidPool::release(): pid {} outside 1..={}",
            pid,
            self.capacity
        );
        let inserted = self.free.insert(pid);
        assert!(inserted, "PidPool::release(): pid {} was already free", pid);
    }

    pub(crate) fn is_free(&self, pid: Pid) -> bool {
        self.free.contains(&pid)
    }

    pub(crate) fn available(&self) -> usize {
        self.free.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free pids in ascending order
    pub(crate) fn free_pids(&self) -> Vec<Pid> {
        self.free.iter().copied().collect()
    }
}

/// FIFO ready queue
///
/// Processes are enqueued at the back and dispatched from the front.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReadyQueue {
    queue: VecDeque<Process>,
}

impl ReadyQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enqueue(&mut self, process: Process) {
        self.queue.push_back(process);
    }

    pub(crate) fn dequeue(&mut self) -> Option<Process> {
        self.queue.pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Process> {
        self.queue.iter()
    }
}

/// Blocked processes, kept in insertion order
///
/// The order carries no scheduling meaning but keeps snapshots stable.
#[derive(Debug, Clone, Default)]
pub(crate) struct BlockedSet {
    processes: Vec<Process>,
}

impl BlockedSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, process: Process) {
        self.processes.push(process);
    }

    /// Removes a process by pid, keeping the relative order of the rest
    pub(crate) fn remove(&mut self, pid: Pid) -> Option<Process> {
        let index = self.processes.iter().position(|p| p.pid() == pid)?;
        Some(self.processes.remove(index))
    }

    pub(crate) fn get(&self, pid: Pid) -> Option<&Process> {
        self.processes.iter().find(|p| p.pid() == pid)
    }

    /// Pids in insertion order, detached from the set
    pub(crate) fn pids(&self) -> Vec<Pid> {
        self.processes.iter().map(Process::pid).collect()
    }

    /// Smallest remaining I/O time among blocked processes
    pub(crate) fn min_head(&self) -> Option<f64> {
        self.processes.iter().map(Process::head).reduce(f64::min)
    }

    pub(crate) fn len(&self) -> usize {
        self.processes.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Process> {
        self.processes.iter_mut()
    }
}

/// The CPU: the running process plus what is left of its quantum
#[derive(Debug, Clone)]
pub(crate) struct RunningSlot {
    pub(crate) process: Process,
    pub(crate) remaining_quantum: f64,
}

impl RunningSlot {
    pub(crate) fn new(process: Process, quantum: f64) -> Self {
        Self {
            process,
            remaining_quantum: quantum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_pool_allocates_smallest() {
        let mut pool = PidPool::new(3);
        assert_eq!(pool.allocate(), Some(1));
        assert_eq!(pool.allocate(), Some(2));

        pool.release(1);
        assert_eq!(pool.allocate(), Some(1));
        assert_eq!(pool.allocate(), Some(3));
        assert_eq!(pool.allocate(), None);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_pid_pool_free_pids_sorted() {
        let mut pool = PidPool::new(4);
        for _ in 0..4 {
            pool.allocate();
        }
        pool.release(3);
        pool.release(1);

        assert_eq!(pool.free_pids(), vec![1, 3]);
        assert!(pool.is_free(3));
        assert!(!pool.is_free(2));
        assert_eq!(pool.capacity(), 4);
    }

    #[test]
    #[should_panic(expected = "already free")]
    fn test_pid_pool_double_release_panics() {
        let mut pool = PidPool::new(2);
        pool.release(1);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_pid_pool_release_out_of_range_panics() {
        let mut pool = PidPool::new(2);
        pool.allocate();
        pool.release(5);
    }

    #[test]
    fn test_ready_queue_fifo() {
        let mut queue = ReadyQueue::new();
        queue.enqueue(Process::new(1, vec![1.0]));
        queue.enqueue(Process::new(2, vec![1.0]));
        queue.enqueue(Process::new(3, vec![1.0]));

        assert_eq!(queue.len(), 3);
        let order: Vec<Pid> = queue.iter().map(Process::pid).collect();
        assert_eq!(order, vec![1, 2, 3]);

        assert_eq!(queue.dequeue().map(|p| p.pid()), Some(1));
        assert_eq!(queue.dequeue().map(|p| p.pid()), Some(2));
        assert_eq!(queue.dequeue().map(|p| p.pid()), Some(3));
        assert!(queue.dequeue().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_blocked_set_remove_keeps_order() {
        let mut blocked = BlockedSet::new();
        blocked.insert(Process::new(4, vec![1.0, 3.0]));
        blocked.insert(Process::new(2, vec![1.0, 1.0]));
        blocked.insert(Process::new(7, vec![1.0, 2.0]));

        let removed = blocked.remove(2);
        assert_eq!(removed.map(|p| p.pid()), Some(2));
        assert_eq!(blocked.pids(), vec![4, 7]);
        assert!(blocked.get(2).is_none());
        assert!(blocked.remove(2).is_none());
        assert_eq!(blocked.len(), 2);
    }

    #[test]
    fn test_blocked_set_min_head() {
        let mut blocked = BlockedSet::new();
        assert_eq!(blocked.min_head(), None);

        blocked.insert(Process::new(1, vec![3.0, 1.0]));
        blocked.insert(Process::new(2, vec![0.5, 1.0]));
        assert_eq!(blocked.min_head(), Some(0.5));

        for process in blocked.iter_mut() {
            *process.head_mut() -= 0.25;
        }
        assert_eq!(blocked.min_head(), Some(0.25));
    }

    #[test]
    fn test_running_slot_starts_with_full_quantum() {
        let slot = RunningSlot::new(Process::new(1, vec![5.0]), 2.0);
        assert_eq!(slot.remaining_quantum, 2.0);
        assert_eq!(slot.process.pid(), 1);
    }
}
