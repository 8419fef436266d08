//! Arrival ordering (earliest arrival first)

use crate::error::{Result, SchedError};
use crate::process::Process;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Entry in the arrival queue
#[derive(Clone, Debug)]
struct ArrivalEntry(Process);

impl ArrivalEntry {
    fn key(&self) -> (u64, u64, crate::Pid) {
        (self.0.arrival, self.0.duration, self.0.pid)
    }
}

// Reverse ordering for min-heap (earliest arrival, then shortest, then lowest pid)
impl PartialEq for ArrivalEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ArrivalEntry {}

impl PartialOrd for ArrivalEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ArrivalEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// Min-priority queue of not-yet-admitted processes
#[derive(Clone, Debug, Default)]
pub struct ArrivalQueue {
    heap: BinaryHeap<ArrivalEntry>,
}

impl ArrivalQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Add a process
    pub fn push(&mut self, process: Process) {
        self.heap.push(ArrivalEntry(process));
    }

    /// Earliest process without removing it
    pub fn peek(&self) -> Result<&Process> {
        self.heap.peek().map(|e| &e.0).ok_or(SchedError::EmptyQueue)
    }

    /// Remove and return the earliest process
    pub fn pop(&mut self) -> Result<Process> {
        self.heap.pop().map(|e| e.0).ok_or(SchedError::EmptyQueue)
    }

    /// Arrival time of the earliest queued process
    pub fn next_arrival(&self) -> Option<u64> {
        self.heap.peek().map(|e| e.0.arrival)
    }

    /// Pop the earliest process if it has arrived by `now`
    pub fn pop_arrived(&mut self, now: u64) -> Option<Process> {
        match self.next_arrival() {
            Some(arrival) if arrival <= now => self.heap.pop().map(|e| e.0),
            _ => None,
        }
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Get queue length
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Drain in arrival order
    pub fn into_sorted_vec(self) -> Vec<Process> {
        // BinaryHeap sorts ascending by Ord, which is reversed here
        let mut entries = self.heap.into_sorted_vec();
        entries.reverse();
        entries.into_iter().map(|e| e.0).collect()
    }
}

impl FromIterator<Process> for ArrivalQueue {
    fn from_iter<I: IntoIterator<Item = Process>>(iter: I) -> Self {
        Self {
            heap: iter.into_iter().map(ArrivalEntry).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pid;

    #[test]
    fn test_orders_by_arrival_then_duration() {
        let mut queue = ArrivalQueue::new();
        queue.push(Process::new(Pid(1), 5, 1));
        queue.push(Process::new(Pid(2), 0, 8));
        queue.push(Process::new(Pid(3), 0, 2));

        assert_eq!(queue.pop().unwrap().pid, Pid(3));
        assert_eq!(queue.pop().unwrap().pid, Pid(2));
        assert_eq!(queue.pop().unwrap().pid, Pid(1));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_empty_queue_errors() {
        let mut queue = ArrivalQueue::new();
        assert_eq!(queue.peek().unwrap_err(), SchedError::EmptyQueue);
        assert_eq!(queue.pop().unwrap_err(), SchedError::EmptyQueue);
        assert_eq!(queue.next_arrival(), None);
    }

    #[test]
    fn test_pop_arrived_respects_clock() {
        let mut queue: ArrivalQueue = [
            Process::new(Pid(1), 0, 3),
            Process::new(Pid(2), 4, 3),
        ]
        .into_iter()
        .collect();

        assert_eq!(queue.pop_arrived(0).map(|p| p.pid), Some(Pid(1)));
        assert!(queue.pop_arrived(3).is_none());
        assert_eq!(queue.peek().unwrap().pid, Pid(2));
        assert_eq!(queue.pop_arrived(4).map(|p| p.pid), Some(Pid(2)));
    }

    #[test]
    fn test_into_sorted_vec_in_arrival_order() {
        let queue: ArrivalQueue = [
            Process::new(Pid(1), 9, 1),
            Process::new(Pid(2), 1, 1),
            Process::new(Pid(3), 4, 1),
        ]
        .into_iter()
        .collect();

        let pids: Vec<_> = queue.into_sorted_vec().into_iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![Pid(2), Pid(3), Pid(1)]);
    }
}
