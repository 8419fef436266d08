//! Process record shared by every scheduling policy

use crate::config::{nice_to_weight, NICE_0_WEIGHT};
use crate::error::{Result, SchedError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process identifier, assigned at intake
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One schedulable unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    /// Process ID
    pub pid: Pid,
    /// Arrival time
    pub arrival: u64,
    /// Total CPU time requested
    pub duration: u64,
    /// CPU time still owed
    pub remaining: u64,
    /// Time of first dispatch
    pub first_run: Option<u64>,
    /// Time the last unit of work finished
    pub completion: Option<u64>,
    /// Nice value (-20 to 19, clamped for the weight lookup)
    pub nice: i32,
    /// Load weight derived from the nice value
    pub weight: u32,
    /// Accumulated weighted runtime
    pub vruntime: f64,
    /// Whether the process mostly waits on I/O
    pub io_bound: bool,
    /// Share of time spent in I/O (0.0-1.0)
    pub io_ratio: f64,
}

impl Process {
    /// Create a CPU-bound nice-0 process
    pub fn new(pid: Pid, arrival: u64, duration: u64) -> Self {
        Self {
            pid,
            arrival,
            duration,
            remaining: duration,
            first_run: None,
            completion: None,
            nice: 0,
            weight: NICE_0_WEIGHT,
            vruntime: 0.0,
            io_bound: false,
            io_ratio: 0.0,
        }
    }

    /// Set the nice value and derive the weight from the fixed table
    pub fn with_nice(mut self, nice: i32) -> Self {
        self.nice = nice;
        self.weight = nice_to_weight(nice);
        self
    }

    /// Set I/O behavior. The ratio is clamped into [0, 1].
    pub fn with_io(mut self, io_bound: bool, io_ratio: f64) -> Self {
        self.io_bound = io_bound;
        self.io_ratio = if io_ratio.is_nan() { 0.0 } else { io_ratio.clamp(0.0, 1.0) };
        self
    }

    /// Reject records the schedulers cannot make progress on
    pub fn validate(&self) -> Result<()> {
        if self.duration == 0 {
            return Err(SchedError::InvalidProcess(format!("process {} has zero duration", self.pid)));
        }
        if self.weight == 0 {
            return Err(SchedError::InvalidProcess(format!("process {} has zero weight", self.pid)));
        }
        if self.arrival.checked_add(self.duration).is_none() {
            return Err(SchedError::InvalidProcess(format!(
                "process {} cannot finish within simulated time",
                self.pid
            )));
        }
        Ok(())
    }

    /// Whether all requested CPU time has been delivered
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    /// Completion minus arrival
    pub fn turnaround(&self) -> Option<u64> {
        self.completion.map(|c| c - self.arrival)
    }

    /// First run minus arrival
    pub fn response(&self) -> Option<u64> {
        self.first_run.map(|f| f - self.arrival)
    }

    /// Record the first dispatch; later calls are ignored
    pub(crate) fn dispatch(&mut self, now: u64) {
        if self.first_run.is_none() {
            self.first_run = Some(now);
        }
    }

    /// Consume CPU time, returning how much was actually used
    pub(crate) fn run_for(&mut self, budget: u64) -> u64 {
        let ran = budget.min(self.remaining);
        self.remaining -= ran;
        ran
    }

    /// Stamp completion time
    pub(crate) fn finish(&mut self, now: u64) {
        debug_assert!(self.completion.is_none(), "process {} completed twice", self.pid);
        debug_assert_eq!(self.remaining, 0);
        self.completion = Some(now);
    }
}
