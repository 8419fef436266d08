//! Scheduling policies
//!
//! ## Policies
//!
//! - FIFO: run to completion in arrival order
//! - SJF: run the shortest arrived job to completion
//! - STCF: preemptive shortest remaining time, re-evaluated on every arrival
//! - RR: fixed quantum, FIFO ready queue
//! - CFS: weighted virtual runtime over a red-black tree
//!
//! Every scheduler consumes its own [`ArrivalQueue`] and drives a simulated
//! clock. Nothing here blocks or sleeps.

mod cfs;
mod fifo;
mod rr;
mod sjf;
mod stcf;

pub use cfs::{calc_vruntime_delta, Cfs};
pub use fifo::Fifo;
pub use rr::RoundRobin;
pub use sjf::Sjf;
pub use stcf::Stcf;

use crate::config::SchedConfig;
use crate::error::{Result, SchedError};
use crate::process::{Pid, Process};
use crate::queue::ArrivalQueue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Contiguous stretch of CPU time given to one process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    /// Process that ran
    pub pid: Pid,
    /// Start of the slice
    pub start: u64,
    /// End of the slice (exclusive)
    pub end: u64,
}

impl Slice {
    /// Length of the slice
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Whether the slice covers no time
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Output of one simulation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Finished processes in completion order
    pub completed: Vec<Process>,
    /// Every slice issued, in time order
    pub timeline: Vec<Slice>,
}

impl Schedule {
    /// Create an empty schedule sized for `n` processes
    pub fn with_capacity(n: usize) -> Self {
        Self {
            completed: Vec::with_capacity(n),
            timeline: Vec::with_capacity(n),
        }
    }

    /// Time at which the last process finished
    pub fn makespan(&self) -> u64 {
        self.timeline.last().map_or(0, |s| s.end)
    }

    /// Total CPU time handed to one process
    pub fn cpu_time(&self, pid: Pid) -> u64 {
        self.timeline.iter().filter(|s| s.pid == pid).map(Slice::len).sum()
    }

    /// Record a slice, merging it with the previous one if it continues it
    pub(crate) fn record(&mut self, pid: Pid, start: u64, end: u64) {
        if start == end {
            return;
        }
        if let Some(last) = self.timeline.last_mut() {
            if last.pid == pid && last.end == start {
                last.end = end;
                return;
            }
        }
        self.timeline.push(Slice { pid, start, end });
    }

    pub(crate) fn complete(&mut self, process: Process) {
        self.completed.push(process);
    }
}

/// Advance the simulated clock past a slice
pub(crate) fn advance(now: u64, ran: u64, pid: Pid) -> Result<u64> {
    now.checked_add(ran).ok_or_else(|| {
        SchedError::InvalidProcess(format!("process {} runs past the end of simulated time", pid))
    })
}

/// A scheduling discipline
pub trait Scheduler {
    /// Short display name
    fn name(&self) -> &'static str;

    /// Simulate the workload to completion
    fn schedule(&self, workload: ArrivalQueue) -> Result<Schedule>;

    /// Simulate and return only the finished processes, in completion order
    fn run(&self, workload: ArrivalQueue) -> Result<Vec<Process>> {
        Ok(self.schedule(workload)?.completed)
    }
}

/// Policy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    Fifo,
    Sjf,
    Stcf,
    #[serde(rename = "rr")]
    RoundRobin,
    Cfs,
}

impl Policy {
    /// Every supported policy
    pub const ALL: [Policy; 5] = [
        Policy::Fifo,
        Policy::Sjf,
        Policy::Stcf,
        Policy::RoundRobin,
        Policy::Cfs,
    ];

    /// Policies run by a comparison
    pub const COMPARED: [Policy; 3] = [Policy::Stcf, Policy::RoundRobin, Policy::Cfs];

    /// Command-line name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fifo => "fifo",
            Self::Sjf => "sjf",
            Self::Stcf => "stcf",
            Self::RoundRobin => "rr",
            Self::Cfs => "cfs",
        }
    }

    /// Build the scheduler for this policy
    pub fn scheduler(&self, config: &SchedConfig) -> Result<Box<dyn Scheduler>> {
        config.validate()?;
        Ok(match self {
            Self::Fifo => Box::new(Fifo),
            Self::Sjf => Box::new(Sjf),
            Self::Stcf => Box::new(Stcf),
            Self::RoundRobin => Box::new(RoundRobin::try_new(config.rr_quantum)?),
            Self::Cfs => Box::new(Cfs::new(config.clone())?),
        })
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" | "fcfs" => Ok(Self::Fifo),
            "sjf" => Ok(Self::Sjf),
            "stcf" | "srtf" => Ok(Self::Stcf),
            "rr" | "round-robin" => Ok(Self::RoundRobin),
            "cfs" => Ok(Self::Cfs),
            other => Err(SchedError::InvalidConfig(format!("unknown policy '{}'", other))),
        }
    }
}

/// Ready-set entry for shortest-first policies
///
/// Ordered so a max-heap pops the smallest remaining time, then the earliest
/// arrival, then the lowest pid.
#[derive(Debug)]
pub(crate) struct ShortestFirst(pub Process);

impl ShortestFirst {
    fn key(&self) -> (u64, u64, Pid) {
        (self.0.remaining, self.0.arrival, self.0.pid)
    }
}

impl PartialEq for ShortestFirst {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ShortestFirst {}

impl PartialOrd for ShortestFirst {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ShortestFirst {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}
