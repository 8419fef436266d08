//! Round robin

use super::{advance, Schedule, Scheduler};
use crate::error::{Result, SchedError};
use crate::queue::ArrivalQueue;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Fixed-quantum round-robin scheduler
#[derive(Debug, Clone, Copy)]
pub struct RoundRobin {
    quantum: u64,
}

impl RoundRobin {
    /// Create a scheduler with the given quantum (clamped to at least 1)
    pub fn new(quantum: u64) -> Self {
        Self {
            quantum: quantum.max(1),
        }
    }

    /// Create a scheduler, rejecting a zero quantum
    pub fn try_new(quantum: u64) -> Result<Self> {
        if quantum == 0 {
            return Err(SchedError::InvalidConfig("rr_quantum must be positive".into()));
        }
        Ok(Self { quantum })
    }

    /// Time quantum
    pub fn quantum(&self) -> u64 {
        self.quantum
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Scheduler for RoundRobin {
    fn name(&self) -> &'static str {
        "RR"
    }

    fn schedule(&self, mut workload: ArrivalQueue) -> Result<Schedule> {
        let mut schedule = Schedule::with_capacity(workload.len());
        let mut ready = VecDeque::with_capacity(workload.len());
        let mut now = 0;

        loop {
            while let Some(process) = workload.pop_arrived(now) {
                process.validate()?;
                ready.push_back(process);
            }

            let Some(mut process) = ready.pop_front() else {
                match workload.next_arrival() {
                    Some(next) => {
                        debug!("RR idle until {}", next);
                        now = next;
                        continue;
                    }
                    None => break,
                }
            };

            process.dispatch(now);
            let ran = process.run_for(self.quantum);
            let end = advance(now, ran, process.pid)?;
            trace!("RR ran {} for [{}, {})", process.pid, now, end);
            schedule.record(process.pid, now, end);
            now = end;

            // Arrivals during the slice queue ahead of the preempted process
            while let Some(arrived) = workload.pop_arrived(now) {
                arrived.validate()?;
                ready.push_back(arrived);
            }

            if process.is_complete() {
                process.finish(now);
                schedule.complete(process);
            } else {
                ready.push_back(process);
            }
        }

        Ok(schedule)
    }
}
