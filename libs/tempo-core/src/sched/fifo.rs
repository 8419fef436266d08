//! First in, first out

use super::{advance, Schedule, Scheduler};
use crate::error::Result;
use crate::queue::ArrivalQueue;
use tracing::{debug, trace};

/// Non-preemptive arrival-order scheduler
#[derive(Debug, Clone, Copy, Default)]
pub struct Fifo;

impl Scheduler for Fifo {
    fn name(&self) -> &'static str {
        "FIFO"
    }

    fn schedule(&self, mut workload: ArrivalQueue) -> Result<Schedule> {
        let mut schedule = Schedule::with_capacity(workload.len());
        let mut now = 0;

        while let Ok(mut process) = workload.pop() {
            process.validate()?;
            if process.arrival > now {
                debug!("FIFO idle until {}", process.arrival);
                now = process.arrival;
            }

            process.dispatch(now);
            let ran = process.run_for(process.remaining);
            let end = advance(now, ran, process.pid)?;
            trace!("FIFO ran {} for [{}, {})", process.pid, now, end);
            schedule.record(process.pid, now, end);
            now = end;

            process.finish(now);
            schedule.complete(process);
        }

        Ok(schedule)
    }
}
