//! Shortest time to completion first

use super::{advance, Schedule, Scheduler, ShortestFirst};
use crate::error::Result;
use crate::queue::ArrivalQueue;
use std::collections::BinaryHeap;
use tracing::{debug, trace};

/// Preemptive shortest-remaining-time scheduler
///
/// The selected process runs until it finishes or the next process arrives,
/// whichever comes first; every arrival forces a fresh selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stcf;

impl Scheduler for Stcf {
    fn name(&self) -> &'static str {
        "STCF"
    }

    fn schedule(&self, mut workload: ArrivalQueue) -> Result<Schedule> {
        let mut schedule = Schedule::with_capacity(workload.len());
        let mut ready = BinaryHeap::new();
        let mut now = 0;

        loop {
            while let Some(process) = workload.pop_arrived(now) {
                process.validate()?;
                ready.push(ShortestFirst(process));
            }

            let Some(ShortestFirst(mut process)) = ready.pop() else {
                match workload.next_arrival() {
                    Some(next) => {
                        debug!("STCF idle until {}", next);
                        now = next;
                        continue;
                    }
                    None => break,
                }
            };

            process.dispatch(now);

            // Everything due by `now` was admitted above, so the next arrival is strictly later
            let budget = match workload.next_arrival() {
                Some(next) => process.remaining.min(next - now),
                None => process.remaining,
            };
            let ran = process.run_for(budget);
            let end = advance(now, ran, process.pid)?;
            trace!("STCF ran {} for [{}, {})", process.pid, now, end);
            schedule.record(process.pid, now, end);
            now = end;

            if process.is_complete() {
                process.finish(now);
                schedule.complete(process);
            } else {
                ready.push(ShortestFirst(process));
            }
        }

        Ok(schedule)
    }
}
