//! Shortest job first

use super::{advance, Schedule, Scheduler, ShortestFirst};
use crate::error::Result;
use crate::queue::ArrivalQueue;
use std::collections::BinaryHeap;
use tracing::{debug, trace};

/// Non-preemptive shortest-duration scheduler
#[derive(Debug, Clone, Copy, Default)]
pub struct Sjf;

impl Scheduler for Sjf {
    fn name(&self) -> &'static str {
        "SJF"
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
                        debug!("SJF idle until {}", next);
                        now = next;
                        continue;
                    }
                    None => break,
                }
            };

            process.dispatch(now);
            let ran = process.run_for(process.remaining);
            let end = advance(now, ran, process.pid)?;
            trace!("SJF ran {} for [{}, {})", process.pid, now, end);
            schedule.record(process.pid, now, end);
            now = end;

            process.finish(now);
            schedule.complete(process);
        }

        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pid, Process};

    #[test]
    fn test_sjf_picks_shortest_arrived() {
        let workload: ArrivalQueue = [
            Process::new(Pid(1), 0, 100),
            Process::new(Pid(2), 0, 10),
            Process::new(Pid(3), 0, 10),
        ]
        .into_iter()
        .collect();

        let done = Sjf.run(workload).unwrap();
        let order: Vec<_> = done.iter().map(|p| p.pid).collect();
        assert_eq!(order, vec![Pid(2), Pid(3), Pid(1)]);

        let turnaround: u64 = done.iter().filter_map(|p| p.turnaround()).sum();
        assert_eq!(turnaround, 10 + 20 + 120);
    }

    #[test]
    fn test_sjf_does_not_preempt() {
        let workload: ArrivalQueue = [Process::new(Pid(1), 0, 10), Process::new(Pid(2), 1, 1)]
            .into_iter()
            .collect();

        let done = Sjf.run(workload).unwrap();
        assert_eq!(done[0].pid, Pid(1));
        assert_eq!(done[1].first_run, Some(10));
    }
}
