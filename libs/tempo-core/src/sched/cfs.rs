//! Completely Fair Scheduler (CFS), simplified
//!
//! Runnable processes sit in a red-black tree keyed by virtual runtime. The
//! leftmost process runs for a slice sized so that every runnable process gets
//! a turn within one target latency, then is charged weighted runtime and
//! reinserted.

use super::{advance, Schedule, Scheduler};
use crate::config::{SchedConfig, NICE_0_WEIGHT};
use crate::error::Result;
use crate::process::Process;
use crate::queue::ArrivalQueue;
use crate::rbtree::RbTree;
use tracing::{debug, trace};

/// CFS scheduler
#[derive(Debug, Clone, Default)]
pub struct Cfs {
    config: SchedConfig,
}

impl Cfs {
    /// Create a scheduler with the given tuning
    pub fn new(config: SchedConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }
}

/// Calculate virtual runtime delta
///
/// I/O-bound processes are charged for only part of the time they held the
/// CPU: `runtime * (1 - io_ratio * io_bonus_factor)`, with the discount capped
/// to [0, 1] so the delta is never negative. The result is scaled by
/// `NICE_0_WEIGHT / weight`, so low-weight processes age faster.
pub fn calc_vruntime_delta(process: &Process, runtime: u64, io_bonus_factor: f64) -> f64 {
    let mut effective = runtime as f64;
    if process.io_bound {
        let discount = (process.io_ratio * io_bonus_factor).clamp(0.0, 1.0);
        effective *= 1.0 - discount;
    }
    effective * f64::from(NICE_0_WEIGHT) / f64::from(process.weight.max(1))
}

impl Scheduler for Cfs {
    fn name(&self) -> &'static str {
        "CFS"
    }

    fn schedule(&self, mut workload: ArrivalQueue) -> Result<Schedule> {
        let mut schedule = Schedule::with_capacity(workload.len());
        let mut tree = RbTree::with_capacity(workload.len());
        let mut now = workload.next_arrival().unwrap_or(0);
        // vruntime of the most recently selected process; new arrivals start here
        let mut min_vruntime = 0.0_f64;

        loop {
            while let Some(mut process) = workload.pop_arrived(now) {
                process.weight = self.config.weights.weight(process.nice);
                process.validate()?;
                process.vruntime = min_vruntime;
                debug!(
                    "CFS admitted {} at {} (weight {}, vruntime {:.3})",
                    process.pid, now, process.weight, process.vruntime
                );
                tree.insert(process)?;
            }

            if tree.is_empty() {
                match workload.next_arrival() {
                    Some(next) => {
                        debug!("CFS idle until {}", next);
                        now = next;
                        continue;
                    }
                    None => break,
                }
            }

            let slice = self.config.time_slice(tree.len());
            let mut process = tree.pop_minimum()?;
            debug_assert!(process.vruntime >= min_vruntime);
            min_vruntime = process.vruntime;

            process.dispatch(now);
            let ran = process.run_for(slice);
            let end = advance(now, ran, process.pid)?;
            trace!(
                "CFS ran {} for [{}, {}) with slice {}",
                process.pid,
                now,
                end,
                slice
            );
            schedule.record(process.pid, now, end);
            now = end;

            if process.is_complete() {
                debug!("CFS completed {} at {}", process.pid, now);
                process.finish(now);
                schedule.complete(process);
            } else {
                process.vruntime += calc_vruntime_delta(&process, ran, self.config.io_bonus_factor);
                tree.insert(process)?;
            }
        }

        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeightTable;
    use crate::{Pid, SchedError};

    #[test]
    fn test_vruntime_delta_nice_zero() {
        let p = Process::new(Pid(1), 0, 10);
        assert_eq!(calc_vruntime_delta(&p, 10, 0.7), 10.0);
    }

    #[test]
    fn test_vruntime_delta_scales_with_weight() {
        let heavy = Process::new(Pid(1), 0, 10).with_nice(-5);
        let light = Process::new(Pid(2), 0, 10).with_nice(5);
        let heavy_delta = calc_vruntime_delta(&heavy, 10, 0.7);
        let light_delta = calc_vruntime_delta(&light, 10, 0.7);
        assert!((heavy_delta - 10.0 * 1024.0 / 3121.0).abs() < 1e-9);
        assert!((light_delta - 10.0 * 1024.0 / 335.0).abs() < 1e-9);
        assert!(light_delta > heavy_delta);
    }

    #[test]
    fn test_vruntime_delta_io_bonus() {
        let io = Process::new(Pid(1), 0, 10).with_io(true, 0.5);
        assert!((calc_vruntime_delta(&io, 10, 0.7) - 6.5).abs() < 1e-9);

        // io_ratio is ignored unless the process is flagged I/O-bound
        let cpu = Process::new(Pid(2), 0, 10).with_io(false, 0.5);
        assert_eq!(calc_vruntime_delta(&cpu, 10, 0.7), 10.0);
    }

    #[test]
    fn test_cfs_single_process_runs_in_target_latency_slices() {
        let workload: ArrivalQueue = [Process::new(Pid(1), 3, 45)].into_iter().collect();
        let schedule = Cfs::default().schedule(workload).unwrap();

        let p = &schedule.completed[0];
        assert_eq!(p.first_run, Some(3));
        assert_eq!(p.completion, Some(48));
        assert_eq!(p.vruntime, 40.0);
        // consecutive slices of the same process merge
        assert_eq!(schedule.timeline.len(), 1);
    }

    #[test]
    fn test_cfs_equal_weights_alternate() {
        let workload: ArrivalQueue = [Process::new(Pid(1), 0, 20), Process::new(Pid(2), 0, 20)]
            .into_iter()
            .collect();
        let schedule = Cfs::default().schedule(workload).unwrap();

        let order: Vec<_> = schedule.timeline.iter().map(|s| (s.pid.0, s.start, s.end)).collect();
        assert_eq!(order, vec![(1, 0, 10), (2, 10, 20), (1, 20, 30), (2, 30, 40)]);
    }

    #[test]
    fn test_cfs_late_arrival_starts_at_min_vruntime() {
        let workload: ArrivalQueue = [Process::new(Pid(1), 0, 50), Process::new(Pid(2), 25, 5)]
            .into_iter()
            .collect();
        let schedule = Cfs::default().schedule(workload).unwrap();

        // pid 1 runs [0,20) then [20,40) alone; pid 2 is admitted at 40 with
        // the vruntime pid 1 had when last picked (20), below pid 1's 40
        let late = schedule.completed.iter().find(|p| p.pid == Pid(2)).unwrap();
        assert_eq!(late.first_run, Some(40));
        assert_eq!(late.completion, Some(45));
    }

    #[test]
    fn test_vruntime_delta_never_negative() {
        let io = Process::new(Pid(1), 0, 10).with_io(true, 1.0);
        assert_eq!(calc_vruntime_delta(&io, 10, 1.5), 0.0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SchedConfig {
            io_bonus_factor: 1.5,
            ..SchedConfig::default()
        };
        assert!(matches!(Cfs::new(config), Err(SchedError::InvalidConfig(_))));
        assert!(Cfs::new(SchedConfig::default()).is_ok());
    }

    #[test]
    fn test_cfs_uses_configured_weight_table() {
        let config = SchedConfig::default().with_weights(WeightTable::new([NICE_0_WEIGHT; 40]));
        let workload: ArrivalQueue = [
            Process::new(Pid(1), 0, 20).with_nice(-5),
            Process::new(Pid(2), 0, 20).with_nice(5),
        ]
        .into_iter()
        .collect();
        let schedule = Cfs::new(config).unwrap().schedule(workload).unwrap();

        assert!(schedule.completed.iter().all(|p| p.weight == NICE_0_WEIGHT));
        let order: Vec<_> = schedule.timeline.iter().map(|s| (s.pid.0, s.start, s.end)).collect();
        assert_eq!(order, vec![(1, 0, 10), (2, 10, 20), (1, 20, 30), (2, 30, 40)]);
    }

    #[test]
    fn test_cfs_duplicate_pid_is_an_error() {
        let workload: ArrivalQueue = [Process::new(Pid(1), 0, 5), Process::new(Pid(1), 0, 6)]
            .into_iter()
            .collect();
        let err = Cfs::default().schedule(workload).unwrap_err();
        assert_eq!(err, SchedError::DuplicateProcess(Pid(1)));
    }
}
