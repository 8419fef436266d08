//! Property tests for the selection tree and the schedulers

use proptest::prelude::*;
use std::collections::BTreeMap;
use tempo_core::prelude::*;
use tempo_core::{RbTree, Traversal};

#[derive(Debug, Clone)]
enum TreeOp {
    Insert(u32, u16),
    Remove(u32),
    PopMin,
}

fn tree_op() -> impl Strategy<Value = TreeOp> {
    prop_oneof![
        3 => (0u32..64, 0u16..100).prop_map(|(pid, v)| TreeOp::Insert(pid, v)),
        2 => (0u32..64).prop_map(TreeOp::Remove),
        1 => Just(TreeOp::PopMin),
    ]
}

fn process_spec() -> impl Strategy<Value = (u64, u64, i32, bool, f64)> {
    (0u64..60, 1u64..25, -25i32..25, any::<bool>(), 0.0f64..=1.0)
}

fn build_workload(specs: &[(u64, u64, i32, bool, f64)]) -> ArrivalQueue {
    specs
        .iter()
        .enumerate()
        .map(|(i, &(arrival, duration, nice, io, ratio))| {
            Process::new(Pid(i as u32 + 1), arrival, duration)
                .with_nice(nice)
                .with_io(io, ratio)
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_rbtree_invariants_hold(ops in prop::collection::vec(tree_op(), 1..200)) {
        let mut tree = RbTree::new();
        let mut model: BTreeMap<u32, f64> = BTreeMap::new();

        for op in ops {
            match op {
                TreeOp::Insert(pid, v) => {
                    let mut p = Process::new(Pid(pid), 0, 1);
                    p.vruntime = f64::from(v);
                    let inserted = tree.insert(p).is_ok();
                    prop_assert_eq!(inserted, !model.contains_key(&pid));
                    model.entry(pid).or_insert(f64::from(v));
                }
                TreeOp::Remove(pid) => {
                    let removed = tree.remove(Pid(pid)).map(|p| p.pid.0);
                    prop_assert_eq!(removed, model.remove(&pid).map(|_| pid));
                }
                TreeOp::PopMin => {
                    match tree.pop_minimum() {
                        Ok(p) => {
                            let min = model.values().cloned().fold(f64::INFINITY, f64::min);
                            prop_assert_eq!(p.vruntime, min);
                            model.remove(&p.pid.0);
                        }
                        Err(e) => {
                            prop_assert_eq!(e, SchedError::EmptyTree);
                            prop_assert!(model.is_empty());
                        }
                    }
                }
            }

            prop_assert!(tree.validate().is_ok());
            prop_assert_eq!(tree.len(), model.len());

            let mut walked = Vec::new();
            tree.visit(Traversal::InOrder, |p| walked.push(p.vruntime));
            prop_assert!(walked.windows(2).all(|w| w[0] <= w[1]));
            prop_assert_eq!(walked.len(), model.len());
        }
    }

    #[test]
    fn prop_schedulers_conserve_work(specs in prop::collection::vec(process_spec(), 0..30)) {
        let canonical = build_workload(&specs);
        let config = SchedConfig::default();

        for policy in Policy::ALL {
            let scheduler = policy.scheduler(&config).unwrap();
            let schedule = scheduler.schedule(canonical.clone()).unwrap();

            // every input pid comes out exactly once
            let mut pids: Vec<_> = schedule.completed.iter().map(|p| p.pid.0).collect();
            pids.sort_unstable();
            let expected: Vec<_> = (1..=specs.len() as u32).collect();
            prop_assert_eq!(pids, expected);

            for p in &schedule.completed {
                let first_run = p.first_run.unwrap();
                let completion = p.completion.unwrap();
                prop_assert_eq!(p.remaining, 0);
                prop_assert!(first_run >= p.arrival);
                prop_assert!(completion >= first_run);
                prop_assert_eq!(schedule.cpu_time(p.pid), p.duration);
            }

            // completion order is non-decreasing in time
            prop_assert!(schedule
                .completed
                .windows(2)
                .all(|w| w[0].completion <= w[1].completion));

            // one CPU: slices never overlap
            prop_assert!(schedule.timeline.windows(2).all(|w| w[0].end <= w[1].start));
            prop_assert!(schedule.timeline.iter().all(|s| !s.is_empty()));
        }
    }

    #[test]
    fn prop_rr_delivers_all_work(
        specs in prop::collection::vec(process_spec(), 1..20),
        quantum in 1u64..6,
    ) {
        let rr = RoundRobin::new(quantum);
        let schedule = rr.schedule(build_workload(&specs)).unwrap();
        prop_assert_eq!(schedule.completed.len(), specs.len());

        let total: u64 = schedule.timeline.iter().map(|s| s.len()).sum();
        let work: u64 = specs.iter().map(|s| s.1).sum();
        prop_assert_eq!(total, work);
    }
}
