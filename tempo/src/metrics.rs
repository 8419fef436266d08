//! Performance metrics over completed processes

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tempo_core::{Process, NICE_0_WEIGHT};

/// How the fairness index measures the time a process took
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FairnessPolicy {
    /// Completion minus first run (response time excluded)
    #[default]
    ExcludeResponse,
    /// Completion minus arrival
    Turnaround,
}

/// Average of completion - arrival
pub fn avg_turnaround(processes: &[Process]) -> f64 {
    mean(processes.iter().filter_map(Process::turnaround))
}

/// Average of first run - arrival
pub fn avg_response(processes: &[Process]) -> f64 {
    mean(processes.iter().filter_map(Process::response))
}

/// Completed processes per unit of simulated time
pub fn throughput(processes: &[Process]) -> f64 {
    let last = processes.iter().filter_map(|p| p.completion).max().unwrap_or(0);
    if last == 0 {
        return 0.0;
    }
    processes.len() as f64 / last as f64
}

/// Jain's fairness index over weight-normalized service
///
/// For each process, `x = (duration * NICE_0_WEIGHT / weight) / elapsed`,
/// where `elapsed` depends on the policy. The index is
/// `(sum x)^2 / (n * sum x^2)`; 1.0 means every process was served in
/// proportion to its weight. Empty input counts as perfectly fair.
pub fn fairness_index(processes: &[Process], policy: FairnessPolicy) -> f64 {
    let shares: Vec<f64> = processes
        .iter()
        .filter_map(|p| {
            let elapsed = match policy {
                FairnessPolicy::ExcludeResponse => p.completion? - p.first_run?,
                FairnessPolicy::Turnaround => p.turnaround()?,
            };
            if elapsed == 0 {
                return None;
            }
            let expected = p.duration as f64 * f64::from(NICE_0_WEIGHT) / f64::from(p.weight.max(1));
            Some(expected / elapsed as f64)
        })
        .collect();

    if shares.is_empty() {
        return 1.0;
    }

    let sum: f64 = shares.iter().sum();
    let sum_squared: f64 = shares.iter().map(|x| x * x).sum();
    (sum * sum) / (shares.len() as f64 * sum_squared)
}

fn mean(values: impl Iterator<Item = u64>) -> f64 {
    let (total, count) = values.fold((0u64, 0usize), |(t, c), v| (t + v, c + 1));
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Summary metrics for one policy run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Number of processes completed
    pub completed: usize,
    /// Average turnaround time
    pub avg_turnaround: f64,
    /// Average response time
    pub avg_response: f64,
    /// Jain's fairness index
    pub fairness: f64,
    /// Completions per time unit
    pub throughput: f64,
    /// Time the last process finished
    pub makespan: u64,
}

impl Metrics {
    /// Compute every metric for a completed run
    pub fn compute(processes: &[Process], policy: FairnessPolicy) -> Self {
        Self {
            completed: processes.len(),
            avg_turnaround: avg_turnaround(processes),
            avg_response: avg_response(processes),
            fairness: fairness_index(processes, policy),
            throughput: throughput(processes),
            makespan: processes.iter().filter_map(|p| p.completion).max().unwrap_or(0),
        }
    }
}
