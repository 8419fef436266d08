//! Simulation driver
//!
//! Holds the canonical workload and hands each policy its own copy, so runs
//! never observe each other's state.

use crate::config::TempoConfig;
use crate::metrics::Metrics;
use crate::report::RunReport;
use crate::workload::Workload;
use anyhow::{Context, Result};
use tempo_core::Policy;
use tracing::{debug, info};

/// Runs policies against one workload
pub struct Simulation {
    workload: Workload,
    config: TempoConfig,
}

impl Simulation {
    /// Create a simulation
    pub fn new(workload: Workload, config: TempoConfig) -> Self {
        Self { workload, config }
    }

    /// The canonical workload
    pub fn workload(&self) -> &Workload {
        &self.workload
    }

    /// Run one policy to completion
    pub fn run(&self, policy: Policy) -> Result<RunReport> {
        let scheduler = policy
            .scheduler(&self.config.scheduler)
            .with_context(|| format!("Cannot build {} scheduler", policy))?;

        debug!("Running {} over {} processes", scheduler.name(), self.workload.len());
        let schedule = scheduler
            .schedule(self.workload.queue())
            .with_context(|| format!("{} simulation failed", policy))?;

        let metrics = Metrics::compute(&schedule.completed, self.config.report.fairness);
        info!(
            "{} finished {} processes, avg turnaround {:.2}, makespan {}",
            scheduler.name(),
            metrics.completed,
            metrics.avg_turnaround,
            metrics.makespan
        );

        Ok(RunReport {
            policy,
            metrics,
            processes: schedule.completed,
            timeline: self.config.report.timeline.then_some(schedule.timeline),
        })
    }

    /// Run every compared policy in turn
    pub fn compare(&self) -> Result<Vec<RunReport>> {
        Policy::COMPARED.iter().map(|&policy| self.run(policy)).collect()
    }
}
