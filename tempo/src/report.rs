//! Console and JSON reports

use crate::metrics::Metrics;
use crate::workload::Workload;
use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tempo_core::{Policy, Process, Slice};

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Everything produced by one policy run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub policy: Policy,
    pub metrics: Metrics,
    /// Finished processes in completion order
    pub processes: Vec<Process>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<Slice>>,
}

/// Pretty JSON for any report
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "=".repeat(title.len()));
}

fn opt(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Input workload table
pub fn render_workload(workload: &Workload) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("Workload ({} processes)", workload.len()));
    let _ = writeln!(
        out,
        "{:>5} {:>8} {:>8} {:>5} {:>7} {:>4} {:>6}",
        "PID", "ARRIVAL", "DURATION", "NICE", "WEIGHT", "IO", "RATIO"
    );
    for p in workload.by_arrival() {
        let _ = writeln!(
            out,
            "{:>5} {:>8} {:>8} {:>5} {:>7} {:>4} {:>6.2}",
            p.pid,
            p.arrival,
            p.duration,
            p.nice,
            p.weight,
            if p.io_bound { "yes" } else { "no" },
            p.io_ratio
        );
    }
    out
}

/// Per-process results, metrics and optional timeline for one run
pub fn render_run(report: &RunReport, precision: usize) -> String {
    let mut out = String::new();
    heading(&mut out, &format!("{} results", report.policy.as_str().to_uppercase()));
    let _ = writeln!(
        out,
        "{:>5} {:>8} {:>8} {:>5} {:>7} {:>10} {:>4} {:>6} {:>6} {:>6} {:>6}",
        "PID", "ARRIVAL", "DURATION", "NICE", "WEIGHT", "VRUNTIME", "IO", "FIRST", "DONE", "TAT", "RESP"
    );
    for p in &report.processes {
        let _ = writeln!(
            out,
            "{:>5} {:>8} {:>8} {:>5} {:>7} {:>10.2} {:>4} {:>6} {:>6} {:>6} {:>6}",
            p.pid,
            p.arrival,
            p.duration,
            p.nice,
            p.weight,
            p.vruntime,
            if p.io_bound { "yes" } else { "no" },
            opt(p.first_run),
            opt(p.completion),
            opt(p.turnaround()),
            opt(p.response()),
        );
    }

    out.push('\n');
    render_metrics(&mut out, &report.metrics, precision);

    if let Some(timeline) = &report.timeline {
        out.push('\n');
        out.push_str(&render_timeline(timeline));
    }
    out
}

fn render_metrics(out: &mut String, m: &Metrics, precision: usize) {
    let _ = writeln!(out, "Completed:       {}", m.completed);
    let _ = writeln!(out, "Avg turnaround:  {:.*}", precision, m.avg_turnaround);
    let _ = writeln!(out, "Avg response:    {:.*}", precision, m.avg_response);
    let _ = writeln!(out, "Fairness index:  {:.4}", m.fairness);
    let _ = writeln!(out, "Throughput:      {:.4} /unit", m.throughput);
    let _ = writeln!(out, "Makespan:        {}", m.makespan);
}

/// Side-by-side metrics for several policies
pub fn render_comparison(reports: &[RunReport], precision: usize) -> String {
    let mut out = String::new();
    heading(&mut out, "Policy comparison");
    let _ = writeln!(
        out,
        "{:<6} {:>14} {:>14} {:>9} {:>11} {:>9}",
        "POLICY", "AVG TURNAROUND", "AVG RESPONSE", "FAIRNESS", "THROUGHPUT", "MAKESPAN"
    );
    for r in reports {
        let m = &r.metrics;
        let _ = writeln!(
            out,
            "{:<6} {:>14.*} {:>14.*} {:>9.4} {:>11.4} {:>9}",
            r.policy.as_str().to_uppercase(),
            precision,
            m.avg_turnaround,
            precision,
            m.avg_response,
            m.fairness,
            m.throughput,
            m.makespan
        );
    }

    if let Some(best) = reports
        .iter()
        .min_by(|a, b| a.metrics.avg_turnaround.total_cmp(&b.metrics.avg_turnaround))
    {
        let _ = writeln!(out, "\nBest turnaround: {}", best.policy.as_str().to_uppercase());
    }
    if let Some(best) = reports
        .iter()
        .min_by(|a, b| a.metrics.avg_response.total_cmp(&b.metrics.avg_response))
    {
        let _ = writeln!(out, "Best response:   {}", best.policy.as_str().to_uppercase());
    }
    if let Some(best) = reports
        .iter()
        .max_by(|a, b| a.metrics.fairness.total_cmp(&b.metrics.fairness))
    {
        let _ = writeln!(out, "Most fair:       {}", best.policy.as_str().to_uppercase());
    }
    out
}

/// Timeline as a slice list
pub fn render_timeline(timeline: &[Slice]) -> String {
    let mut out = String::new();
    heading(&mut out, "Timeline");
    for slice in timeline {
        let _ = writeln!(
            out,
            "[{:>6}, {:>6})  pid {:<5} ({} units)",
            slice.start,
            slice.end,
            slice.pid,
            slice.len()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FairnessPolicy;
    use tempo_core::Pid;

    fn sample() -> RunReport {
        let mut p = Process::new(Pid(1), 0, 3);
        p.remaining = 0;
        p.first_run = Some(0);
        p.completion = Some(3);
        let processes = vec![p];
        RunReport {
            policy: Policy::Stcf,
            metrics: Metrics::compute(&processes, FairnessPolicy::default()),
            processes,
            timeline: Some(vec![Slice { pid: Pid(1), start: 0, end: 3 }]),
        }
    }

    #[test]
    fn test_render_run_includes_metrics_and_timeline() {
        let text = render_run(&sample(), 2);
        assert!(text.starts_with("STCF results\n============"));
        assert!(text.contains("Avg turnaround:  3.00"));
        assert!(text.contains("Makespan:        3"));
        assert!(text.contains("pid 1"));
    }

    #[test]
    fn test_render_run_without_timeline() {
        let mut report = sample();
        report.timeline = None;
        assert!(!render_run(&report, 2).contains("Timeline"));
    }

    #[test]
    fn test_comparison_names_best_policy() {
        let mut slow = sample();
        slow.policy = Policy::RoundRobin;
        slow.metrics.avg_turnaround = 9.0;
        let text = render_comparison(&[slow, sample()], 1);
        assert!(text.contains("Best turnaround: STCF"));
        assert!(text.contains("9.0"));
    }

    #[test]
    fn test_json_omits_missing_timeline() {
        let mut report = sample();
        report.timeline = None;
        let json = to_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["policy"], "stcf");
        assert_eq!(value["metrics"]["makespan"], 3);
        assert_eq!(value["processes"][0]["pid"], 1);
        assert!(value.get("timeline").is_none());
    }

    #[test]
    fn test_render_workload() {
        let workload = Workload::parse("0 5 -5 1 0.5\n");
        let text = render_workload(&workload);
        assert!(text.contains("Workload (1 processes)"));
        assert!(text.contains("3121"));
        assert!(text.contains("0.50"));
    }
}
