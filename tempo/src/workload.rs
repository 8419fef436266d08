//! Workload intake
//!
//! Reads workload files, builds the predefined scenarios and generates seeded
//! random workloads. File format, one process per line:
//!
//! ```text
//! # arrival duration [nice io_bound io_ratio]
//! 0 20 -5 0 0.0
//! 3 8
//! ```
//!
//! Pids are assigned from 1 in file order. Malformed lines are skipped with a
//! warning and never reach the scheduler.

use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use std::path::Path;
use tempo_core::{ArrivalQueue, Pid, Process};
use thiserror::Error;
use tracing::{debug, warn};

/// Workload error types
#[derive(Debug, Error)]
pub enum WorkloadError {
    /// Line could not be turned into a process
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parsed fields of one workload line
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub arrival: u64,
    pub duration: u64,
    pub nice: i32,
    pub io_bound: bool,
    pub io_ratio: f64,
}

impl Record {
    fn into_process(self, pid: Pid) -> Process {
        Process::new(pid, self.arrival, self.duration)
            .with_nice(self.nice)
            .with_io(self.io_bound, self.io_ratio)
    }
}

/// Canonical workload. Schedulers get copies via [`Workload::queue`].
#[derive(Debug, Clone, Default)]
pub struct Workload {
    processes: Vec<Process>,
    skipped: usize,
}

impl Workload {
    /// Wrap an already-built process list
    pub fn from_processes(processes: Vec<Process>) -> Self {
        Self {
            processes,
            skipped: 0,
        }
    }

    /// Parse workload text, skipping malformed lines
    pub fn parse(text: &str) -> Self {
        let mut processes = Vec::new();
        let mut skipped = 0;

        for (idx, line) in text.lines().enumerate() {
            match parse_line(idx + 1, line) {
                Ok(Some(record)) => {
                    let pid = Pid(processes.len() as u32 + 1);
                    processes.push(record.into_process(pid));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Skipping malformed workload entry: {}", e);
                    skipped += 1;
                }
            }
        }

        debug!("Parsed {} processes ({} skipped)", processes.len(), skipped);
        Self { processes, skipped }
    }

    /// Load a workload file
    pub fn load(path: &Path) -> Result<Self, WorkloadError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Private arrival queue for one scheduler run
    pub fn queue(&self) -> ArrivalQueue {
        self.processes.iter().cloned().collect()
    }

    /// Processes in arrival order
    pub fn by_arrival(&self) -> Vec<Process> {
        self.queue().into_sorted_vec()
    }

    /// Processes in intake order
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    /// Number of lines dropped during parsing
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Render in the workload file format
    pub fn to_text(&self) -> String {
        let mut out = String::from("# arrival duration nice io_bound io_ratio\n");
        for p in &self.processes {
            let _ = writeln!(
                out,
                "{} {} {} {} {:.2}",
                p.arrival,
                p.duration,
                p.nice,
                u8::from(p.io_bound),
                p.io_ratio
            );
        }
        out
    }

    /// Seeded random workload
    pub fn random(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let horizon = (count as u64 * 3).max(1);

        let processes = (0..count)
            .map(|i| {
                let io_bound = rng.gen_bool(0.3);
                let io_ratio = if io_bound {
                    (rng.gen_range(0.1..0.9f64) * 100.0).round() / 100.0
                } else {
                    0.0
                };
                Process::new(
                    Pid(i as u32 + 1),
                    rng.gen_range(0..horizon),
                    rng.gen_range(1..=20),
                )
                .with_nice(rng.gen_range(-20..=19))
                .with_io(io_bound, io_ratio)
            })
            .collect();

        Self::from_processes(processes)
    }
}

/// Parse one line. Blank and comment-only lines yield `Ok(None)`.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<Record>, WorkloadError> {
    let content = line.split('#').next().unwrap_or("").trim();
    if content.is_empty() {
        return Ok(None);
    }

    let malformed = |reason: String| WorkloadError::Malformed {
        line: line_no,
        reason,
    };

    let fields: Vec<&str> = content.split_whitespace().collect();
    if fields.len() != 2 && fields.len() != 5 {
        return Err(malformed(format!("expected 2 or 5 fields, found {}", fields.len())));
    }

    let arrival: u64 = fields[0]
        .parse()
        .map_err(|_| malformed(format!("bad arrival '{}'", fields[0])))?;
    let duration: u64 = fields[1]
        .parse()
        .map_err(|_| malformed(format!("bad duration '{}'", fields[1])))?;
    if duration == 0 {
        return Err(malformed("duration must be positive".into()));
    }

    if fields.len() == 2 {
        return Ok(Some(Record {
            arrival,
            duration,
            nice: 0,
            io_bound: false,
            io_ratio: 0.0,
        }));
    }

    let nice: i32 = fields[2]
        .parse()
        .map_err(|_| malformed(format!("bad nice value '{}'", fields[2])))?;
    let io_bound = match fields[3] {
        "0" | "false" => false,
        "1" | "true" => true,
        other => return Err(malformed(format!("bad io_bound flag '{}'", other))),
    };
    let io_ratio: f64 = fields[4]
        .parse()
        .map_err(|_| malformed(format!("bad io_ratio '{}'", fields[4])))?;
    if !(0.0..=1.0).contains(&io_ratio) {
        return Err(malformed(format!("io_ratio {} outside [0, 1]", io_ratio)));
    }

    Ok(Some(Record {
        arrival,
        duration,
        nice,
        io_bound,
        io_ratio,
    }))
}

/// Predefined synthetic workloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Ten equal CPU-bound jobs arriving every 5 units
    CpuBound,
    /// Twenty jobs of varied length arriving every 2 units
    Dynamic,
    /// Equal jobs with nice values -2..2
    Priority,
    /// Alternating I/O-bound and CPU-bound jobs
    MixedIo,
    /// Five simultaneous jobs with nice -10, -5, 0, 5, 10
    Fairness,
    /// Five I/O-bound and five CPU-bound simultaneous jobs
    IoVsCpu,
    /// A long low-priority job followed by shorter high-priority ones
    PriorityInversion,
    /// Fifty mixed jobs arriving in groups of five
    Scalability,
    /// Five equal jobs spaced 10 units apart
    Baseline,
}

impl Scenario {
    /// One-line description
    pub fn description(&self) -> &'static str {
        match self {
            Self::CpuBound => "CPU-bound processes with equal priority and staggered arrivals",
            Self::Dynamic => "processes that join and leave frequently",
            Self::Priority => "processes with different nice values",
            Self::MixedIo => "mixed I/O-bound and CPU-bound processes",
            Self::Fairness => "equal work, different priorities; CFS should favor low nice values",
            Self::IoVsCpu => "I/O-bound against CPU-bound; CFS should favor I/O-bound work",
            Self::PriorityInversion => "high-priority short jobs arriving behind a long low-priority job",
            Self::Scalability => "many diverse processes under increasing load",
            Self::Baseline => "simple evenly spaced workload",
        }
    }

    /// Build the workload
    pub fn build(&self) -> Workload {
        // (arrival, duration, nice, io_ratio); io_ratio > 0 marks the job I/O-bound
        let specs: Vec<(u64, u64, i32, f64)> = match self {
            Self::CpuBound => (0..10).map(|i| (i * 5, 20, 0, 0.0)).collect(),
            Self::Dynamic => (0..20).map(|i| (i * 2, 5 + i % 10, 0, 0.0)).collect(),
            Self::Priority => (0..10).map(|i| (i * 3, 15, (i % 5) as i32 - 2, 0.0)).collect(),
            Self::MixedIo => (0..10)
                .map(|i| (i * 4, 20, 0, if i % 2 == 0 { 0.7 } else { 0.0 }))
                .collect(),
            Self::Fairness => [-10, -5, 0, 5, 10].into_iter().map(|n| (0, 20, n, 0.0)).collect(),
            Self::IoVsCpu => (0..10).map(|i| (0, 20, 0, if i < 5 { 0.8 } else { 0.0 })).collect(),
            Self::PriorityInversion => vec![
                (0, 50, 10, 0.0),
                (1, 5, -10, 0.0),
                (10, 20, 0, 0.0),
                (15, 10, -5, 0.0),
                (20, 15, 5, 0.0),
            ],
            Self::Scalability => (0..50)
                .map(|i| (i / 5, 5 + i % 10, (i % 21) as i32 - 10, if i % 3 == 0 { 0.7 } else { 0.0 }))
                .collect(),
            Self::Baseline => (0..5).map(|i| (i * 10, 10, 0, 0.0)).collect(),
        };

        let processes = specs
            .into_iter()
            .enumerate()
            .map(|(i, (arrival, duration, nice, io_ratio))| {
                Process::new(Pid(i as u32 + 1), arrival, duration)
                    .with_nice(nice)
                    .with_io(io_ratio > 0.0, io_ratio)
            })
            .collect();

        Workload::from_processes(processes)
    }
}
