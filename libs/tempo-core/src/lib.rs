//! # Tempo Core
//!
//! Offline CPU scheduling engine. Given a fully known workload, it computes
//! the exact sequence of time-slice decisions a scheduling policy would make.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────────────────┐
//! │   Process    │────▶│ ArrivalQueue │────▶│ FIFO | SJF | STCF | RR   │
//! │   records    │     │ (min-heap)   │     │                          │
//! └──────────────┘     └──────┬───────┘     └────────────┬─────────────┘
//!                             │                          │
//!                             ▼                          ▼
//!                      ┌──────────────┐          ┌──────────────┐
//!                      │     CFS      │─────────▶│   Schedule   │
//!                      │   (RbTree)   │          │ completed +  │
//!                      └──────────────┘          │  timeline    │
//!                                                └──────────────┘
//! ```
//!
//! Each run consumes its own queue, so callers keep a canonical workload and
//! hand every policy a clone.

pub mod config;
pub mod error;
pub mod process;
pub mod queue;
pub mod rbtree;
pub mod sched;

pub use config::{nice_to_weight, SchedConfig, WeightTable, NICE_0_WEIGHT};
pub use error::{Result, SchedError};
pub use process::{Pid, Process};
pub use queue::ArrivalQueue;
pub use rbtree::{RbTree, Traversal};
pub use sched::{Policy, Schedule, Scheduler, Slice};

/// Re-export common types
pub mod prelude {
    pub use crate::config::SchedConfig;
    pub use crate::error::SchedError;
    pub use crate::process::{Pid, Process};
    pub use crate::queue::ArrivalQueue;
    pub use crate::sched::{Cfs, Fifo, Policy, RoundRobin, Schedule, Scheduler, Sjf, Stcf};
}
