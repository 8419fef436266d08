//! Scheduler tuning parameters
//!
//! One `SchedConfig` is handed to every scheduler constructor, so independent
//! simulation runs never share mutable state.

use crate::error::{Result, SchedError};
use serde::{Deserialize, Serialize};

/// Weight of a nice-0 process
pub const NICE_0_WEIGHT: u32 = 1024;

/// Lowest accepted nice value
pub const MIN_NICE: i32 = -20;

/// Highest accepted nice value
pub const MAX_NICE: i32 = 19;

/// Linux CFS weight table, indexed by nice + 20
const NICE_WEIGHTS: [u32; 40] = [
    /* -20 */ 88761, 71755, 56483, 46273, 36291,
    /* -15 */ 29154, 23254, 18705, 14949, 11916,
    /* -10 */ 9548, 7620, 6100, 4904, 3906,
    /*  -5 */ 3121, 2501, 1991, 1586, 1277,
    /*   0 */ 1024, 820, 655, 526, 423,
    /*   5 */ 335, 272, 215, 172, 137,
    /*  10 */ 110, 87, 70, 56, 45,
    /*  15 */ 36, 29, 23, 18, 15,
];

/// Nice value to weight lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightTable {
    weights: [u32; 40],
}

impl WeightTable {
    /// Custom table, indexed by nice + 20
    pub fn new(weights: [u32; 40]) -> Self {
        Self { weights }
    }

    /// Weight for a nice value. Out-of-range values clamp to the table edge.
    pub fn weight(&self, nice: i32) -> u32 {
        let idx = (nice.clamp(MIN_NICE, MAX_NICE) - MIN_NICE) as usize;
        self.weights[idx]
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self { weights: NICE_WEIGHTS }
    }
}

/// Calculate weight from nice value (-20 to 19) using the fixed table
pub fn nice_to_weight(nice: i32) -> u32 {
    WeightTable::default().weight(nice)
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedConfig {
    /// Window within which CFS revisits every runnable process
    #[serde(default = "default_target_latency")]
    pub target_latency: u64,

    /// Floor for the CFS time slice
    #[serde(default = "default_min_granularity")]
    pub min_granularity: u64,

    /// Fraction of the I/O ratio credited back to I/O-bound processes
    #[serde(default = "default_io_bonus_factor")]
    pub io_bonus_factor: f64,

    /// Round-robin quantum
    #[serde(default = "default_rr_quantum")]
    pub rr_quantum: u64,

    /// Nice to weight lookup
    #[serde(skip)]
    pub weights: WeightTable,
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self {
            target_latency: default_target_latency(),
            min_granularity: default_min_granularity(),
            io_bonus_factor: default_io_bonus_factor(),
            rr_quantum: default_rr_quantum(),
            weights: WeightTable::default(),
        }
    }
}

fn default_target_latency() -> u64 {
    20
}

fn default_min_granularity() -> u64 {
    3
}

fn default_io_bonus_factor() -> f64 {
    0.7
}

fn default_rr_quantum() -> u64 {
    1
}

impl SchedConfig {
    /// Override the round-robin quantum
    pub fn with_quantum(mut self, quantum: u64) -> Self {
        self.rr_quantum = quantum;
        self
    }

    /// Override the nice to weight table
    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.weights = weights;
        self
    }

    /// Reject settings that would stall or corrupt a simulation
    pub fn validate(&self) -> Result<()> {
        if self.target_latency == 0 {
            return Err(SchedError::InvalidConfig("target_latency must be positive".into()));
        }
        if self.min_granularity == 0 {
            return Err(SchedError::InvalidConfig("min_granularity must be positive".into()));
        }
        if self.rr_quantum == 0 {
            return Err(SchedError::InvalidConfig("rr_quantum must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.io_bonus_factor) {
            return Err(SchedError::InvalidConfig(format!(
                "io_bonus_factor {} outside [0, 1]",
                self.io_bonus_factor
            )));
        }
        if self.weights.weights.contains(&0) {
            return Err(SchedError::InvalidConfig("weight table has a zero entry".into()));
        }
        Ok(())
    }

    /// CFS time slice for the given number of runnable processes
    pub fn time_slice(&self, runnable: usize) -> u64 {
        let share = self.target_latency / runnable.max(1) as u64;
        share.max(self.min_granularity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_table_edges() {
        assert_eq!(nice_to_weight(0), NICE_0_WEIGHT);
        assert_eq!(nice_to_weight(-20), 88761);
        assert_eq!(nice_to_weight(19), 15);
        assert_eq!(nice_to_weight(-5), 3121);
        assert_eq!(nice_to_weight(5), 335);
    }

    #[test]
    fn test_weight_clamps_out_of_range() {
        assert_eq!(nice_to_weight(-100), 88761);
        assert_eq!(nice_to_weight(42), 15);
    }

    #[test]
    fn test_weight_monotonically_decreasing() {
        let table = WeightTable::default();
        for nice in MIN_NICE..MAX_NICE {
            assert!(table.weight(nice) > table.weight(nice + 1));
        }
    }

    #[test]
    fn test_time_slice_shrinks_to_floor() {
        let config = SchedConfig::default();
        assert_eq!(config.time_slice(0), 20);
        assert_eq!(config.time_slice(1), 20);
        assert_eq!(config.time_slice(2), 10);
        assert_eq!(config.time_slice(5), 4);
        assert_eq!(config.time_slice(7), 3);
        assert_eq!(config.time_slice(100), 3);
    }

    #[test]
    fn test_validate_rejects_zero_quantum() {
        let config = SchedConfig::default().with_quantum(0);
        assert!(matches!(config.validate(), Err(SchedError::InvalidConfig(_))));
        assert!(SchedConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_weight() {
        let mut weights = NICE_WEIGHTS;
        weights[7] = 0;
        let config = SchedConfig::default().with_weights(WeightTable::new(weights));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_io_bonus_out_of_range() {
        let config = SchedConfig {
            io_bonus_factor: 1.5,
            ..SchedConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
