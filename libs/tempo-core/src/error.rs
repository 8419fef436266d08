//! Error types for scheduling operations

use crate::process::Pid;
use thiserror::Error;

/// Scheduling engine error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedError {
    /// Peek or pop on an empty arrival queue
    #[error("Arrival queue is empty")]
    EmptyQueue,

    /// Minimum lookup on an empty selection tree
    #[error("Selection tree is empty")]
    EmptyTree,

    /// No process with this id is tracked
    #[error("Process not found: {0}")]
    NotFound(Pid),

    /// A process with this id is already tracked
    #[error("Process already queued: {0}")]
    DuplicateProcess(Pid),

    /// Scheduler configuration rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Process record rejected at intake
    #[error("Invalid process: {0}")]
    InvalidProcess(String),

    /// Red-black tree structure broken (programming defect)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Result type for scheduling operations
pub type Result<T> = std::result::Result<T, SchedError>;

impl SchedError {
    /// Check if this error just means "no more work"
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EmptyQueue | Self::EmptyTree | Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_structures_are_recoverable() {
        assert!(SchedError::EmptyQueue.is_recoverable());
        assert!(SchedError::EmptyTree.is_recoverable());
        assert!(SchedError::NotFound(Pid(3)).is_recoverable());
        assert!(!SchedError::InvariantViolation("red root".into()).is_recoverable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(SchedError::NotFound(Pid(7)).to_string(), "Process not found: 7");
        assert_eq!(SchedError::EmptyTree.to_string(), "Selection tree is empty");
    }
}
