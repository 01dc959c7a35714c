//! Allocation error types.
//!
//! Defined here so the engine can classify errors for retry decisions
//! without string matching: `Upstream` failures are transient and worth
//! retrying, everything else is permanent for the student in question.

use thiserror::Error;

use crate::model::Difficulty;

/// Errors that can occur while allocating questions to students.
#[derive(Debug, Clone, Error)]
pub enum AllocationError {
    /// The pool cannot satisfy the quota at one difficulty level.
    #[error("not enough {level} questions: required {required}, available {available}")]
    InsufficientPool {
        level: Difficulty,
        required: u32,
        available: u32,
    },

    /// A concurrent writer stored an allocation for the same
    /// (assignment, student) pair first. Recovered by re-reading the
    /// winner's allocation; callers of the store never observe it.
    #[error("allocation for student '{student_id}' was created concurrently")]
    RaceConflict { student_id: String },

    /// No assignment with the given id exists.
    #[error("assignment not found: {assignment_id}")]
    AssignmentNotFound { assignment_id: String },

    /// The student is not on the course roster.
    #[error("student '{student_id}' is not enrolled in course '{course_id}'")]
    StudentNotEnrolled {
        student_id: String,
        course_id: String,
    },

    /// A collaborator rejected our credentials (invalid api key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A collaborator call failed (pool query, persistence, render, send).
    #[error("{operation} failed: {message}")]
    Upstream {
        operation: &'static str,
        message: String,
    },

    /// One student's resolution exceeded the configured time bound.
    #[error("allocation for student '{student_id}' timed out after {seconds}s")]
    Timeout { student_id: String, seconds: u64 },
}

impl AllocationError {
    /// Shorthand for wrapping a collaborator failure.
    pub fn upstream(operation: &'static str, err: impl std::fmt::Display) -> Self {
        AllocationError::Upstream {
            operation,
            message: err.to_string(),
        }
    }

    /// Returns `true` if retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AllocationError::Upstream { .. })
    }

    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_pool_message() {
        let err = AllocationError::InsufficientPool {
            level: Difficulty::Hard,
            required: 3,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "not enough hard questions: required 3, available 2"
        );
        assert!(err.is_permanent());
    }

    #[test]
    fn upstream_is_transient() {
        let err = AllocationError::upstream("pool query", "connection reset");
        assert!(err.is_transient());
        assert!(err.to_string().contains("pool query"));
    }

    #[test]
    fn timeout_is_not_retried() {
        let err = AllocationError::Timeout {
            student_id: "s-1".into(),
            seconds: 30,
        };
        assert!(err.is_permanent());
    }
}
