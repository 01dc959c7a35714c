//! Batch outcome reports with JSON persistence.
//!
//! Batch operations never fail all-or-nothing: the orchestrator collects
//! one outcome per student and callers read success and failure out of
//! these reports.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::QuotaRequest;

/// Report for one batch allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the assignment the batch ran against.
    pub assignment: AssignmentSummary,
    /// One outcome per student, in batch order.
    pub outcomes: Vec<StudentOutcome>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of an assignment (without the allocation map).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSummary {
    pub id: String,
    pub name: String,
    pub course_id: String,
    pub quota: QuotaRequest,
    pub roster_size: usize,
}

/// How one student's allocation attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    /// A new allocation was created for this student.
    Allocated,
    /// The student already had an allocation; it was returned unchanged.
    AlreadyAllocated,
    /// Allocation failed; `error` says why.
    Failed,
}

/// One student's outcome within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentOutcome {
    pub student_id: String,
    pub status: AllocationStatus,
    /// Number of questions in the student's allocation (0 on failure).
    pub question_count: usize,
    #[serde(default)]
    pub error: Option<String>,
}

impl BatchReport {
    /// Students with a usable allocation after this batch.
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status != AllocationStatus::Failed)
            .count()
    }

    /// Outcomes that failed, in batch order.
    pub fn failed(&self) -> Vec<&StudentOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == AllocationStatus::Failed)
            .collect()
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: BatchReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str(&format!(
            "**{}** — {}/{} students allocated\n\n",
            self.assignment.name,
            self.succeeded(),
            self.outcomes.len()
        ));

        let failed = self.failed();
        if !failed.is_empty() {
            md.push_str("| Student | Error |\n|---------|-------|\n");
            for outcome in failed {
                md.push_str(&format!(
                    "| {} | {} |\n",
                    outcome.student_id,
                    outcome.error.as_deref().unwrap_or("unknown")
                ));
            }
        }

        md
    }
}

/// How one delivery in an email-all run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// One recipient's outcome within an email-all run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub student_id: String,
    pub email: String,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub error: Option<String>,
}

/// Report for one email-all run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// The assignment that was dispatched.
    pub assignment_id: String,
    /// One delivery record per student, in roster order.
    pub deliveries: Vec<Delivery>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl DispatchReport {
    pub fn sent(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|d| d.status == DeliveryStatus::Sent)
            .count()
    }

    pub fn failed(&self) -> Vec<&Delivery> {
        self.deliveries
            .iter()
            .filter(|d| d.status == DeliveryStatus::Failed)
            .collect()
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_report() -> BatchReport {
        BatchReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            assignment: AssignmentSummary {
                id: "a-1".into(),
                name: "Problem Set 1".into(),
                course_id: "cs101".into(),
                quota: QuotaRequest::new(2, 1, 1),
                roster_size: 3,
            },
            outcomes: vec![
                StudentOutcome {
                    student_id: "s-1".into(),
                    status: AllocationStatus::Allocated,
                    question_count: 4,
                    error: None,
                },
                StudentOutcome {
                    student_id: "s-2".into(),
                    status: AllocationStatus::AlreadyAllocated,
                    question_count: 4,
                    error: None,
                },
                StudentOutcome {
                    student_id: "s-3".into(),
                    status: AllocationStatus::Failed,
                    question_count: 0,
                    error: Some("not enough hard questions: required 3, available 2".into()),
                },
            ],
            duration_ms: 12,
        }
    }

    #[test]
    fn success_and_failure_counts() {
        let report = make_report();
        assert_eq!(report.succeeded(), 2);
        let failed = report.failed();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].student_id, "s-3");
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        report.save_json(&path).unwrap();
        let loaded = BatchReport::load_json(&path).unwrap();

        assert_eq!(loaded.assignment.id, "a-1");
        assert_eq!(loaded.outcomes.len(), 3);
        assert_eq!(loaded.outcomes[2].status, AllocationStatus::Failed);
    }

    #[test]
    fn markdown_lists_failures() {
        let report = make_report();
        let md = report.to_markdown();
        assert!(md.contains("2/3 students"));
        assert!(md.contains("s-3"));
        assert!(md.contains("not enough hard questions"));
    }

    #[test]
    fn dispatch_counts() {
        let report = DispatchReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            assignment_id: "a-1".into(),
            deliveries: vec![
                Delivery {
                    student_id: "s-1".into(),
                    email: "s-1@example.edu".into(),
                    status: DeliveryStatus::Sent,
                    error: None,
                },
                Delivery {
                    student_id: "s-2".into(),
                    email: "s-2@example.edu".into(),
                    status: DeliveryStatus::Failed,
                    error: Some("mailbox unavailable".into()),
                },
            ],
            duration_ms: 5,
        };
        assert_eq!(report.sent(), 1);
        assert_eq!(report.failed().len(), 1);
        assert_eq!(report.failed()[0].student_id, "s-2");
    }
}
