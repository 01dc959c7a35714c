//! The `examkit create` command.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use uuid::Uuid;

use examkit_backends::MemoryBackend;
use examkit_core::engine::{AllocationEngine, EngineConfig};
use examkit_core::model::{Assignment, QuotaRequest};
use examkit_core::parser;
use examkit_core::report::{AllocationStatus, BatchReport};

use super::ConsoleReporter;

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    bank_path: PathBuf,
    course_path: PathBuf,
    name: String,
    description: String,
    due: String,
    quota_str: String,
    marks: u32,
    out: PathBuf,
    seed_base: Option<i64>,
) -> Result<()> {
    let quota = parse_quota(&quota_str)?;
    anyhow::ensure!(!quota.is_empty(), "quota must request at least one question");

    let due_date = NaiveDate::parse_from_str(&due, "%Y-%m-%d")
        .with_context(|| format!("invalid due date '{due}', expected YYYY-MM-DD"))?
        .and_hms_opt(23, 59, 59)
        .expect("valid time of day")
        .and_utc();

    let bank = parser::parse_bank(&bank_path)?;
    let course = parser::parse_course(&course_path)?;
    anyhow::ensure!(
        bank.teacher_id == course.teacher_id,
        "bank belongs to teacher '{}' but course is taught by '{}'",
        bank.teacher_id,
        course.teacher_id
    );
    anyhow::ensure!(!course.students.is_empty(), "course roster is empty");

    let assignment = Assignment {
        id: Uuid::new_v4().to_string(),
        name,
        description,
        course_id: course.id.clone(),
        teacher_id: bank.teacher_id.clone(),
        due_date,
        total_marks: marks,
        quota,
        students: HashMap::new(),
    };
    let assignment_id = assignment.id.clone();

    let backend = Arc::new(MemoryBackend::with_bank(&bank).await);
    backend.put_assignment(assignment).await;

    let mut engine =
        AllocationEngine::new(backend.clone(), backend.clone(), EngineConfig::default());
    if let Some(base) = seed_base {
        engine = engine.with_seed_base(base);
    }

    eprintln!(
        "Allocating {} questions each for {} students\n",
        quota.total(),
        course.students.len()
    );

    let report = engine
        .allocate_batch(&assignment_id, &course.student_ids(), &ConsoleReporter)
        .await?;

    print_summary(&report);

    std::fs::create_dir_all(&out)?;
    let assignment_path = out.join("assignment.json");
    let stored = backend
        .get_assignment(&assignment_id)
        .await
        .context("assignment disappeared from the store")?;
    std::fs::write(
        &assignment_path,
        serde_json::to_string_pretty(&stored)?,
    )?;
    eprintln!("Assignment saved to: {}", assignment_path.display());

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let report_path = out.join(format!("report-{timestamp}.json"));
    report.save_json(&report_path)?;
    eprintln!("Report saved to: {}", report_path.display());

    println!(
        "{}/{} students allocated",
        report.succeeded(),
        report.outcomes.len()
    );
    for outcome in report.failed() {
        println!(
            "  {}: {}",
            outcome.student_id,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}

/// Parse a quota of the form "easy,medium,hard", e.g. "2,1,1".
fn parse_quota(s: &str) -> Result<QuotaRequest> {
    let parts: Vec<&str> = s.split(',').map(|p| p.trim()).collect();
    anyhow::ensure!(
        parts.len() == 3,
        "quota must be three comma-separated counts (easy,medium,hard), got '{s}'"
    );
    let counts = parts
        .iter()
        .map(|p| {
            p.parse::<u32>()
                .map_err(|_| anyhow::anyhow!("invalid quota count: '{p}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(QuotaRequest::new(counts[0], counts[1], counts[2]))
}

fn print_summary(report: &BatchReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Student", "Status", "Questions", "Error"]);

    for outcome in &report.outcomes {
        let status = match outcome.status {
            AllocationStatus::Allocated => "allocated",
            AllocationStatus::AlreadyAllocated => "already allocated",
            AllocationStatus::Failed => "FAILED",
        };
        table.add_row(vec![
            Cell::new(&outcome.student_id),
            Cell::new(status),
            Cell::new(outcome.question_count),
            Cell::new(outcome.error.as_deref().unwrap_or("-")),
        ]);
    }

    eprintln!("\n{table}");
}
