//! The `examkit email` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use examkit_backends::config::load_config_from;
use examkit_backends::{create_notifier, MemoryBackend};
use examkit_core::engine::{AllocationEngine, EngineConfig};
use examkit_core::parser;
use examkit_core::report::{DeliveryStatus, DispatchReport};
use examkit_render::{HtmlRenderer, PlainTextComposer};

use super::ConsoleReporter;
use super::preview::{load_assignment, save_assignment};

pub async fn execute(
    assignment_path: PathBuf,
    bank_path: PathBuf,
    course_path: PathBuf,
    config_path: Option<PathBuf>,
    out: PathBuf,
    seed_base: Option<i64>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let notifier = create_notifier(&config)?;
    let composer = PlainTextComposer::new(&config.mail.from_name);

    let assignment = load_assignment(&assignment_path)?;
    let assignment_id = assignment.id.clone();
    let bank = parser::parse_bank(&bank_path)?;
    let course = parser::parse_course(&course_path)?;

    let backend = Arc::new(MemoryBackend::with_bank(&bank).await);
    backend.put_assignment(assignment).await;

    let engine_config = EngineConfig {
        max_retries: config.max_retries,
        retry_delay: Duration::from_millis(config.retry_delay_ms),
        student_timeout: Duration::from_secs(config.student_timeout_secs),
    };
    let mut engine = AllocationEngine::new(backend.clone(), backend.clone(), engine_config);
    if let Some(base) = seed_base {
        engine = engine.with_seed_base(base);
    }

    eprintln!(
        "Sending {} via {} notifier\n",
        assignment_id,
        notifier.name()
    );

    let report = engine
        .dispatch_all(
            &assignment_id,
            &course,
            &HtmlRenderer,
            &composer,
            notifier.as_ref(),
            &ConsoleReporter,
        )
        .await?;

    print_summary(&report);

    // Lazy allocation may have extended the student map; persist it.
    save_assignment(&assignment_path, backend.as_ref(), &assignment_id).await?;

    std::fs::create_dir_all(&out)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let report_path = out.join(format!("dispatch-{timestamp}.json"));
    report.save_json(&report_path)?;
    eprintln!("Dispatch report saved to: {}", report_path.display());

    println!(
        "{} sent, {} failed",
        report.sent(),
        report.failed().len()
    );
    for delivery in report.failed() {
        println!(
            "  {} <{}>: {}",
            delivery.student_id,
            delivery.email,
            delivery.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}

fn print_summary(report: &DispatchReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Student", "Email", "Status", "Error"]);

    for delivery in &report.deliveries {
        let status = match delivery.status {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "FAILED",
        };
        table.add_row(vec![
            Cell::new(&delivery.student_id),
            Cell::new(&delivery.email),
            Cell::new(status),
            Cell::new(delivery.error.as_deref().unwrap_or("-")),
        ]);
    }

    eprintln!("\n{table}");
}
