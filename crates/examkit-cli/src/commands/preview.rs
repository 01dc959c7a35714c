//! The `examkit preview` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use examkit_backends::MemoryBackend;
use examkit_core::engine::{AllocationEngine, EngineConfig};
use examkit_core::model::Assignment;
use examkit_core::parser;
use examkit_render::HtmlRenderer;

pub async fn execute(
    assignment_path: PathBuf,
    bank_path: PathBuf,
    course_path: PathBuf,
    student_id: String,
    out: Option<PathBuf>,
    seed_base: Option<i64>,
) -> Result<()> {
    let assignment = load_assignment(&assignment_path)?;
    let assignment_id = assignment.id.clone();
    let bank = parser::parse_bank(&bank_path)?;
    let course = parser::parse_course(&course_path)?;

    let backend = Arc::new(MemoryBackend::with_bank(&bank).await);
    backend.put_assignment(assignment).await;

    let mut engine =
        AllocationEngine::new(backend.clone(), backend.clone(), EngineConfig::default());
    if let Some(base) = seed_base {
        engine = engine.with_seed_base(base);
    }

    let document = engine
        .render_for_student(&assignment_id, &course, &student_id, &HtmlRenderer)
        .await?;

    let out_path = out.unwrap_or_else(|| PathBuf::from(format!("preview-{student_id}.html")));
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&out_path, &document)?;

    // A preview may have allocated lazily; persist the mutated document.
    save_assignment(&assignment_path, backend.as_ref(), &assignment_id).await?;

    println!("Preview written to: {}", out_path.display());
    Ok(())
}

pub(crate) fn load_assignment(path: &PathBuf) -> Result<Assignment> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read assignment from {}", path.display()))?;
    serde_json::from_str(&content).context("failed to parse assignment JSON")
}

pub(crate) async fn save_assignment(
    path: &PathBuf,
    backend: &MemoryBackend,
    assignment_id: &str,
) -> Result<()> {
    let stored = backend
        .get_assignment(assignment_id)
        .await
        .context("assignment disappeared from the store")?;
    std::fs::write(path, serde_json::to_string_pretty(&stored)?)
        .with_context(|| format!("failed to write assignment to {}", path.display()))?;
    Ok(())
}
