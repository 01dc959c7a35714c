//! CLI subcommand implementations.

use std::time::Duration;

use examkit_core::engine::ProgressReporter;

pub mod create;
pub mod email;
pub mod init;
pub mod preview;
pub mod validate;

/// Console progress reporter.
pub(crate) struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_student_allocated(&self, student_id: &str, question_count: usize, newly_created: bool) {
        let verb = if newly_created {
            "allocated"
        } else {
            "already allocated"
        };
        eprintln!("  {student_id}: {verb} ({question_count} questions)");
    }

    fn on_student_failed(&self, student_id: &str, error: &str) {
        eprintln!("  {student_id}: FAILED: {error}");
    }

    fn on_batch_complete(&self, total: usize, allocated: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nBatch complete: {allocated}/{total} allocated, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }

    fn on_message_sent(&self, student_id: &str, email: &str) {
        eprintln!("  {student_id}: sent to {email}");
    }

    fn on_message_failed(&self, student_id: &str, email: &str, error: &str) {
        eprintln!("  {student_id}: FAILED to send to {email}: {error}");
    }
}
