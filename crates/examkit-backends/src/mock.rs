//! Mock collaborators for testing.
//!
//! Used by the engine-level and end-to-end tests to script failures
//! without real storage or a real mail gateway.

use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use examkit_core::error::AllocationError;
use examkit_core::model::{Difficulty, Question};
use examkit_core::traits::{AssignmentMessage, Notifier, QuestionRepository};

/// A mock notifier that records every delivered message.
///
/// Failures can be scripted per recipient (always fail) or as a leading
/// run of transient failures (fail the first N sends, then succeed).
pub struct MockNotifier {
    sent: Mutex<Vec<AssignmentMessage>>,
    fail_recipients: Vec<String>,
    transient_failures: AtomicU32,
    call_count: AtomicU32,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_recipients: Vec::new(),
            transient_failures: AtomicU32::new(0),
            call_count: AtomicU32::new(0),
        }
    }

    /// Always fail sends to the given addresses.
    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            fail_recipients: recipients.iter().map(|r| r.to_string()).collect(),
            ..Self::new()
        }
    }

    /// Fail the first `n` sends with a transient error, then succeed.
    pub fn with_transient_failures(n: u32) -> Self {
        let notifier = Self::new();
        notifier.transient_failures.store(n, Ordering::Relaxed);
        notifier
    }

    /// Messages delivered so far.
    pub fn sent(&self) -> Vec<AssignmentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of send attempts, failures included.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, message: &AssignmentMessage) -> Result<(), AllocationError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        if self.fail_recipients.contains(&message.to) {
            return Err(AllocationError::upstream("send", "mailbox unavailable"));
        }

        let remaining = self.transient_failures.load(Ordering::Relaxed);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::Relaxed);
            return Err(AllocationError::upstream("send", "gateway busy"));
        }

        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Repository wrapper that counts pool queries.
///
/// The idempotency tests use this to assert that the resolver is not
/// re-invoked once an allocation exists.
pub struct CountingRepository {
    inner: Arc<dyn QuestionRepository>,
    pool_queries: AtomicU32,
    id_lookups: AtomicU32,
}

impl CountingRepository {
    pub fn new(inner: Arc<dyn QuestionRepository>) -> Self {
        Self {
            inner,
            pool_queries: AtomicU32::new(0),
            id_lookups: AtomicU32::new(0),
        }
    }

    pub fn pool_queries(&self) -> u32 {
        self.pool_queries.load(Ordering::Relaxed)
    }

    pub fn id_lookups(&self) -> u32 {
        self.id_lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl QuestionRepository for CountingRepository {
    async fn find_by_teacher_and_difficulty(
        &self,
        teacher_id: &str,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, AllocationError> {
        self.pool_queries.fetch_add(1, Ordering::Relaxed);
        self.inner
            .find_by_teacher_and_difficulty(teacher_id, difficulty)
            .await
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Question>, AllocationError> {
        self.id_lookups.fetch_add(1, Ordering::Relaxed);
        self.inner.find_by_ids(ids).await
    }
}

/// Repository wrapper that fails a window of pool queries with a
/// transient error.
pub struct FlakyRepository {
    inner: Arc<dyn QuestionRepository>,
    fail_window: Range<u32>,
    calls: AtomicU32,
}

impl FlakyRepository {
    pub fn new(inner: Arc<dyn QuestionRepository>, fail_window: Range<u32>) -> Self {
        Self {
            inner,
            fail_window,
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl QuestionRepository for FlakyRepository {
    async fn find_by_teacher_and_difficulty(
        &self,
        teacher_id: &str,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, AllocationError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_window.contains(&call) {
            return Err(AllocationError::upstream("pool query", "connection reset"));
        }
        self.inner
            .find_by_teacher_and_difficulty(teacher_id, difficulty)
            .await
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Question>, AllocationError> {
        self.inner.find_by_ids(ids).await
    }
}

/// Repository wrapper that stalls a window of pool queries.
pub struct SlowRepository {
    inner: Arc<dyn QuestionRepository>,
    delay: Duration,
    slow_window: Range<u32>,
    calls: AtomicU32,
}

impl SlowRepository {
    pub fn new(inner: Arc<dyn QuestionRepository>, delay: Duration, slow_window: Range<u32>) -> Self {
        Self {
            inner,
            delay,
            slow_window,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl QuestionRepository for SlowRepository {
    async fn find_by_teacher_and_difficulty(
        &self,
        teacher_id: &str,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, AllocationError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        if self.slow_window.contains(&call) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner
            .find_by_teacher_and_difficulty(teacher_id, difficulty)
            .await
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Question>, AllocationError> {
        self.inner.find_by_ids(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> AssignmentMessage {
        AssignmentMessage {
            to: to.into(),
            student_name: "Student".into(),
            subject: "Subject".into(),
            body: "Body".into(),
            attachment_name: "sheet.html".into(),
            attachment: vec![1, 2, 3],
            attachment_content_type: "text/html".into(),
        }
    }

    #[tokio::test]
    async fn records_sends() {
        let notifier = MockNotifier::new();
        notifier.send(&message("a@example.edu")).await.unwrap();
        notifier.send(&message("b@example.edu")).await.unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "a@example.edu");
        assert_eq!(notifier.call_count(), 2);
    }

    #[tokio::test]
    async fn scripted_recipient_failure() {
        let notifier = MockNotifier::failing_for(&["bad@example.edu"]);
        assert!(notifier.send(&message("bad@example.edu")).await.is_err());
        notifier.send(&message("ok@example.edu")).await.unwrap();
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn transient_failures_run_out() {
        let notifier = MockNotifier::with_transient_failures(2);
        assert!(notifier.send(&message("a@example.edu")).await.is_err());
        assert!(notifier.send(&message("a@example.edu")).await.is_err());
        notifier.send(&message("a@example.edu")).await.unwrap();
        assert_eq!(notifier.call_count(), 3);
    }
}
