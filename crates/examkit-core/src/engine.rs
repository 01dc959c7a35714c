//! Batch allocation orchestrator.
//!
//! Drives allocation across a course roster, one student at a time in
//! caller-supplied order, with per-student retries and timeouts.
//! Individual failures are collected into the report; they never abort
//! the rest of the batch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use uuid::Uuid;

use crate::error::AllocationError;
use crate::model::{Course, Student};
use crate::report::{
    AllocationStatus, AssignmentSummary, BatchReport, Delivery, DeliveryStatus, DispatchReport,
    StudentOutcome,
};
use crate::store::{AllocationStore, GetOrCreate};
use crate::traits::{
    AssignmentMessage, AssignmentStore, DocumentRenderer, MessageComposer, Notifier,
    QuestionRepository,
};

/// Configuration for the allocation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Retries on transient collaborator errors (not quota shortfalls).
    pub max_retries: u32,
    /// Initial delay between retries; doubles per attempt.
    pub retry_delay: Duration,
    /// Time bound for one student's whole resolution, retries included.
    pub student_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            student_timeout: Duration::from_secs(30),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_student_allocated(&self, student_id: &str, question_count: usize, newly_created: bool);
    fn on_student_failed(&self, student_id: &str, error: &str);
    fn on_batch_complete(&self, total: usize, allocated: usize, failed: usize, elapsed: Duration);
    fn on_message_sent(&self, student_id: &str, email: &str);
    fn on_message_failed(&self, student_id: &str, email: &str, error: &str);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_student_allocated(&self, _: &str, _: usize, _: bool) {}
    fn on_student_failed(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
    fn on_message_sent(&self, _: &str, _: &str) {}
    fn on_message_failed(&self, _: &str, _: &str, _: &str) {}
}

/// The batch allocation engine.
pub struct AllocationEngine {
    repository: Arc<dyn QuestionRepository>,
    assignments: Arc<dyn AssignmentStore>,
    store: AllocationStore,
    config: EngineConfig,
}

impl AllocationEngine {
    pub fn new(
        repository: Arc<dyn QuestionRepository>,
        assignments: Arc<dyn AssignmentStore>,
        config: EngineConfig,
    ) -> Self {
        let store = AllocationStore::new(Arc::clone(&assignments));
        Self {
            repository,
            assignments,
            store,
            config,
        }
    }

    /// Pin the seed base used for first-time allocations.
    pub fn with_seed_base(mut self, base: i64) -> Self {
        self.store = AllocationStore::new(Arc::clone(&self.assignments)).with_seed_base(base);
        self
    }

    /// Allocate questions for every listed student, in the given order.
    ///
    /// Each student is fully resolved (or fails) before the next begins.
    /// Returns an error only if the assignment itself cannot be loaded;
    /// per-student failures land in the report.
    pub async fn allocate_batch(
        &self,
        assignment_id: &str,
        student_ids: &[String],
        progress: &dyn ProgressReporter,
    ) -> Result<BatchReport, AllocationError> {
        let start = Instant::now();
        let assignment = self.assignments.load(assignment_id).await?;

        let mut outcomes = Vec::with_capacity(student_ids.len());
        for student_id in student_ids {
            match self.allocate_student(assignment_id, student_id).await {
                Ok(got) => {
                    progress.on_student_allocated(
                        student_id,
                        got.allocation.question_ids.len(),
                        got.newly_created,
                    );
                    outcomes.push(StudentOutcome {
                        student_id: student_id.clone(),
                        status: if got.newly_created {
                            AllocationStatus::Allocated
                        } else {
                            AllocationStatus::AlreadyAllocated
                        },
                        question_count: got.allocation.question_ids.len(),
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(student_id = %student_id, error = %e, "allocation failed, continuing batch");
                    progress.on_student_failed(student_id, &e.to_string());
                    outcomes.push(StudentOutcome {
                        student_id: student_id.clone(),
                        status: AllocationStatus::Failed,
                        question_count: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let elapsed = start.elapsed();
        let allocated = outcomes
            .iter()
            .filter(|o| o.status != AllocationStatus::Failed)
            .count();
        progress.on_batch_complete(
            outcomes.len(),
            allocated,
            outcomes.len() - allocated,
            elapsed,
        );

        Ok(BatchReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            assignment: AssignmentSummary {
                id: assignment.id.clone(),
                name: assignment.name.clone(),
                course_id: assignment.course_id.clone(),
                quota: assignment.quota,
                roster_size: student_ids.len(),
            },
            outcomes,
            duration_ms: elapsed.as_millis() as u64,
        })
    }

    /// Lazily allocate one student and render their assignment sheet.
    pub async fn render_for_student(
        &self,
        assignment_id: &str,
        course: &Course,
        student_id: &str,
        renderer: &dyn DocumentRenderer,
    ) -> Result<Vec<u8>, AllocationError> {
        let Some(student) = course.student(student_id) else {
            return Err(AllocationError::StudentNotEnrolled {
                student_id: student_id.into(),
                course_id: course.id.clone(),
            });
        };
        self.render_for(assignment_id, course, student, renderer)
            .await
    }

    /// Lazily allocate every unallocated student, then render and send
    /// one message per student. One recipient's failure never blocks the
    /// rest.
    pub async fn dispatch_all(
        &self,
        assignment_id: &str,
        course: &Course,
        renderer: &dyn DocumentRenderer,
        composer: &dyn MessageComposer,
        notifier: &dyn Notifier,
        progress: &dyn ProgressReporter,
    ) -> Result<DispatchReport, AllocationError> {
        let start = Instant::now();
        // Fail fast if the assignment itself is missing.
        self.assignments.load(assignment_id).await?;

        let mut deliveries = Vec::with_capacity(course.students.len());
        for student in &course.students {
            match self
                .dispatch_student(assignment_id, course, student, renderer, composer, notifier)
                .await
            {
                Ok(()) => {
                    progress.on_message_sent(&student.id, &student.email);
                    deliveries.push(Delivery {
                        student_id: student.id.clone(),
                        email: student.email.clone(),
                        status: DeliveryStatus::Sent,
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        student_id = %student.id,
                        error = %e,
                        "dispatch failed, continuing with remaining students"
                    );
                    progress.on_message_failed(&student.id, &student.email, &e.to_string());
                    deliveries.push(Delivery {
                        student_id: student.id.clone(),
                        email: student.email.clone(),
                        status: DeliveryStatus::Failed,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(DispatchReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            assignment_id: assignment_id.into(),
            deliveries,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn render_for(
        &self,
        assignment_id: &str,
        course: &Course,
        student: &Student,
        renderer: &dyn DocumentRenderer,
    ) -> Result<Vec<u8>, AllocationError> {
        let got = self.allocate_student(assignment_id, &student.id).await?;
        let assignment = self.assignments.load(assignment_id).await?;
        let questions = self
            .repository
            .find_by_ids(&got.allocation.question_ids)
            .await?;
        renderer.render(&assignment, course, student, &questions)
    }

    async fn dispatch_student(
        &self,
        assignment_id: &str,
        course: &Course,
        student: &Student,
        renderer: &dyn DocumentRenderer,
        composer: &dyn MessageComposer,
        notifier: &dyn Notifier,
    ) -> Result<(), AllocationError> {
        let document = self
            .render_for(assignment_id, course, student, renderer)
            .await?;
        let assignment = self.assignments.load(assignment_id).await?;

        let message = AssignmentMessage {
            to: student.email.clone(),
            student_name: student.name.clone(),
            subject: composer.subject(&assignment, course),
            body: composer.body(&assignment, course, student),
            attachment_name: format!(
                "{}_{}_{}.{}",
                course.name,
                assignment.name,
                student.name,
                renderer.file_extension()
            ),
            attachment: document,
            attachment_content_type: renderer.content_type().to_string(),
        };

        self.send_with_retries(notifier, &message).await
    }

    /// One student's resolution: transient errors retried with doubling
    /// delay, the whole attempt bounded by the configured timeout.
    async fn allocate_student(
        &self,
        assignment_id: &str,
        student_id: &str,
    ) -> Result<GetOrCreate, AllocationError> {
        let attempts = async {
            let mut last_error = None;
            let mut delay = self.config.retry_delay;
            for retry in 0..=self.config.max_retries {
                if retry > 0 {
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(30));
                }
                match self
                    .store
                    .get_or_create(assignment_id, student_id, self.repository.as_ref())
                    .await
                {
                    Ok(got) => return Ok(got),
                    Err(e) if e.is_transient() => {
                        tracing::debug!(student_id, retry, error = %e, "transient failure");
                        last_error = Some(e);
                    }
                    Err(e) => return Err(e),
                }
            }
            Err(last_error
                .unwrap_or_else(|| AllocationError::upstream("allocation", "retries exhausted")))
        };

        match tokio::time::timeout(self.config.student_timeout, attempts).await {
            Ok(result) => result,
            Err(_) => Err(AllocationError::Timeout {
                student_id: student_id.into(),
                seconds: self.config.student_timeout.as_secs(),
            }),
        }
    }

    async fn send_with_retries(
        &self,
        notifier: &dyn Notifier,
        message: &AssignmentMessage,
    ) -> Result<(), AllocationError> {
        let mut last_error = None;
        let mut delay = self.config.retry_delay;
        for retry in 0..=self.config.max_retries {
            if retry > 0 {
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(Duration::from_secs(30));
            }
            match notifier.send(message).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() => {
                    tracing::debug!(to = %message.to, retry, error = %e, "send failed");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| AllocationError::upstream("send", "retries exhausted")))
    }
}
