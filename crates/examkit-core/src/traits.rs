//! Collaborator traits consumed and fed by the allocation engine.
//!
//! These async traits are implemented by the `examkit-backends` and
//! `examkit-render` crates; the engine only ever sees the seams defined
//! here.

use async_trait::async_trait;

use crate::error::AllocationError;
use crate::model::{Allocation, Assignment, Course, Difficulty, Question, Student};

// ---------------------------------------------------------------------------
// Question repository
// ---------------------------------------------------------------------------

/// Read-only access to a teacher's question pool.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// All questions owned by a teacher at one difficulty level, as a
    /// stable materialized list: the order must not change between calls
    /// for an unchanged bank, so the shuffle operates on a fixed pool.
    async fn find_by_teacher_and_difficulty(
        &self,
        teacher_id: &str,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, AllocationError>;

    /// Resolve stored question ids back to questions, preserving the
    /// requested order. Every id must resolve; a missing question is an
    /// upstream failure.
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Question>, AllocationError>;
}

// ---------------------------------------------------------------------------
// Assignment persistence
// ---------------------------------------------------------------------------

/// Outcome of an atomic allocation insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// The allocation was stored; this writer won.
    Inserted,
    /// An allocation for the pair already existed; the stored one is
    /// returned unchanged.
    AlreadyPresent(Allocation),
}

/// Persistence for assignments and their student → allocation mapping.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Load an assignment by id.
    async fn load(&self, assignment_id: &str) -> Result<Assignment, AllocationError>;

    /// Store an allocation for a student if and only if none exists yet.
    ///
    /// This is the primitive that keeps allocations immutable under
    /// concurrency: an existing entry is never overwritten, and the
    /// caller learns which writer won.
    async fn insert_allocation_if_absent(
        &self,
        assignment_id: &str,
        student_id: &str,
        allocation: Allocation,
    ) -> Result<InsertOutcome, AllocationError>;
}

// ---------------------------------------------------------------------------
// Document rendering
// ---------------------------------------------------------------------------

/// Renders one student's assignment into a document buffer.
///
/// Only invoked after an allocation exists for the student.
pub trait DocumentRenderer: Send + Sync {
    /// MIME type of the rendered document.
    fn content_type(&self) -> &'static str;

    /// File extension for attachments (without the dot).
    fn file_extension(&self) -> &'static str;

    fn render(
        &self,
        assignment: &Assignment,
        course: &Course,
        student: &Student,
        questions: &[Question],
    ) -> Result<Vec<u8>, AllocationError>;
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// Composes the subject and body of an assignment message.
pub trait MessageComposer: Send + Sync {
    fn subject(&self, assignment: &Assignment, course: &Course) -> String;

    fn body(&self, assignment: &Assignment, course: &Course, student: &Student) -> String;
}

/// One outbound assignment message with its rendered attachment.
#[derive(Debug, Clone)]
pub struct AssignmentMessage {
    /// Recipient address.
    pub to: String,
    /// Recipient display name.
    pub student_name: String,
    /// Message subject.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Attachment file name.
    pub attachment_name: String,
    /// Rendered document bytes.
    pub attachment: Vec<u8>,
    /// MIME type of the attachment.
    pub attachment_content_type: String,
}

/// Delivers assignment messages, one recipient at a time.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Human-readable notifier name (e.g. "http", "mock").
    fn name(&self) -> &str;

    /// Send one message. A failure affects only this recipient.
    async fn send(&self, message: &AssignmentMessage) -> Result<(), AllocationError>;
}
