//! Shared fixtures and in-crate test doubles for unit tests.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::AllocationError;
use crate::model::{
    Assignment, Course, Difficulty, Question, QuotaRequest, Student,
};
use crate::resolver::DifficultyPools;
use crate::traits::{
    AssignmentMessage, AssignmentStore, DocumentRenderer, InsertOutcome, MessageComposer,
    Notifier, QuestionRepository,
};

pub(crate) fn question(id: &str, teacher_id: &str, difficulty: Difficulty) -> Question {
    Question {
        id: id.into(),
        teacher_id: teacher_id.into(),
        name: format!("Question {id}"),
        topic: "general".into(),
        difficulty,
        marks: 5,
        source: String::new(),
        description: format!("Solve problem {id}."),
        input_format: "One line.".into(),
        output_format: "One line.".into(),
        constraints: "None.".into(),
        sample_inputs: vec!["1".into()],
        sample_outputs: vec!["1".into()],
    }
}

/// A bank for teacher "t-1" with the given number of questions per level,
/// ids `e-0..`, `m-0..`, `h-0..`.
pub(crate) fn bank_questions(easy: usize, medium: usize, hard: usize) -> Vec<Question> {
    let mut questions = Vec::new();
    for i in 0..easy {
        questions.push(question(&format!("e-{i}"), "t-1", Difficulty::Easy));
    }
    for i in 0..medium {
        questions.push(question(&format!("m-{i}"), "t-1", Difficulty::Medium));
    }
    for i in 0..hard {
        questions.push(question(&format!("h-{i}"), "t-1", Difficulty::Hard));
    }
    questions
}

pub(crate) fn pools_with_counts(easy: usize, medium: usize, hard: usize) -> DifficultyPools {
    DifficultyPools::partition(bank_questions(easy, medium, hard))
}

pub(crate) fn assignment(id: &str, quota: QuotaRequest) -> Assignment {
    Assignment {
        id: id.into(),
        name: "Problem Set 1".into(),
        description: "Test assignment".into(),
        course_id: "cs101".into(),
        teacher_id: "t-1".into(),
        due_date: Utc::now(),
        total_marks: 20,
        quota,
        students: HashMap::new(),
    }
}

pub(crate) fn student(id: &str) -> Student {
    Student {
        id: id.into(),
        name: format!("Student {id}"),
        email: format!("{id}@example.edu"),
        roll_number: format!("R-{id}"),
    }
}

pub(crate) fn course_with_students(ids: &[&str]) -> Course {
    Course {
        id: "cs101".into(),
        name: "Intro to Algorithms".into(),
        teacher_id: "t-1".into(),
        students: ids.iter().copied().map(student).collect(),
    }
}

/// In-memory repository + assignment store for unit tests.
pub(crate) struct TestBackend {
    questions: Vec<Question>,
    assignments: RwLock<HashMap<String, Assignment>>,
}

impl TestBackend {
    pub(crate) fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            assignments: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) async fn put_assignment(&self, assignment: Assignment) {
        self.assignments
            .write()
            .await
            .insert(assignment.id.clone(), assignment);
    }

    pub(crate) async fn assignment(&self, id: &str) -> Option<Assignment> {
        self.assignments.read().await.get(id).cloned()
    }
}

#[async_trait]
impl QuestionRepository for TestBackend {
    async fn find_by_teacher_and_difficulty(
        &self,
        teacher_id: &str,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, AllocationError> {
        Ok(self
            .questions
            .iter()
            .filter(|q| q.teacher_id == teacher_id && q.difficulty == difficulty)
            .cloned()
            .collect())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Question>, AllocationError> {
        ids.iter()
            .map(|id| {
                self.questions
                    .iter()
                    .find(|q| &q.id == id)
                    .cloned()
                    .ok_or_else(|| {
                        AllocationError::upstream("pool query", format!("question not found: {id}"))
                    })
            })
            .collect()
    }
}

#[async_trait]
impl AssignmentStore for TestBackend {
    async fn load(&self, assignment_id: &str) -> Result<Assignment, AllocationError> {
        self.assignments
            .read()
            .await
            .get(assignment_id)
            .cloned()
            .ok_or_else(|| AllocationError::AssignmentNotFound {
                assignment_id: assignment_id.into(),
            })
    }

    async fn insert_allocation_if_absent(
        &self,
        assignment_id: &str,
        student_id: &str,
        allocation: crate::model::Allocation,
    ) -> Result<InsertOutcome, AllocationError> {
        let mut assignments = self.assignments.write().await;
        let assignment =
            assignments
                .get_mut(assignment_id)
                .ok_or_else(|| AllocationError::AssignmentNotFound {
                    assignment_id: assignment_id.into(),
                })?;
        if let Some(existing) = assignment.students.get(student_id) {
            return Ok(InsertOutcome::AlreadyPresent(existing.clone()));
        }
        assignment.students.insert(student_id.into(), allocation);
        Ok(InsertOutcome::Inserted)
    }
}

/// Repository wrapper that fails a window of calls with a transient error.
pub(crate) struct ScriptedRepo {
    questions: Vec<Question>,
    fail_window: Range<u32>,
    calls: AtomicU32,
}

impl ScriptedRepo {
    pub(crate) fn new(questions: Vec<Question>, fail_window: Range<u32>) -> Self {
        Self {
            questions,
            fail_window,
            calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    fn next_call_fails(&self) -> bool {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        self.fail_window.contains(&call)
    }
}

#[async_trait]
impl QuestionRepository for ScriptedRepo {
    async fn find_by_teacher_and_difficulty(
        &self,
        teacher_id: &str,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, AllocationError> {
        if self.next_call_fails() {
            return Err(AllocationError::upstream("pool query", "connection reset"));
        }
        Ok(self
            .questions
            .iter()
            .filter(|q| q.teacher_id == teacher_id && q.difficulty == difficulty)
            .cloned()
            .collect())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Question>, AllocationError> {
        ids.iter()
            .map(|id| {
                self.questions
                    .iter()
                    .find(|q| &q.id == id)
                    .cloned()
                    .ok_or_else(|| {
                        AllocationError::upstream("pool query", format!("question not found: {id}"))
                    })
            })
            .collect()
    }
}

/// Repository that sleeps before answering a window of calls.
pub(crate) struct SlowRepo {
    questions: Vec<Question>,
    delay: Duration,
    slow_window: Range<u32>,
    calls: AtomicU32,
}

impl SlowRepo {
    pub(crate) fn new(questions: Vec<Question>, delay: Duration, slow_window: Range<u32>) -> Self {
        Self {
            questions,
            delay,
            slow_window,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl QuestionRepository for SlowRepo {
    async fn find_by_teacher_and_difficulty(
        &self,
        teacher_id: &str,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, AllocationError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        if self.slow_window.contains(&call) {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self
            .questions
            .iter()
            .filter(|q| q.teacher_id == teacher_id && q.difficulty == difficulty)
            .cloned()
            .collect())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Question>, AllocationError> {
        ids.iter()
            .map(|id| {
                self.questions
                    .iter()
                    .find(|q| &q.id == id)
                    .cloned()
                    .ok_or_else(|| {
                        AllocationError::upstream("pool query", format!("question not found: {id}"))
                    })
            })
            .collect()
    }
}

/// Renderer returning a fixed buffer.
pub(crate) struct NullRenderer;

impl DocumentRenderer for NullRenderer {
    fn content_type(&self) -> &'static str {
        "text/plain"
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }

    fn render(
        &self,
        _assignment: &Assignment,
        _course: &Course,
        _student: &Student,
        questions: &[Question],
    ) -> Result<Vec<u8>, AllocationError> {
        Ok(format!("{} questions", questions.len()).into_bytes())
    }
}

/// Composer with fixed subject/body shapes.
pub(crate) struct StaticComposer;

impl MessageComposer for StaticComposer {
    fn subject(&self, assignment: &Assignment, course: &Course) -> String {
        format!("{}: {}", course.name, assignment.name)
    }

    fn body(&self, _assignment: &Assignment, _course: &Course, student: &Student) -> String {
        format!("Dear {},", student.name)
    }
}

/// Notifier that records deliveries and fails scripted recipients.
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<AssignmentMessage>>,
    fail_recipients: Vec<String>,
}

impl RecordingNotifier {
    pub(crate) fn failing_for(recipients: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_recipients: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub(crate) fn sent(&self) -> Vec<AssignmentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, message: &AssignmentMessage) -> Result<(), AllocationError> {
        if self.fail_recipients.contains(&message.to) {
            return Err(AllocationError::upstream("send", "mailbox unavailable"));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
