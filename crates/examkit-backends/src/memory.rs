//! In-memory question repository and assignment store.
//!
//! Pool queries return stable materialized lists in insertion order, and
//! allocation inserts are atomic under the store's write lock, so an
//! existing allocation is never overwritten.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use examkit_core::error::AllocationError;
use examkit_core::model::{Allocation, Assignment, Difficulty, Question, QuestionBank};
use examkit_core::traits::{AssignmentStore, InsertOutcome, QuestionRepository};

/// In-memory backend implementing both persistence seams.
#[derive(Default)]
pub struct MemoryBackend {
    questions: RwLock<Vec<Question>>,
    assignments: RwLock<HashMap<String, Assignment>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a backend pre-loaded with a bank's questions.
    pub async fn with_bank(bank: &QuestionBank) -> Self {
        let backend = Self::new();
        backend.add_questions(bank.questions.clone()).await;
        backend
    }

    pub async fn add_questions(&self, questions: Vec<Question>) {
        self.questions.write().await.extend(questions);
    }

    pub async fn put_assignment(&self, assignment: Assignment) {
        self.assignments
            .write()
            .await
            .insert(assignment.id.clone(), assignment);
    }

    /// Snapshot of an assignment, mutations included (for persistence by
    /// the caller).
    pub async fn get_assignment(&self, assignment_id: &str) -> Option<Assignment> {
        self.assignments.read().await.get(assignment_id).cloned()
    }
}

#[async_trait]
impl QuestionRepository for MemoryBackend {
    async fn find_by_teacher_and_difficulty(
        &self,
        teacher_id: &str,
        difficulty: Difficulty,
    ) -> Result<Vec<Question>, AllocationError> {
        Ok(self
            .questions
            .read()
            .await
            .iter()
            .filter(|q| q.teacher_id == teacher_id && q.difficulty == difficulty)
            .cloned()
            .collect())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Question>, AllocationError> {
        let questions = self.questions.read().await;
        ids.iter()
            .map(|id| {
                questions
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
impl AssignmentStore for MemoryBackend {
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
        allocation: Allocation,
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
        assignment
            .students
            .insert(student_id.to_string(), allocation);
        Ok(InsertOutcome::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use examkit_core::model::QuotaRequest;

    fn question(id: &str, teacher_id: &str, difficulty: Difficulty) -> Question {
        Question {
            id: id.into(),
            teacher_id: teacher_id.into(),
            name: id.to_uppercase(),
            topic: String::new(),
            difficulty,
            marks: 5,
            source: String::new(),
            description: "desc".into(),
            input_format: String::new(),
            output_format: String::new(),
            constraints: String::new(),
            sample_inputs: vec![],
            sample_outputs: vec![],
        }
    }

    fn assignment(id: &str) -> Assignment {
        Assignment {
            id: id.into(),
            name: "PS1".into(),
            description: String::new(),
            course_id: "cs101".into(),
            teacher_id: "t-1".into(),
            due_date: Utc::now(),
            total_marks: 20,
            quota: QuotaRequest::new(1, 1, 1),
            students: HashMap::new(),
        }
    }

    fn allocation(ids: &[&str]) -> Allocation {
        Allocation {
            question_ids: ids.iter().map(|s| s.to_string()).collect(),
            seed: "1-s".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn pool_queries_filter_and_keep_order() {
        let backend = MemoryBackend::new();
        backend
            .add_questions(vec![
                question("q1", "t-1", Difficulty::Easy),
                question("q2", "t-2", Difficulty::Easy),
                question("q3", "t-1", Difficulty::Hard),
                question("q4", "t-1", Difficulty::Easy),
            ])
            .await;

        let easy = backend
            .find_by_teacher_and_difficulty("t-1", Difficulty::Easy)
            .await
            .unwrap();
        let ids: Vec<&str> = easy.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q4"]);

        // The list is stable across calls.
        let again = backend
            .find_by_teacher_and_difficulty("t-1", Difficulty::Easy)
            .await
            .unwrap();
        assert_eq!(
            again.iter().map(|q| q.id.as_str()).collect::<Vec<_>>(),
            ids
        );
    }

    #[tokio::test]
    async fn find_by_ids_preserves_requested_order() {
        let backend = MemoryBackend::new();
        backend
            .add_questions(vec![
                question("q1", "t-1", Difficulty::Easy),
                question("q2", "t-1", Difficulty::Medium),
                question("q3", "t-1", Difficulty::Hard),
            ])
            .await;

        let found = backend
            .find_by_ids(&["q3".into(), "q1".into()])
            .await
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q3", "q1"]);

        let err = backend.find_by_ids(&["missing".into()]).await.unwrap_err();
        assert!(err.to_string().contains("question not found"));
    }

    #[tokio::test]
    async fn insert_if_absent_never_overwrites() {
        let backend = MemoryBackend::new();
        backend.put_assignment(assignment("a-1")).await;

        let first = backend
            .insert_allocation_if_absent("a-1", "s-1", allocation(&["q1", "q2"]))
            .await
            .unwrap();
        assert_eq!(first, InsertOutcome::Inserted);

        let second = backend
            .insert_allocation_if_absent("a-1", "s-1", allocation(&["q9"]))
            .await
            .unwrap();
        match second {
            InsertOutcome::AlreadyPresent(existing) => {
                assert_eq!(existing.question_ids, vec!["q1", "q2"]);
            }
            other => panic!("expected AlreadyPresent, got {other:?}"),
        }

        let stored = backend.get_assignment("a-1").await.unwrap();
        assert_eq!(stored.students["s-1"].question_ids, vec!["q1", "q2"]);
    }

    #[tokio::test]
    async fn concurrent_inserts_store_exactly_one() {
        use std::sync::Arc;

        let backend = Arc::new(MemoryBackend::new());
        backend.put_assignment(assignment("a-1")).await;

        let b1 = backend.clone();
        let b2 = backend.clone();
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move {
                b1.insert_allocation_if_absent("a-1", "s-1", allocation(&["q1"]))
                    .await
            }),
            tokio::spawn(async move {
                b2.insert_allocation_if_absent("a-1", "s-1", allocation(&["q2"]))
                    .await
            }),
        );
        let outcomes = [r1.unwrap().unwrap(), r2.unwrap().unwrap()];

        let inserted = outcomes
            .iter()
            .filter(|o| **o == InsertOutcome::Inserted)
            .count();
        assert_eq!(inserted, 1, "exactly one writer wins");

        let stored = backend.get_assignment("a-1").await.unwrap();
        assert_eq!(stored.students.len(), 1);
    }

    #[tokio::test]
    async fn missing_assignment_is_an_error() {
        let backend = MemoryBackend::new();
        let err = backend.load("nope").await.unwrap_err();
        assert!(matches!(err, AllocationError::AssignmentNotFound { .. }));

        let err = backend
            .insert_allocation_if_absent("nope", "s-1", allocation(&["q1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AllocationError::AssignmentNotFound { .. }));
    }
}
