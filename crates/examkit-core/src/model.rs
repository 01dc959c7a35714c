//! Core data model types for examkit.
//!
//! These are the fundamental types the entire examkit system uses to
//! represent questions, quotas, courses, and per-student allocations.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Question difficulty levels.
///
/// A closed set: the quota resolver iterates [`Difficulty::ALL`] and the
/// compiler checks every match arm, so an unhandled level cannot slip in
/// as a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// All levels in the fixed selection order: easy, then medium, then hard.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A single question in a teacher's bank.
///
/// Read-only from the allocation engine's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier for this question.
    pub id: String,
    /// The teacher who owns this question.
    pub teacher_id: String,
    /// Human-readable name.
    pub name: String,
    /// Topic tag (e.g. "arrays").
    #[serde(default)]
    pub topic: String,
    /// Difficulty level.
    pub difficulty: Difficulty,
    /// Marks awarded for a correct solution.
    pub marks: u32,
    /// Where the question came from, if anywhere.
    #[serde(default)]
    pub source: String,
    /// Problem statement.
    pub description: String,
    /// Expected input format.
    #[serde(default)]
    pub input_format: String,
    /// Expected output format.
    #[serde(default)]
    pub output_format: String,
    /// Constraints on the input.
    #[serde(default)]
    pub constraints: String,
    /// Sample inputs, index-paired with `sample_outputs`.
    #[serde(default)]
    pub sample_inputs: Vec<String>,
    /// Sample outputs, index-paired with `sample_inputs`.
    #[serde(default)]
    pub sample_outputs: Vec<String>,
}

/// Requested question counts per difficulty level for one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaRequest {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl QuotaRequest {
    pub fn new(easy: u32, medium: u32, hard: u32) -> Self {
        Self { easy, medium, hard }
    }

    /// Total number of questions a satisfying allocation contains.
    pub fn total(&self) -> u32 {
        self.easy + self.medium + self.hard
    }

    /// Requested count for one level.
    pub fn count_for(&self, level: Difficulty) -> u32 {
        match level {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// The resolved question selection for one (assignment, student) pair.
///
/// Immutable once stored: no operation may replace the question ids of an
/// existing allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Selected question ids, ordered easy → medium → hard.
    pub question_ids: Vec<String>,
    /// The seed string the selection was derived from.
    pub seed: String,
    /// When the allocation was first created.
    pub created_at: DateTime<Utc>,
}

/// An assignment for one course, owning the per-student allocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique identifier for this assignment.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description shown to students.
    #[serde(default)]
    pub description: String,
    /// The course this assignment belongs to.
    pub course_id: String,
    /// The teacher whose question bank feeds this assignment.
    pub teacher_id: String,
    /// Submission deadline.
    pub due_date: DateTime<Utc>,
    /// Total marks for the assignment.
    pub total_marks: u32,
    /// Requested question counts per difficulty.
    pub quota: QuotaRequest,
    /// Student id → allocation. Grows monotonically; entries are added,
    /// never removed or replaced.
    #[serde(default)]
    pub students: HashMap<String, Allocation>,
}

impl Assignment {
    /// The stored allocation for a student, if one exists.
    pub fn allocation_for(&self, student_id: &str) -> Option<&Allocation> {
        self.students.get(student_id)
    }
}

/// One enrolled student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// Unique identifier for this student.
    pub id: String,
    /// Full name.
    pub name: String,
    /// Email address assignments are sent to.
    pub email: String,
    /// Institutional roll number.
    #[serde(default)]
    pub roll_number: String,
}

/// A course with its roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Unique identifier for this course.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// The teacher running the course.
    pub teacher_id: String,
    /// Enrolled students, in roster order.
    #[serde(default)]
    pub students: Vec<Student>,
}

impl Course {
    /// Find an enrolled student by id.
    pub fn student(&self, student_id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == student_id)
    }

    /// Roster ids in roster order.
    pub fn student_ids(&self) -> Vec<String> {
        self.students.iter().map(|s| s.id.clone()).collect()
    }
}

/// A teacher's question bank, as loaded from a bank file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBank {
    /// Unique identifier for this bank.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// The teacher who owns every question in the bank.
    pub teacher_id: String,
    /// The questions, in file order.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuestionBank {
    /// Count of questions at one difficulty level.
    pub fn count_at(&self, level: Difficulty) -> usize {
        self.questions
            .iter()
            .filter(|q| q.difficulty == level)
            .count()
    }
}
