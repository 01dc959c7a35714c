//! TOML question-bank and course-roster parsing.
//!
//! Loads banks and courses from TOML files and directories, and
//! validates them for common authoring mistakes.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Course, Difficulty, Question, QuestionBank, Student};

/// Intermediate TOML structure for bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    teacher_id: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    name: String,
    #[serde(default)]
    topic: String,
    difficulty: String,
    marks: u32,
    #[serde(default)]
    source: String,
    description: String,
    #[serde(default)]
    input_format: String,
    #[serde(default)]
    output_format: String,
    #[serde(default)]
    constraints: String,
    #[serde(default)]
    sample_inputs: Vec<String>,
    #[serde(default)]
    sample_outputs: Vec<String>,
}

/// Intermediate TOML structure for course files.
#[derive(Debug, Deserialize)]
struct TomlCourseFile {
    course: TomlCourseHeader,
    #[serde(default)]
    students: Vec<TomlStudent>,
}

#[derive(Debug, Deserialize)]
struct TomlCourseHeader {
    id: String,
    name: String,
    teacher_id: String,
}

#[derive(Debug, Deserialize)]
struct TomlStudent {
    id: String,
    name: String,
    email: String,
    #[serde(default)]
    roll_number: String,
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bank file: {}", path.display()))?;
    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let teacher_id = parsed.bank.teacher_id;
    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let difficulty: Difficulty = q
                .difficulty
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question '{}': {}", q.id, e))?;
            Ok(Question {
                id: q.id,
                teacher_id: teacher_id.clone(),
                name: q.name,
                topic: q.topic,
                difficulty,
                marks: q.marks,
                source: q.source,
                description: q.description,
                input_format: q.input_format,
                output_format: q.output_format,
                constraints: q.constraints,
                sample_inputs: q.sample_inputs,
                sample_outputs: q.sample_outputs,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuestionBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        teacher_id,
        questions,
    })
}

/// Parse a single TOML file into a `Course`.
pub fn parse_course(path: &Path) -> Result<Course> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read course file: {}", path.display()))?;
    parse_course_str(&content, path)
}

/// Parse a TOML string into a `Course` (useful for testing).
pub fn parse_course_str(content: &str, source_path: &Path) -> Result<Course> {
    let parsed: TomlCourseFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(Course {
        id: parsed.course.id,
        name: parsed.course.name,
        teacher_id: parsed.course.teacher_id,
        students: parsed
            .students
            .into_iter()
            .map(|s| Student {
                id: s.id,
                name: s.name,
                email: s.email,
                roll_number: s.roll_number,
            })
            .collect(),
    })
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Recursively load all `.toml` course files from a directory.
pub fn load_course_directory(dir: &Path) -> Result<Vec<Course>> {
    let mut courses = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            courses.extend(load_course_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_course(&path) {
                Ok(course) => courses.push(course),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(courses)
}

/// A warning from bank or course validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question or student id the warning refers to (if any).
    pub subject_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a question bank for common issues.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.questions.is_empty() {
        warnings.push(ValidationWarning {
            subject_id: None,
            message: "bank contains no questions".into(),
        });
    }

    // Check for duplicate question IDs
    let mut seen_ids = std::collections::HashSet::new();
    for question in &bank.questions {
        if !seen_ids.insert(&question.id) {
            warnings.push(ValidationWarning {
                subject_id: Some(question.id.clone()),
                message: format!("duplicate question ID: {}", question.id),
            });
        }
    }

    for question in &bank.questions {
        if question.description.trim().is_empty() {
            warnings.push(ValidationWarning {
                subject_id: Some(question.id.clone()),
                message: "description is empty".into(),
            });
        }
        if question.sample_inputs.len() != question.sample_outputs.len() {
            warnings.push(ValidationWarning {
                subject_id: Some(question.id.clone()),
                message: format!(
                    "sample inputs and outputs must be the same length ({} vs {})",
                    question.sample_inputs.len(),
                    question.sample_outputs.len()
                ),
            });
        }
        if question.marks == 0 {
            warnings.push(ValidationWarning {
                subject_id: Some(question.id.clone()),
                message: "marks is zero".into(),
            });
        }
    }

    warnings
}

/// Validate a course roster for common issues.
pub fn validate_course(course: &Course) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if course.students.is_empty() {
        warnings.push(ValidationWarning {
            subject_id: None,
            message: "course has an empty roster".into(),
        });
    }

    let mut seen_ids = std::collections::HashSet::new();
    let mut seen_emails = std::collections::HashSet::new();
    for student in &course.students {
        if !seen_ids.insert(&student.id) {
            warnings.push(ValidationWarning {
                subject_id: Some(student.id.clone()),
                message: format!("duplicate student ID: {}", student.id),
            });
        }
        if student.email.trim().is_empty() {
            warnings.push(ValidationWarning {
                subject_id: Some(student.id.clone()),
                message: "email is empty".into(),
            });
        } else if !seen_emails.insert(&student.email) {
            warnings.push(ValidationWarning {
                subject_id: Some(student.id.clone()),
                message: format!("duplicate email: {}", student.email),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_BANK: &str = r#"
[bank]
id = "algo-bank"
name = "Algorithms Bank"
teacher_id = "t-1"

[[questions]]
id = "two-sum"
name = "Two Sum"
topic = "arrays"
difficulty = "easy"
marks = 5
description = """
Given an array of integers and a target, return indices of the two
numbers that add up to the target.
"""
input_format = "n, then n integers, then the target."
output_format = "Two zero-based indices."
constraints = "2 <= n <= 10^5"
sample_inputs = ["4\n2 7 11 15\n9"]
sample_outputs = ["0 1"]

[[questions]]
id = "median-streams"
name = "Median of Two Sorted Arrays"
topic = "binary-search"
difficulty = "hard"
marks = 10
description = "Find the median of two sorted arrays."
"#;

    const VALID_COURSE: &str = r#"
[course]
id = "cs101"
name = "Intro to Algorithms"
teacher_id = "t-1"

[[students]]
id = "s-1"
name = "Ada Lovelace"
email = "ada@example.edu"
roll_number = "R001"

[[students]]
id = "s-2"
name = "Alan Turing"
email = "alan@example.edu"
"#;

    #[test]
    fn parse_valid_bank() {
        let bank = parse_bank_str(VALID_BANK, &PathBuf::from("bank.toml")).unwrap();
        assert_eq!(bank.id, "algo-bank");
        assert_eq!(bank.teacher_id, "t-1");
        assert_eq!(bank.questions.len(), 2);
        assert_eq!(bank.questions[0].difficulty, Difficulty::Easy);
        assert_eq!(bank.questions[0].teacher_id, "t-1");
        assert_eq!(bank.questions[1].difficulty, Difficulty::Hard);
        assert_eq!(bank.count_at(Difficulty::Medium), 0);
    }

    #[test]
    fn parse_valid_course() {
        let course = parse_course_str(VALID_COURSE, &PathBuf::from("course.toml")).unwrap();
        assert_eq!(course.id, "cs101");
        assert_eq!(course.students.len(), 2);
        assert_eq!(course.students[0].roll_number, "R001");
        assert_eq!(course.students[1].roll_number, "");
    }

    #[test]
    fn unknown_difficulty_is_an_error() {
        let toml = r#"
[bank]
id = "b"
name = "B"
teacher_id = "t-1"

[[questions]]
id = "q1"
name = "Q1"
difficulty = "legendary"
marks = 5
description = "x"
"#;
        let err = parse_bank_str(toml, &PathBuf::from("bank.toml")).unwrap_err();
        assert!(err.to_string().contains("unknown difficulty"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_bank_str(bad, &PathBuf::from("bad.toml")).is_err());
        assert!(parse_course_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_duplicate_question_ids() {
        let toml = r#"
[bank]
id = "b"
name = "B"
teacher_id = "t-1"

[[questions]]
id = "same"
name = "First"
difficulty = "easy"
marks = 5
description = "x"

[[questions]]
id = "same"
name = "Second"
difficulty = "easy"
marks = 5
description = "y"
"#;
        let bank = parse_bank_str(toml, &PathBuf::from("bank.toml")).unwrap();
        let warnings = validate_bank(&bank);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
    }

    #[test]
    fn validate_sample_length_mismatch() {
        let toml = r#"
[bank]
id = "b"
name = "B"
teacher_id = "t-1"

[[questions]]
id = "q1"
name = "Q1"
difficulty = "medium"
marks = 5
description = "x"
sample_inputs = ["1", "2"]
sample_outputs = ["1"]
"#;
        let bank = parse_bank_str(toml, &PathBuf::from("bank.toml")).unwrap();
        let warnings = validate_bank(&bank);
        assert!(warnings.iter().any(|w| w.message.contains("same length")));
    }

    #[test]
    fn validate_empty_bank_and_roster() {
        let bank = parse_bank_str(
            "[bank]\nid = \"b\"\nname = \"B\"\nteacher_id = \"t\"\n",
            &PathBuf::from("bank.toml"),
        )
        .unwrap();
        assert!(validate_bank(&bank)
            .iter()
            .any(|w| w.message.contains("no questions")));

        let course = parse_course_str(
            "[course]\nid = \"c\"\nname = \"C\"\nteacher_id = \"t\"\n",
            &PathBuf::from("course.toml"),
        )
        .unwrap();
        assert!(validate_course(&course)
            .iter()
            .any(|w| w.message.contains("empty roster")));
    }

    #[test]
    fn validate_duplicate_emails() {
        let toml = r#"
[course]
id = "c"
name = "C"
teacher_id = "t-1"

[[students]]
id = "s-1"
name = "A"
email = "same@example.edu"

[[students]]
id = "s-2"
name = "B"
email = "same@example.edu"
"#;
        let course = parse_course_str(toml, &PathBuf::from("course.toml")).unwrap();
        let warnings = validate_course(&course);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate email")));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bank.toml"), VALID_BANK).unwrap();

        let banks = load_bank_directory(dir.path()).unwrap();
        assert_eq!(banks.len(), 1);
        assert_eq!(banks[0].id, "algo-bank");
    }
}
