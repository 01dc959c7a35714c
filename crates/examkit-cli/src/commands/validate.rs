//! The `examkit validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examkit_core::parser::{self, ValidationWarning};

pub fn execute(bank: Option<PathBuf>, course: Option<PathBuf>) -> Result<()> {
    anyhow::ensure!(
        bank.is_some() || course.is_some(),
        "pass --bank and/or --course"
    );

    let mut total_warnings = 0;

    if let Some(bank_path) = bank {
        let banks = if bank_path.is_dir() {
            parser::load_bank_directory(&bank_path)?
        } else {
            vec![parser::parse_bank(&bank_path)?]
        };

        for bank in &banks {
            println!("Bank: {} ({} questions)", bank.name, bank.questions.len());
            let warnings = parser::validate_bank(bank);
            print_warnings(&warnings);
            total_warnings += warnings.len();
        }
    }

    if let Some(course_path) = course {
        let courses = if course_path.is_dir() {
            parser::load_course_directory(&course_path)?
        } else {
            vec![parser::parse_course(&course_path)?]
        };

        for course in &courses {
            println!("Course: {} ({} students)", course.name, course.students.len());
            let warnings = parser::validate_course(course);
            print_warnings(&warnings);
            total_warnings += warnings.len();
        }
    }

    if total_warnings == 0 {
        println!("All files valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

fn print_warnings(warnings: &[ValidationWarning]) {
    for w in warnings {
        let prefix = w
            .subject_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }
}
