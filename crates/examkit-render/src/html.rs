//! HTML assignment sheet generator.
//!
//! Produces a self-contained HTML file with all CSS inlined, one section
//! per question in allocation order.

use examkit_core::error::AllocationError;
use examkit_core::model::{Assignment, Course, Question, Student};
use examkit_core::traits::DocumentRenderer;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate the HTML sheet for one student's assignment.
pub fn generate_sheet(
    assignment: &Assignment,
    course: &Course,
    student: &Student,
    questions: &[Question],
) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>{} — {}</title>\n",
        html_escape(&course.name),
        html_escape(&assignment.name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&assignment.name)));
    if !assignment.description.is_empty() {
        html.push_str(&format!(
            "<p class=\"description\">{}</p>\n",
            html_escape(&assignment.description)
        ));
    }
    html.push_str(&format!(
        "<p class=\"meta\">Course: <strong>{}</strong> | Due: {} | Total Marks: {}</p>\n",
        html_escape(&course.name),
        assignment.due_date.format("%Y-%m-%d"),
        assignment.total_marks
    ));
    html.push_str(&format!(
        "<p class=\"meta\">Student: <strong>{}</strong>{}</p>\n",
        html_escape(&student.name),
        if student.roll_number.is_empty() {
            String::new()
        } else {
            format!(" | Roll Number: {}", html_escape(&student.roll_number))
        }
    ));
    html.push_str("</header>\n");

    // Questions
    html.push_str("<section class=\"questions\">\n");
    let mut allocated_marks = 0;
    for (index, question) in questions.iter().enumerate() {
        allocated_marks += question.marks;
        html.push_str("<article class=\"question\">\n");
        html.push_str(&format!(
            "<h2>Question {} <span class=\"tag\">{}</span> <span class=\"tag\">{} marks</span></h2>\n",
            index + 1,
            question.difficulty,
            question.marks
        ));
        html.push_str(&format!(
            "<p class=\"statement\">{}</p>\n",
            html_escape(&question.description)
        ));

        if !question.input_format.is_empty() {
            html.push_str(&format!(
                "<h3>Input Format</h3>\n<p>{}</p>\n",
                html_escape(&question.input_format)
            ));
        }
        if !question.output_format.is_empty() {
            html.push_str(&format!(
                "<h3>Output Format</h3>\n<p>{}</p>\n",
                html_escape(&question.output_format)
            ));
        }
        if !question.constraints.is_empty() {
            html.push_str(&format!(
                "<h3>Constraints</h3>\n<p>{}</p>\n",
                html_escape(&question.constraints)
            ));
        }

        for (i, (input, output)) in question
            .sample_inputs
            .iter()
            .zip(question.sample_outputs.iter())
            .enumerate()
        {
            html.push_str(&format!(
                "<h3>Sample {}</h3>\n<pre class=\"sample\">Input:\n{}\n\nOutput:\n{}</pre>\n",
                i + 1,
                html_escape(input),
                html_escape(output)
            ));
        }

        html.push_str("</article>\n");
    }
    html.push_str("</section>\n");

    // Footer
    html.push_str(&format!(
        "<footer><p>Total marks on this sheet: {allocated_marks}</p></footer>\n"
    ));

    html.push_str("</body>\n</html>");
    html
}

const CSS: &str = r#"
body { font-family: Georgia, serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; color: #222; }
header { border-bottom: 2px solid #222; padding-bottom: 1rem; margin-bottom: 1.5rem; }
h1 { margin-bottom: 0.25rem; }
.meta { color: #555; margin: 0.2rem 0; }
.description { font-style: italic; }
.question { border-bottom: 1px solid #ccc; padding: 1rem 0; page-break-after: always; }
.question h2 { font-size: 1.1rem; }
.question h3 { font-size: 0.95rem; margin-bottom: 0.2rem; }
.tag { font-size: 0.75rem; font-weight: normal; background: #eee; border-radius: 3px; padding: 0.1rem 0.4rem; margin-left: 0.3rem; }
.sample { background: #f6f6f6; padding: 0.6rem; border-radius: 4px; overflow-x: auto; }
footer { text-align: right; color: #555; margin-top: 1rem; }
"#;

/// `DocumentRenderer` producing self-contained HTML sheets.
pub struct HtmlRenderer;

impl DocumentRenderer for HtmlRenderer {
    fn content_type(&self) -> &'static str {
        "text/html"
    }

    fn file_extension(&self) -> &'static str {
        "html"
    }

    fn render(
        &self,
        assignment: &Assignment,
        course: &Course,
        student: &Student,
        questions: &[Question],
    ) -> Result<Vec<u8>, AllocationError> {
        Ok(generate_sheet(assignment, course, student, questions).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use examkit_core::model::{Difficulty, QuotaRequest};
    use std::collections::HashMap;

    fn fixture() -> (Assignment, Course, Student, Vec<Question>) {
        let assignment = Assignment {
            id: "a-1".into(),
            name: "Problem Set <1>".into(),
            description: "Warm-up problems".into(),
            course_id: "cs101".into(),
            teacher_id: "t-1".into(),
            due_date: Utc::now(),
            total_marks: 15,
            quota: QuotaRequest::new(1, 1, 0),
            students: HashMap::new(),
        };
        let course = Course {
            id: "cs101".into(),
            name: "Intro to Algorithms".into(),
            teacher_id: "t-1".into(),
            students: vec![],
        };
        let student = Student {
            id: "s-1".into(),
            name: "Ada & Co".into(),
            email: "ada@example.edu".into(),
            roll_number: "R001".into(),
        };
        let questions = vec![
            Question {
                id: "q1".into(),
                teacher_id: "t-1".into(),
                name: "Two Sum".into(),
                topic: "arrays".into(),
                difficulty: Difficulty::Easy,
                marks: 5,
                source: String::new(),
                description: "Find indices with a[i] + a[j] == target".into(),
                input_format: "n, array, target".into(),
                output_format: "two indices".into(),
                constraints: "n <= 10^5".into(),
                sample_inputs: vec!["4\n2 7 11 15\n9".into()],
                sample_outputs: vec!["0 1".into()],
            },
            Question {
                id: "q2".into(),
                teacher_id: "t-1".into(),
                name: "Median".into(),
                topic: "search".into(),
                difficulty: Difficulty::Medium,
                marks: 10,
                source: String::new(),
                description: "Median of two sorted arrays".into(),
                input_format: String::new(),
                output_format: String::new(),
                constraints: String::new(),
                sample_inputs: vec![],
                sample_outputs: vec![],
            },
        ];
        (assignment, course, student, questions)
    }

    #[test]
    fn sheet_contains_everything() {
        let (assignment, course, student, questions) = fixture();
        let html = generate_sheet(&assignment, &course, &student, &questions);

        assert!(html.contains("Intro to Algorithms"));
        assert!(html.contains("Question 1"));
        assert!(html.contains("Question 2"));
        assert!(html.contains("Find indices"));
        assert!(html.contains("Sample 1"));
        assert!(html.contains("Total marks on this sheet: 15"));
        assert!(html.contains("R001"));
    }

    #[test]
    fn questions_render_in_allocation_order() {
        let (assignment, course, student, questions) = fixture();
        let html = generate_sheet(&assignment, &course, &student, &questions);

        let first = html.find("Find indices").unwrap();
        let second = html.find("Median of two sorted arrays").unwrap();
        assert!(first < second);
    }

    #[test]
    fn escapes_markup() {
        let (assignment, course, student, questions) = fixture();
        let html = generate_sheet(&assignment, &course, &student, &questions);

        assert!(html.contains("Problem Set &lt;1&gt;"));
        assert!(html.contains("Ada &amp; Co"));
        assert!(!html.contains("Problem Set <1>"));
    }

    #[test]
    fn renderer_trait_metadata() {
        let renderer = HtmlRenderer;
        assert_eq!(renderer.content_type(), "text/html");
        assert_eq!(renderer.file_extension(), "html");

        let (assignment, course, student, questions) = fixture();
        let bytes = renderer
            .render(&assignment, &course, &student, &questions)
            .unwrap();
        assert!(String::from_utf8(bytes).unwrap().starts_with("<!DOCTYPE html>"));
    }
}
