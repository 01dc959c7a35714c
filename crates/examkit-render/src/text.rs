//! Plain-text email subject and body composition.

use examkit_core::model::{Assignment, Course, Student};
use examkit_core::traits::MessageComposer;

/// Composes the plain-text message that accompanies an assignment sheet.
pub struct PlainTextComposer {
    from_name: String,
}

impl PlainTextComposer {
    pub fn new(from_name: &str) -> Self {
        Self {
            from_name: from_name.to_string(),
        }
    }
}

impl MessageComposer for PlainTextComposer {
    fn subject(&self, assignment: &Assignment, course: &Course) -> String {
        format!("{}: {}", course.name, assignment.name)
    }

    fn body(&self, assignment: &Assignment, course: &Course, student: &Student) -> String {
        let due = assignment.due_date.format("%A, %B %d, %Y");
        format!(
            "Dear {},\n\n\
             Please find attached your personalized assignment for {}.\n\n\
             Assignment: {}\n\
             Due Date: {}\n\n\
             Please submit your completed assignment by the due date.\n\n\
             Best regards,\n\
             {}\n",
            student.name, course.name, assignment.name, due, self.from_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use examkit_core::model::QuotaRequest;
    use std::collections::HashMap;

    fn fixture() -> (Assignment, Course, Student) {
        let assignment = Assignment {
            id: "a-1".into(),
            name: "Problem Set 1".into(),
            description: String::new(),
            course_id: "cs101".into(),
            teacher_id: "t-1".into(),
            due_date: chrono::Utc.with_ymd_and_hms(2026, 9, 15, 23, 59, 0).unwrap(),
            total_marks: 20,
            quota: QuotaRequest::new(2, 1, 1),
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
            name: "Ada Lovelace".into(),
            email: "ada@example.edu".into(),
            roll_number: "R001".into(),
        };
        (assignment, course, student)
    }

    #[test]
    fn subject_is_course_then_assignment() {
        let (assignment, course, _) = fixture();
        let composer = PlainTextComposer::new("Prof. Babbage");
        assert_eq!(
            composer.subject(&assignment, &course),
            "Intro to Algorithms: Problem Set 1"
        );
    }

    #[test]
    fn body_is_personalized() {
        let (assignment, course, student) = fixture();
        let composer = PlainTextComposer::new("Prof. Babbage");
        let body = composer.body(&assignment, &course, &student);

        assert!(body.starts_with("Dear Ada Lovelace,"));
        assert!(body.contains("Intro to Algorithms"));
        assert!(body.contains("Problem Set 1"));
        assert!(body.contains("Tuesday, September 15, 2026"));
        assert!(body.trim_end().ends_with("Prof. Babbage"));
    }
}
