//! The `examkit init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create examkit.toml
    if std::path::Path::new("examkit.toml").exists() {
        println!("examkit.toml already exists, skipping.");
    } else {
        std::fs::write("examkit.toml", SAMPLE_CONFIG)?;
        println!("Created examkit.toml");
    }

    // Create example bank
    std::fs::create_dir_all("banks")?;
    let bank_path = std::path::Path::new("banks/example.toml");
    if bank_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(bank_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    // Create example course
    std::fs::create_dir_all("courses")?;
    let course_path = std::path::Path::new("courses/example.toml");
    if course_path.exists() {
        println!("courses/example.toml already exists, skipping.");
    } else {
        std::fs::write(course_path, EXAMPLE_COURSE)?;
        println!("Created courses/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit examkit.toml with your mail gateway credentials");
    println!("  2. Run: examkit validate --bank banks/example.toml --course courses/example.toml");
    println!("  3. Run: examkit create --bank banks/example.toml --course courses/example.toml \\");
    println!("          --name \"Problem Set 1\" --due 2026-09-15 --quota 2,1,1 --marks 20");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examkit configuration

max_retries = 3
retry_delay_ms = 500
student_timeout_secs = 30
output_dir = "./examkit-out"

# Replace with type = "http" plus your gateway endpoint and key to send
# real mail. The mock notifier records messages without sending.
[notifier]
type = "mock"

# [notifier]
# type = "http"
# endpoint = "https://mail.example.com"
# api_key = "${EXAMKIT_MAIL_API_KEY}"

[mail]
from_name = "Course Staff"
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example-bank"
name = "Example Question Bank"
teacher_id = "t-1"

[[questions]]
id = "sum-pair"
name = "Sum Pair"
topic = "arrays"
difficulty = "easy"
marks = 5
description = "Given an array of integers and a target, print the indices of two numbers that add up to the target."
input_format = "n, then n integers, then the target."
output_format = "Two zero-based indices."
constraints = "2 <= n <= 10^5"
sample_inputs = ["4\n2 7 11 15\n9"]
sample_outputs = ["0 1"]

[[questions]]
id = "reverse-words"
name = "Reverse Words"
topic = "strings"
difficulty = "easy"
marks = 5
description = "Reverse the order of words in a sentence."
input_format = "One line of words."
output_format = "The words in reverse order."
constraints = "At most 10^4 characters."
sample_inputs = ["the quick brown fox"]
sample_outputs = ["fox brown quick the"]

[[questions]]
id = "balanced-brackets"
name = "Balanced Brackets"
topic = "stacks"
difficulty = "easy"
marks = 5
description = "Decide whether a bracket sequence is balanced."
input_format = "One line of brackets."
output_format = "YES or NO."
constraints = "At most 10^5 characters."
sample_inputs = ["([]{})"]
sample_outputs = ["YES"]

[[questions]]
id = "rotate-matrix"
name = "Rotate Matrix"
topic = "matrices"
difficulty = "medium"
marks = 8
description = "Rotate an n x n matrix 90 degrees clockwise in place."
input_format = "n, then n rows of n integers."
output_format = "The rotated matrix."
constraints = "1 <= n <= 500"
sample_inputs = ["2\n1 2\n3 4"]
sample_outputs = ["3 1\n4 2"]

[[questions]]
id = "longest-unique"
name = "Longest Unique Substring"
topic = "strings"
difficulty = "medium"
marks = 8
description = "Find the length of the longest substring without repeating characters."
input_format = "One line."
output_format = "One integer."
constraints = "At most 10^5 characters."
sample_inputs = ["abcabcbb"]
sample_outputs = ["3"]

[[questions]]
id = "median-sorted"
name = "Median of Two Sorted Arrays"
topic = "binary-search"
difficulty = "hard"
marks = 12
description = "Find the median of two sorted arrays in logarithmic time."
input_format = "Two lines, one array each."
output_format = "The median."
constraints = "Total length up to 2 * 10^5."
sample_inputs = ["1 3\n2"]
sample_outputs = ["2.0"]

[[questions]]
id = "word-ladder"
name = "Word Ladder"
topic = "graphs"
difficulty = "hard"
marks = 12
description = "Find the length of the shortest transformation sequence between two words."
input_format = "Start word, end word, then the dictionary."
output_format = "One integer, or 0 if impossible."
constraints = "Up to 5000 words."
sample_inputs = ["hit cog\nhot dot dog lot log cog"]
sample_outputs = ["5"]
"#;

const EXAMPLE_COURSE: &str = r#"[course]
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
roll_number = "R002"
"#;
