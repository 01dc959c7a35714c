//! examkit CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "examkit",
    version,
    about = "Deterministic personalized assignment distribution"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an assignment and allocate questions for the whole roster
    Create {
        /// Path to the question bank TOML file
        #[arg(long)]
        bank: PathBuf,

        /// Path to the course roster TOML file
        #[arg(long)]
        course: PathBuf,

        /// Assignment name
        #[arg(long)]
        name: String,

        /// Assignment description
        #[arg(long, default_value = "")]
        description: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: String,

        /// Questions per difficulty as "easy,medium,hard" (e.g. "2,1,1")
        #[arg(long)]
        quota: String,

        /// Total marks for the assignment
        #[arg(long)]
        marks: u32,

        /// Output directory
        #[arg(long, default_value = "./examkit-out")]
        out: PathBuf,

        /// Fixed seed base for reproducible allocation runs
        #[arg(long)]
        seed_base: Option<i64>,
    },

    /// Render one student's assignment sheet, allocating lazily if needed
    Preview {
        /// Path to the assignment JSON document
        #[arg(long)]
        assignment: PathBuf,

        /// Path to the question bank TOML file
        #[arg(long)]
        bank: PathBuf,

        /// Path to the course roster TOML file
        #[arg(long)]
        course: PathBuf,

        /// Student id to preview
        #[arg(long)]
        student: String,

        /// Output HTML file (default: preview-<student>.html)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Fixed seed base for reproducible allocation runs
        #[arg(long)]
        seed_base: Option<i64>,
    },

    /// Email every student their assignment sheet
    Email {
        /// Path to the assignment JSON document
        #[arg(long)]
        assignment: PathBuf,

        /// Path to the question bank TOML file
        #[arg(long)]
        bank: PathBuf,

        /// Path to the course roster TOML file
        #[arg(long)]
        course: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for the dispatch report
        #[arg(long, default_value = "./examkit-out")]
        out: PathBuf,

        /// Fixed seed base for reproducible allocation runs
        #[arg(long)]
        seed_base: Option<i64>,
    },

    /// Validate question bank and course roster TOML files
    Validate {
        /// Path to a bank file or directory
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Path to a course file or directory
        #[arg(long)]
        course: Option<PathBuf>,
    },

    /// Create starter config, bank, and course files
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examkit=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Create {
            bank,
            course,
            name,
            description,
            due,
            quota,
            marks,
            out,
            seed_base,
        } => {
            commands::create::execute(
                bank,
                course,
                name,
                description,
                due,
                quota,
                marks,
                out,
                seed_base,
            )
            .await
        }
        Commands::Preview {
            assignment,
            bank,
            course,
            student,
            out,
            seed_base,
        } => commands::preview::execute(assignment, bank, course, student, out, seed_base).await,
        Commands::Email {
            assignment,
            bank,
            course,
            config,
            out,
            seed_base,
        } => commands::email::execute(assignment, bank, course, config, out, seed_base).await,
        Commands::Validate { bank, course } => commands::validate::execute(bank, course),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
