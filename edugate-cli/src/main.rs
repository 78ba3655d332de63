//! EduGate CLI - the course marketplace in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use edugate_core::services::{init_tracing, LogFormat};
use edugate_core::Error;

mod commands;
mod output;

use commands::{config, course, courses, enroll, enrollments, jobs, manage};

/// EduGate - browse courses, enroll and manage your own
#[derive(Parser)]
#[command(name = "edu", version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List courses
    Courses {
        /// Sort order (newest, popular, rating)
        #[arg(long, default_value = "addedAt_desc")]
        sort: String,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Filter by title or description
        #[arg(long)]
        search: Option<String>,
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a course with its seats and enrollment status
    Course {
        /// Course ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Enroll in a course
    Enroll {
        /// Course ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drop a course
    Unenroll {
        /// Course ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show your enrollments
    Enrollments {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the courses you teach
    Manage {
        #[command(subcommand)]
        command: manage::ManageCommands,
    },

    /// Browse and apply to jobs
    Jobs {
        #[command(subcommand)]
        command: jobs::JobsCommands,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogFormat::from_env(), cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            if e.downcast_ref::<Error>().is_some_and(Error::requires_sign_in) {
                eprintln!("Sign in by setting EDUGATE_USER_EMAIL and EDUGATE_ID_TOKEN.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Courses { sort, page, search, category, json } => {
            courses::run(&sort, page, search, category, json).await
        }
        Commands::Course { id, json } => course::run(&id, json).await,
        Commands::Enroll { id, json } => enroll::run_enroll(&id, json).await,
        Commands::Unenroll { id, json } => enroll::run_unenroll(&id, json).await,
        Commands::Enrollments { json } => enrollments::run(json).await,
        Commands::Manage { command } => manage::run(command).await,
        Commands::Jobs { command } => jobs::run(command).await,
        Commands::Config { command } => config::run(command),
    }
}
