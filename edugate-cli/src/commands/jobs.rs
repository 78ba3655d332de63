//! Jobs command - job board

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use edugate_core::domain::JobDraft;

use super::get_context;
use crate::output;

#[derive(Subcommand)]
pub enum JobsCommands {
    /// List job postings
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Post a job
    Post {
        #[arg(long)]
        title: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        salary: Option<String>,
        /// Full-time, part-time, contract, ...
        #[arg(long = "type")]
        job_type: Option<String>,
    },
    /// Apply to a job
    Apply {
        /// Job ID
        id: String,
        /// Link to your resume
        #[arg(long)]
        resume_url: String,
        #[arg(long, default_value = "")]
        cover_letter: String,
    },
}

pub async fn run(command: JobsCommands) -> Result<()> {
    let ctx = get_context()?;

    match command {
        JobsCommands::List { json } => {
            let jobs = ctx.jobs.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&jobs)?);
                return Ok(());
            }
            if jobs.is_empty() {
                output::info("No job postings yet.");
                return Ok(());
            }
            for job in &jobs {
                println!("{} {}", job.title.bold(), format!("({})", job.id).dimmed());
                println!(
                    "  {} · {} · {}",
                    job.company,
                    job.location.as_deref().unwrap_or("Remote"),
                    job.job_type.as_deref().unwrap_or("-")
                );
                if let Some(salary) = &job.salary {
                    println!("  {}", salary);
                }
                println!("  Posted {}", job.posted_label());
                println!("  {}", output::truncate(&job.description, 100));
                println!();
            }
        }
        JobsCommands::Post { title, company, description, location, salary, job_type } => {
            let draft = JobDraft { title, company, location, salary, job_type, description };
            let job = ctx.jobs.post(ctx.session.as_ref(), &draft).await?;
            output::success(&format!("Job posted ({})", job.id));
        }
        JobsCommands::Apply { id, resume_url, cover_letter } => {
            ctx.jobs
                .apply(ctx.session.as_ref(), &id, &resume_url, &cover_letter)
                .await?;
            output::success("Application submitted");
        }
    }

    Ok(())
}
