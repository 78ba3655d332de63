//! Manage command - courses the signed-in user teaches

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use edugate_core::CourseDraft;

use super::get_context;
use crate::output;

#[derive(Subcommand)]
pub enum ManageCommands {
    /// List your courses
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a course
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Cover image URL
        #[arg(long)]
        image_url: String,
        /// Duration label, e.g. "6 weeks"
        #[arg(long)]
        duration: String,
    },
    /// Edit a course; omitted fields keep their current value
    Edit {
        /// Course ID
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        duration: Option<String>,
    },
    /// Delete a course
    Delete {
        /// Course ID
        id: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

pub async fn run(command: ManageCommands) -> Result<()> {
    let ctx = get_context()?;
    let session = ctx.session.as_ref();

    match command {
        ManageCommands::List { json } => {
            let courses = ctx.admin.my_courses(session).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&courses)?);
                return Ok(());
            }
            if courses.is_empty() {
                output::info("You haven't added any courses yet. Use 'edu manage add'.");
                return Ok(());
            }
            let mut table = output::create_table();
            table.set_header(vec!["ID", "Title", "Duration", "Students", "Added"]);
            for course in &courses {
                table.add_row(vec![
                    course.id.clone(),
                    output::truncate(&course.title, 40),
                    course.duration.clone().unwrap_or_default(),
                    course.enrollments.to_string(),
                    course
                        .added_at
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                ]);
            }
            println!("{}", table);
        }
        ManageCommands::Add { title, description, image_url, duration } => {
            let draft = CourseDraft { title, description, image_url, duration };
            let course = ctx.admin.create(session, &draft).await?;
            output::success(&format!("Course added ({})", course.id));
        }
        ManageCommands::Edit { id, title, description, image_url, duration } => {
            let current = ctx.catalog.course_detail(&id).await?;
            let mut draft = CourseDraft::from_course(&current);
            if let Some(v) = title {
                draft.title = v;
            }
            if let Some(v) = description {
                draft.description = v;
            }
            if let Some(v) = image_url {
                draft.image_url = v;
            }
            if let Some(v) = duration {
                draft.duration = v;
            }
            ctx.admin.update(session, &id, &draft).await?;
            output::success("Course updated");
        }
        ManageCommands::Delete { id, force } => {
            if !force {
                println!("\n{}", format!("This will permanently delete course '{}'.", id).yellow());
                println!("{}\n", "Students enrolled in it lose their enrollment.".dimmed());

                if !Confirm::new()
                    .with_prompt("Are you sure?")
                    .default(false)
                    .interact()?
                {
                    println!("{}\n", "Cancelled".dimmed());
                    return Ok(());
                }
            }
            ctx.admin.delete(session, &id).await?;
            output::success(&format!("Course '{}' deleted", id));
        }
    }

    Ok(())
}
