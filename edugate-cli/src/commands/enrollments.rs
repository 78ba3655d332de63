//! Enrollments command - the "my courses" dashboard

use anyhow::Result;
use colored::Colorize;

use edugate_core::domain::MAX_CONCURRENT_ENROLLMENTS;
use edugate_core::OperationResult;

use super::get_context;
use crate::output;

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let enrollments = ctx.catalog.my_enrollments(ctx.session.as_ref()).await?;

    if json {
        let result = OperationResult::ok(&enrollments)
            .with_context("limit", MAX_CONCURRENT_ENROLLMENTS.into());
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", "My Enrolled Courses".bold());
    println!(
        "You have enrolled in {} out of {} courses",
        enrollments.len(),
        MAX_CONCURRENT_ENROLLMENTS
    );
    println!();

    if enrollments.is_empty() {
        output::info("You haven't enrolled in any courses yet. Try 'edu courses'.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Course ID", "Title", "Description", "Enrolled"]);
    for e in &enrollments {
        table.add_row(vec![
            e.course_id.clone(),
            e.title().to_string(),
            output::truncate(e.description(), 60),
            e.enrolled_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    println!("{}", "Drop a course with 'edu unenroll <id>'.".dimmed());

    Ok(())
}
