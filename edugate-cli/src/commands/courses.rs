//! Courses command - paginated course list

use anyhow::Result;
use colored::Colorize;

use edugate_core::{CourseQuery, CourseSort};

use super::get_context;
use crate::output;

pub async fn run(
    sort: &str,
    page: u32,
    search: Option<String>,
    category: Option<String>,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let query = CourseQuery {
        sort: sort.parse::<CourseSort>()?,
        page,
        per_page: ctx.config.courses_per_page,
        search,
        category,
    };
    let result = ctx.catalog.browse(&query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{} ({}, page {})", "All Courses".bold(), query.sort.label(), result.page);
    println!();

    if result.courses.is_empty() {
        output::warning("No courses match your filters.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["ID", "Title", "Instructor", "Duration", "Enrolled", "Rating"]);
    for course in &result.courses {
        table.add_row(vec![
            course.id.clone(),
            output::truncate(&course.title, 40),
            course.instructor().to_string(),
            course.duration.clone().unwrap_or_default(),
            course.enrollments.to_string(),
            format!("{:.1}", course.rating),
        ]);
    }
    println!("{}", table);

    let mut nav = Vec::new();
    if result.has_previous {
        nav.push(format!("--page {} for previous", result.page - 1));
    }
    if result.has_next {
        nav.push(format!("--page {} for more", result.page + 1));
    }
    if !nav.is_empty() {
        println!("{}", nav.join(", ").dimmed());
    }

    Ok(())
}
