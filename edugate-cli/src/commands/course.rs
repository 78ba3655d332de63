//! Course command - course detail with seats and the enroll control

use anyhow::{bail, Result};
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use serde::Serialize;

use edugate_core::services::{ControlState, ViewState};

use super::get_context;
use crate::output;

#[derive(Serialize)]
struct CourseDetail {
    #[serde(flatten)]
    view: ViewState,
    control: ControlState,
}

pub async fn run(id: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let session = ctx.session.as_ref();
    let view = ctx.enrollment.open(id, session).await;
    let state = view.snapshot();
    let control = state.enroll_control(session.current_user().as_ref());

    if json {
        let detail = CourseDetail { view: state, control };
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    if state.is_not_found() {
        bail!("Course '{}' not found", id);
    }
    if let Some(msg) = state.load_error_message() {
        output::warning(msg);
        println!();
    }

    let Some(course) = &state.course else {
        return Ok(());
    };

    println!("{}", course.title.bold());
    println!("{}", course.description);
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec!["Instructor", course.instructor()]);
    table.add_row(vec!["Duration", course.duration.as_deref().unwrap_or("-")]);
    table.add_row(vec!["Category", course.category.as_deref().unwrap_or("-")]);
    table.add_row(vec!["Students", &course.enrollments.to_string()]);
    table.add_row(vec!["Rating", &format!("{:.1}", course.rating)]);
    if let Some(seats) = &state.seat_info {
        let label = if seats.is_full {
            "Full".to_string()
        } else {
            format!("{} of {} available", seats.available_seats, seats.total_seats)
        };
        table.add_row(vec!["Seats", &label]);
    }
    if !state.user_enrollments.is_empty() {
        table.add_row(vec![
            "Your enrollments",
            &format!("{} of 3", state.user_enrollments.len()),
        ]);
    }
    println!("{}", table);
    println!();
    println!("{}", output::control_label(&control));

    Ok(())
}
