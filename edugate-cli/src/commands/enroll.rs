//! Enroll and unenroll commands

use anyhow::Result;
use serde_json::json;

use edugate_core::services::CourseView;

use super::get_context;
use crate::output;

pub async fn run_enroll(id: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let session = ctx.session.as_ref();
    let view = ctx.enrollment.open(id, session).await;

    let pb = (!json).then(|| output::spinner("Enrolling..."));
    let result = ctx.enrollment.enroll(&view, session).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    result?;

    if json {
        print_view(&view)?;
    } else {
        output::success("Successfully enrolled!");
        if let Some(seats) = view.snapshot().seat_info {
            println!("{} seats left", seats.available_seats);
        }
    }
    Ok(())
}

pub async fn run_unenroll(id: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let session = ctx.session.as_ref();
    let view = ctx.enrollment.open(id, session).await;

    let pb = (!json).then(|| output::spinner("Unenrolling..."));
    let result = ctx.enrollment.unenroll(&view, session).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    result?;

    if json {
        print_view(&view)?;
    } else {
        output::success("Successfully unenrolled.");
    }
    Ok(())
}

fn print_view(view: &CourseView) -> Result<()> {
    let state = view.snapshot();
    let body = json!({
        "success": true,
        "courseId": state.course_id,
        "isEnrolled": state.is_enrolled,
        "seatInfo": state.seat_info,
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
