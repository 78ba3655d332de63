//! CLI command implementations

pub mod config;
pub mod course;
pub mod courses;
pub mod enroll;
pub mod enrollments;
pub mod jobs;
pub mod manage;

use std::path::PathBuf;

use anyhow::{Context, Result};
use edugate_core::EduGateContext;

/// Get the EduGate directory from environment or default
pub fn get_edugate_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("EDUGATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".edugate"))
        .context("Could not find home directory; set EDUGATE_DIR")
}

/// Get or create the EduGate context
pub fn get_context() -> Result<EduGateContext> {
    let edugate_dir = get_edugate_dir()?;

    // Create directory if it doesn't exist
    std::fs::create_dir_all(&edugate_dir)
        .with_context(|| format!("Failed to create EduGate directory: {:?}", edugate_dir))?;

    let ctx = EduGateContext::new(&edugate_dir).context("Failed to initialize EduGate context")?;
    tracing::debug!(api = %ctx.config.api_base_url, "context ready");
    Ok(ctx)
}
