//! Job board domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// A job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    /// Full-time, part-time, contract, ...
    #[serde(default, rename = "type")]
    pub job_type: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Posting date in long form, e.g. "March 4, 2025"
    pub fn posted_label(&self) -> String {
        self.posted_at
            .map(|d| d.format("%B %-d, %Y").to_string())
            .unwrap_or_else(|| "Unknown date".to_string())
    }
}

/// Form for posting a new job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDraft {
    pub title: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    pub description: String,
}

impl JobDraft {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty()
            || self.company.trim().is_empty()
            || self.description.trim().is_empty()
        {
            return Err(Error::validation("Title, company and description are required."));
        }
        Ok(())
    }
}

/// Application submitted against a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub user_email: String,
    pub user_name: String,
    pub resume_url: String,
    #[serde(default)]
    pub cover_letter: String,
}

impl JobApplication {
    pub fn validate(&self) -> Result<()> {
        if self.resume_url.trim().is_empty() {
            return Err(Error::validation("A resume URL is required."));
        }
        Ok(())
    }
}
