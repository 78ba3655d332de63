//! Job board service

use std::sync::Arc;

use tracing::info;

use crate::domain::result::{Error, Result};
use crate::domain::{Job, JobApplication, JobDraft};
use crate::ports::{CourseGateway, IdentitySession};

pub struct JobService {
    gateway: Arc<dyn CourseGateway>,
}

impl JobService {
    pub fn new(gateway: Arc<dyn CourseGateway>) -> Self {
        Self { gateway }
    }

    /// All postings, newest first
    pub async fn list(&self) -> Result<Vec<Job>> {
        let mut jobs = self.gateway.list_jobs().await?;
        jobs.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        Ok(jobs)
    }

    pub async fn post(&self, session: &dyn IdentitySession, draft: &JobDraft) -> Result<Job> {
        session.current_user().ok_or(Error::Unauthenticated)?;
        draft.validate()?;
        let token = session.id_token().await?;
        let job = self.gateway.post_job(&token, draft).await?;
        info!(job_id = %job.id, "job posted");
        Ok(job)
    }

    /// Apply to a job as the signed-in user
    pub async fn apply(
        &self,
        session: &dyn IdentitySession,
        job_id: &str,
        resume_url: &str,
        cover_letter: &str,
    ) -> Result<()> {
        let user = session.current_user().ok_or(Error::Unauthenticated)?;
        let application = JobApplication {
            user_email: user.email.clone(),
            user_name: user.display_label().to_string(),
            resume_url: resume_url.trim().to_string(),
            cover_letter: cover_letter.to_string(),
        };
        application.validate()?;
        let token = session.id_token().await?;
        self.gateway.apply_job(&token, job_id, &application).await?;
        info!(job_id, "applied to job");
        Ok(())
    }
}
