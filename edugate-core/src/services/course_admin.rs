//! Course management service - owner-side create, edit and delete

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{Course, CourseDraft, Identity};
use crate::ports::{CourseGateway, IdentitySession};

/// Course management for signed-in instructors
pub struct CourseAdminService {
    gateway: Arc<dyn CourseGateway>,
}

impl CourseAdminService {
    pub fn new(gateway: Arc<dyn CourseGateway>) -> Self {
        Self { gateway }
    }

    /// Courses the signed-in user added
    pub async fn my_courses(&self, session: &dyn IdentitySession) -> Result<Vec<Course>> {
        let (_, token) = signed_in(session).await?;
        self.gateway.my_courses(&token).await
    }

    pub async fn create(&self, session: &dyn IdentitySession, draft: &CourseDraft) -> Result<Course> {
        let user = session.current_user().ok_or(Error::Unauthenticated)?;
        draft.validate()?;
        let token = session.id_token().await?;

        let course = self
            .gateway
            .create_course(&token, draft, &user, Utc::now())
            .await
            .inspect_err(|e| warn!(error = %e, "course creation failed"))?;
        info!(course_id = %course.id, "course created");
        Ok(course)
    }

    /// Replace a course's editable fields
    ///
    /// When the course can be fetched and belongs to someone else the
    /// request is refused locally.
    pub async fn update(
        &self,
        session: &dyn IdentitySession,
        course_id: &str,
        draft: &CourseDraft,
    ) -> Result<()> {
        let user = session.current_user().ok_or(Error::Unauthenticated)?;
        draft.validate()?;
        self.ensure_owner(course_id, &user).await?;
        let token = session.id_token().await?;

        self.gateway
            .update_course(&token, course_id, draft, &user, Utc::now())
            .await
            .inspect_err(|e| warn!(course_id, error = %e, "course update failed"))?;
        info!(course_id, "course updated");
        Ok(())
    }

    pub async fn delete(&self, session: &dyn IdentitySession, course_id: &str) -> Result<()> {
        let user = session.current_user().ok_or(Error::Unauthenticated)?;
        self.ensure_owner(course_id, &user).await?;
        let token = session.id_token().await?;

        self.gateway
            .delete_course(&token, course_id)
            .await
            .inspect_err(|e| warn!(course_id, error = %e, "course deletion failed"))?;
        info!(course_id, "course deleted");
        Ok(())
    }

    async fn ensure_owner(&self, course_id: &str, user: &Identity) -> Result<()> {
        match self.gateway.get_course(course_id).await? {
            Some(course) if course.added_by_email.is_some() && !course.is_owned_by(&user.email) => {
                info!(course_id, "rejected: caller does not own the course");
                Err(Error::NotOwner)
            }
            Some(_) => Ok(()),
            None => Err(Error::not_found(format!("course {}", course_id))),
        }
    }
}

async fn signed_in(session: &dyn IdentitySession) -> Result<(Identity, String)> {
    let user = session.current_user().ok_or(Error::Unauthenticated)?;
    let token = session.id_token().await?;
    Ok((user, token))
}
