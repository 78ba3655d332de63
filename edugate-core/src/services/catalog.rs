//! Catalog service - course list, course detail and the enrollment dashboard

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::domain::{Course, CourseQuery, Enrollment};
use crate::ports::{CourseGateway, IdentitySession};
use crate::services::enrollment::{CourseView, EnrollmentController};

/// One page of the course list after local filtering
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePage {
    pub courses: Vec<Course>,
    pub page: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Read-side course browsing
pub struct CatalogService {
    gateway: Arc<dyn CourseGateway>,
    enrollment: Arc<EnrollmentController>,
}

impl CatalogService {
    pub fn new(gateway: Arc<dyn CourseGateway>, enrollment: Arc<EnrollmentController>) -> Self {
        Self {
            gateway,
            enrollment,
        }
    }

    /// Fetch one sorted page and apply the search and category filters
    pub async fn browse(&self, query: &CourseQuery) -> Result<CoursePage> {
        query.validate()?;
        let fetched = self
            .gateway
            .list_courses(query.sort, query.per_page, query.page)
            .await?;
        let has_next = fetched.len() as u32 >= query.per_page;
        let courses: Vec<Course> = fetched.into_iter().filter(|c| query.accepts(c)).collect();
        debug!(page = query.page, sort = %query.sort, shown = courses.len(), "browsed courses");

        Ok(CoursePage {
            courses,
            page: query.page,
            has_previous: query.page > 1,
            has_next,
        })
    }

    pub async fn course_detail(&self, course_id: &str) -> Result<Course> {
        self.gateway
            .get_course(course_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("course {}", course_id)))
    }

    /// The signed-in user's enrollments with embedded course details
    pub async fn my_enrollments(&self, session: &dyn IdentitySession) -> Result<Vec<Enrollment>> {
        session.current_user().ok_or(Error::Unauthenticated)?;
        let token = session.id_token().await?;
        self.gateway.my_enrollments(&token).await
    }

    /// Enroll straight from the course list
    ///
    /// Goes through a freshly loaded view so the same seat, cap and
    /// membership rules apply as on the detail page.
    pub async fn enroll_from_listing(
        &self,
        course_id: &str,
        session: &dyn IdentitySession,
    ) -> Result<CourseView> {
        session.current_user().ok_or(Error::Unauthenticated)?;
        let view = self.enrollment.open(course_id, session).await;
        self.enrollment.enroll(&view, session).await?;
        Ok(view)
    }
}
