//! Course gateway port
//!
//! The remote REST service that owns courses, enrollments, seat bookkeeping
//! and jobs. Every user-scoped or mutating call takes the caller's bearer
//! token, obtained fresh from the identity session right before the call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::result::Result;
use crate::domain::{
    Course, CourseDraft, CourseSort, Enrollment, EnrollmentReceipt, Identity, Job,
    JobApplication, JobDraft, SeatInfo,
};

/// Course/enrollment gateway abstraction
///
/// Implementations report failures as `Error::Gateway` carrying the server's
/// message when there is one.
#[async_trait]
pub trait CourseGateway: Send + Sync {
    // === Courses ===

    /// One page of the course listing
    async fn list_courses(&self, sort: CourseSort, limit: u32, page: u32) -> Result<Vec<Course>>;

    /// Course detail; `None` when the id does not resolve
    async fn get_course(&self, course_id: &str) -> Result<Option<Course>>;

    /// Courses owned by the token's user
    async fn my_courses(&self, token: &str) -> Result<Vec<Course>>;

    /// Create a course owned by `owner`
    async fn create_course(
        &self,
        token: &str,
        draft: &CourseDraft,
        owner: &Identity,
        added_at: DateTime<Utc>,
    ) -> Result<Course>;

    /// Replace a course's editable fields
    async fn update_course(
        &self,
        token: &str,
        course_id: &str,
        draft: &CourseDraft,
        editor: &Identity,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn delete_course(&self, token: &str, course_id: &str) -> Result<()>;

    // === Enrollments ===

    async fn seat_info(&self, course_id: &str) -> Result<SeatInfo>;

    async fn check_enrollment(&self, token: &str, user_email: &str, course_id: &str)
        -> Result<bool>;

    /// Active enrollments of `user_email`
    async fn user_enrollments(&self, token: &str, user_email: &str) -> Result<Vec<Enrollment>>;

    /// Dashboard rows for the token's user, with embedded course details
    async fn my_enrollments(&self, token: &str) -> Result<Vec<Enrollment>>;

    async fn create_enrollment(
        &self,
        token: &str,
        course_id: &str,
        enrolled_at: DateTime<Utc>,
    ) -> Result<EnrollmentReceipt>;

    async fn delete_enrollment(&self, token: &str, course_id: &str, user_email: &str)
        -> Result<()>;

    // === Jobs ===

    async fn list_jobs(&self) -> Result<Vec<Job>>;

    async fn post_job(&self, token: &str, draft: &JobDraft) -> Result<Job>;

    async fn apply_job(
        &self,
        token: &str,
        job_id: &str,
        application: &JobApplication,
    ) -> Result<()>;
}
