//! In-memory course gateway
//!
//! Behaves like the backend (uniqueness, seat bookkeeping, the enrollment
//! cap, ownership) without any network. Every call is counted so tests can
//! prove that a local rejection issued no request, and failures can be
//! scripted per operation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Course, CourseDraft, CourseSort, CourseSummary, Enrollment, EnrollmentReceipt, Identity, Job,
    JobApplication, JobDraft, SeatInfo, MAX_CONCURRENT_ENROLLMENTS,
};
use crate::ports::CourseGateway;

/// Operation names used for call counting and failure scripting
pub mod ops {
    pub const LIST_COURSES: &str = "list_courses";
    pub const GET_COURSE: &str = "get_course";
    pub const MY_COURSES: &str = "my_courses";
    pub const CREATE_COURSE: &str = "create_course";
    pub const UPDATE_COURSE: &str = "update_course";
    pub const DELETE_COURSE: &str = "delete_course";
    pub const SEAT_INFO: &str = "seat_info";
    pub const CHECK_ENROLLMENT: &str = "check_enrollment";
    pub const USER_ENROLLMENTS: &str = "user_enrollments";
    pub const MY_ENROLLMENTS: &str = "my_enrollments";
    pub const CREATE_ENROLLMENT: &str = "create_enrollment";
    pub const DELETE_ENROLLMENT: &str = "delete_enrollment";
    pub const LIST_JOBS: &str = "list_jobs";
    pub const POST_JOB: &str = "post_job";
    pub const APPLY_JOB: &str = "apply_job";
}

#[derive(Debug, Default)]
struct State {
    courses: Vec<Course>,
    total_seats: HashMap<String, u32>,
    enrollments: Vec<Enrollment>,
    jobs: Vec<Job>,
    applications: Vec<(String, JobApplication)>,
    users: HashMap<String, Identity>,
    calls: HashMap<&'static str, usize>,
    failures: HashMap<&'static str, (u16, String)>,
    delays: HashMap<&'static str, Duration>,
}

impl State {
    fn available(&self, course_id: &str) -> Option<u32> {
        let total = *self.total_seats.get(course_id)?;
        let taken = self
            .enrollments
            .iter()
            .filter(|e| e.course_id == course_id)
            .count() as u32;
        Some(total.saturating_sub(taken))
    }

    fn user(&self, token: &str) -> Result<Identity> {
        self.users
            .get(token)
            .cloned()
            .ok_or_else(|| Error::gateway(Some(401), "Unauthorized access"))
    }
}

/// Gateway that keeps everything in process memory
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    state: Mutex<State>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a signed-in user reachable through `token`
    pub fn add_user(&self, token: impl Into<String>, identity: Identity) {
        self.lock().users.insert(token.into(), identity);
    }

    /// Add a course with `total_seats` capacity
    pub fn add_course(&self, course: Course, total_seats: u32) {
        let mut state = self.lock();
        state.total_seats.insert(course.id.clone(), total_seats);
        state.courses.push(course);
    }

    /// Record an existing enrollment directly, bypassing checks
    pub fn seed_enrollment(&self, user_email: &str, course_id: &str) {
        self.lock()
            .enrollments
            .push(Enrollment::new(course_id, user_email));
    }

    pub fn add_job(&self, job: Job) {
        self.lock().jobs.push(job);
    }

    /// Make every call of `op` fail with the given status and message
    pub fn fail(&self, op: &'static str, status: u16, message: impl Into<String>) {
        self.lock().failures.insert(op, (status, message.into()));
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Hold calls of `op` for `delay` before answering (enrollment
    /// create/delete only)
    pub fn delay(&self, op: &'static str, delay: Duration) {
        self.lock().delays.insert(op, delay);
    }

    /// Number of calls made to `op`
    pub fn calls(&self, op: &str) -> usize {
        self.lock().calls.get(op).copied().unwrap_or(0)
    }

    /// Number of calls across all operations
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Authoritative seat count
    pub fn available_seats(&self, course_id: &str) -> Option<u32> {
        self.lock().available(course_id)
    }

    pub fn applications(&self) -> Vec<(String, JobApplication)> {
        self.lock().applications.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panic while holding the lock only happens inside a failing test
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn pause(&self, op: &'static str) {
        let delay = self.lock().delays.get(op).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Count the call and apply any scripted failure
    fn enter(&self, op: &'static str) -> Result<std::sync::MutexGuard<'_, State>> {
        let mut state = self.lock();
        *state.calls.entry(op).or_insert(0) += 1;
        if let Some((status, message)) = state.failures.get(op) {
            return Err(Error::gateway(Some(*status), message.clone()));
        }
        Ok(state)
    }
}

#[async_trait]
impl CourseGateway for InMemoryGateway {
    async fn list_courses(&self, sort: CourseSort, limit: u32, page: u32) -> Result<Vec<Course>> {
        let state = self.enter(ops::LIST_COURSES)?;
        let mut courses = state.courses.clone();
        match sort {
            CourseSort::Newest => courses.sort_by(|a, b| b.added_at.cmp(&a.added_at)),
            CourseSort::MostPopular => courses.sort_by(|a, b| b.enrollments.cmp(&a.enrollments)),
            CourseSort::HighestRated => courses.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        }
        let skip = (page.saturating_sub(1) as usize) * limit as usize;
        Ok(courses.into_iter().skip(skip).take(limit as usize).collect())
    }

    async fn get_course(&self, course_id: &str) -> Result<Option<Course>> {
        let state = self.enter(ops::GET_COURSE)?;
        Ok(state.courses.iter().find(|c| c.id == course_id).cloned())
    }

    async fn my_courses(&self, token: &str) -> Result<Vec<Course>> {
        let state = self.enter(ops::MY_COURSES)?;
        let user = state.user(token)?;
        Ok(state
            .courses
            .iter()
            .filter(|c| c.is_owned_by(&user.email))
            .cloned()
            .collect())
    }

    async fn create_course(
        &self,
        token: &str,
        draft: &CourseDraft,
        owner: &Identity,
        added_at: DateTime<Utc>,
    ) -> Result<Course> {
        let mut state = self.enter(ops::CREATE_COURSE)?;
        state.user(token)?;
        let mut course = Course::new(Uuid::new_v4().to_string(), draft.title.clone());
        course.description = draft.description.clone();
        course.image_url = Some(draft.image_url.clone());
        course.duration = Some(draft.duration.clone());
        course.added_by_email = Some(owner.email.clone());
        course.added_by_name = Some(owner.display_label().to_string());
        course.added_at = Some(added_at);
        state.total_seats.insert(course.id.clone(), 30);
        state.courses.push(course.clone());
        Ok(course)
    }

    async fn update_course(
        &self,
        token: &str,
        course_id: &str,
        draft: &CourseDraft,
        _editor: &Identity,
        _updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.enter(ops::UPDATE_COURSE)?;
        let user = state.user(token)?;
        let course = state
            .courses
            .iter_mut()
            .find(|c| c.id == course_id)
            .ok_or_else(|| Error::gateway(Some(404), "Course not found"))?;
        if !course.is_owned_by(&user.email) {
            return Err(Error::gateway(Some(403), "Forbidden"));
        }
        course.title = draft.title.clone();
        course.description = draft.description.clone();
        course.image_url = Some(draft.image_url.clone());
        course.duration = Some(draft.duration.clone());
        Ok(())
    }

    async fn delete_course(&self, token: &str, course_id: &str) -> Result<()> {
        let mut state = self.enter(ops::DELETE_COURSE)?;
        let user = state.user(token)?;
        let position = state
            .courses
            .iter()
            .position(|c| c.id == course_id)
            .ok_or_else(|| Error::gateway(Some(404), "Course not found"))?;
        if !state.courses[position].is_owned_by(&user.email) {
            return Err(Error::gateway(Some(403), "Forbidden"));
        }
        state.courses.remove(position);
        state.total_seats.remove(course_id);
        state.enrollments.retain(|e| e.course_id != course_id);
        Ok(())
    }

    async fn seat_info(&self, course_id: &str) -> Result<SeatInfo> {
        let state = self.enter(ops::SEAT_INFO)?;
        let total = *state
            .total_seats
            .get(course_id)
            .ok_or_else(|| Error::gateway(Some(404), "Course not found"))?;
        let available = state.available(course_id).unwrap_or(0);
        Ok(SeatInfo::new(total, available))
    }

    async fn check_enrollment(
        &self,
        token: &str,
        user_email: &str,
        course_id: &str,
    ) -> Result<bool> {
        let state = self.enter(ops::CHECK_ENROLLMENT)?;
        state.user(token)?;
        Ok(state
            .enrollments
            .iter()
            .any(|e| e.course_id == course_id && e.user_email.as_deref() == Some(user_email)))
    }

    async fn user_enrollments(&self, token: &str, user_email: &str) -> Result<Vec<Enrollment>> {
        let state = self.enter(ops::USER_ENROLLMENTS)?;
        state.user(token)?;
        Ok(state
            .enrollments
            .iter()
            .filter(|e| e.user_email.as_deref() == Some(user_email))
            .cloned()
            .collect())
    }

    async fn my_enrollments(&self, token: &str) -> Result<Vec<Enrollment>> {
        let state = self.enter(ops::MY_ENROLLMENTS)?;
        let user = state.user(token)?;
        Ok(state
            .enrollments
            .iter()
            .filter(|e| e.user_email.as_deref() == Some(user.email.as_str()))
            .map(|e| {
                let mut row = e.clone();
                row.course_details = state.courses.iter().find(|c| c.id == e.course_id).map(|c| {
                    CourseSummary {
                        title: Some(c.title.clone()),
                        description: Some(c.description.clone()),
                    }
                });
                row
            })
            .collect())
    }

    async fn create_enrollment(
        &self,
        token: &str,
        course_id: &str,
        enrolled_at: DateTime<Utc>,
    ) -> Result<EnrollmentReceipt> {
        self.pause(ops::CREATE_ENROLLMENT).await;
        let mut state = self.enter(ops::CREATE_ENROLLMENT)?;
        let user = state.user(token)?;
        let available = state
            .available(course_id)
            .ok_or_else(|| Error::gateway(Some(404), "Course not found"))?;

        let mine: Vec<&Enrollment> = state
            .enrollments
            .iter()
            .filter(|e| e.user_email.as_deref() == Some(user.email.as_str()))
            .collect();
        if mine.iter().any(|e| e.course_id == course_id) {
            return Err(Error::gateway(Some(400), "Already enrolled in this course"));
        }
        if mine.len() >= MAX_CONCURRENT_ENROLLMENTS {
            return Err(Error::gateway(
                Some(400),
                "You cannot enroll in more than 3 courses at the same time",
            ));
        }
        if available == 0 {
            return Err(Error::gateway(Some(400), "No seats available for this course"));
        }

        state.enrollments.push(Enrollment {
            course_id: course_id.to_string(),
            user_email: Some(user.email.clone()),
            enrolled_at: Some(enrolled_at),
            course_details: None,
        });
        if let Some(course) = state.courses.iter_mut().find(|c| c.id == course_id) {
            course.enrollments += 1;
        }
        Ok(EnrollmentReceipt {
            available_seats: Some(i64::from(available - 1)),
            message: Some("Successfully enrolled".to_string()),
        })
    }

    async fn delete_enrollment(&self, token: &str, course_id: &str, user_email: &str) -> Result<()> {
        self.pause(ops::DELETE_ENROLLMENT).await;
        let mut state = self.enter(ops::DELETE_ENROLLMENT)?;
        let user = state.user(token)?;
        if user.email != user_email {
            return Err(Error::gateway(Some(403), "Forbidden"));
        }
        let before = state.enrollments.len();
        state
            .enrollments
            .retain(|e| !(e.course_id == course_id && e.user_email.as_deref() == Some(user_email)));
        if state.enrollments.len() == before {
            return Err(Error::gateway(Some(404), "Enrollment not found"));
        }
        if let Some(course) = state.courses.iter_mut().find(|c| c.id == course_id) {
            course.enrollments = course.enrollments.saturating_sub(1);
        }
        Ok(())
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        let state = self.enter(ops::LIST_JOBS)?;
        Ok(state.jobs.clone())
    }

    async fn post_job(&self, token: &str, draft: &JobDraft) -> Result<Job> {
        let mut state = self.enter(ops::POST_JOB)?;
        state.user(token)?;
        let job = Job {
            id: Uuid::new_v4().to_string(),
            title: draft.title.clone(),
            company: draft.company.clone(),
            location: draft.location.clone(),
            salary: draft.salary.clone(),
            job_type: draft.job_type.clone(),
            description: draft.description.clone(),
            posted_at: Some(Utc::now()),
        };
        state.jobs.push(job.clone());
        Ok(job)
    }

    async fn apply_job(
        &self,
        token: &str,
        job_id: &str,
        application: &JobApplication,
    ) -> Result<()> {
        let mut state = self.enter(ops::APPLY_JOB)?;
        state.user(token)?;
        if !state.jobs.iter().any(|j| j.id == job_id) {
            return Err(Error::gateway(Some(404), "Job not found"));
        }
        state
            .applications
            .push((job_id.to_string(), application.clone()));
        Ok(())
    }
}
