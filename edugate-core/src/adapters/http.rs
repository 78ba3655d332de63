//! EduGate REST gateway client
//!
//! Talks to the course marketplace backend over HTTP. Every user-scoped or
//! mutating request carries `Authorization: Bearer <token>`; the token is
//! handed in by the caller for each call and never stored here.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::{
    Course, CourseDraft, CourseSort, Enrollment, EnrollmentReceipt, Identity, Job,
    JobApplication, JobDraft, SeatInfo,
};
use crate::ports::CourseGateway;

// =============================================================================
// Wire models that only exist at the HTTP boundary
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnrollmentCheck {
    is_enrolled: bool,
}

/// Error body shapes the backend is known to send
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertedId {
    inserted_id: String,
}

// =============================================================================
// HTTP gateway
// =============================================================================

/// reqwest-backed implementation of `CourseGateway`
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpGateway {
    /// Build a gateway from the loaded configuration
    pub fn new(config: &Config) -> Result<Self> {
        Self::new_with_base_url(&config.api_base_url, config.request_timeout())
    }

    /// Build a gateway against an explicit base URL
    pub fn new_with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(trimmed)
            .map_err(|e| Error::Config(format!("invalid API base URL '{}': {}", base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "API base URL must be http or https, got '{}'",
                base_url.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("edugate-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Join path segments onto the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("API base URL '{}' cannot hold paths", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and turn transport failures and non-2xx statuses into
    /// `Error::Gateway`
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let request = request
            .build()
            .map_err(|e| Error::gateway(None, format!("Failed to build request: {}", e)))?;
        let method = request.method().clone();
        let path = request.url().path().to_string();
        debug!(%method, %path, "gateway request");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        debug!(%method, %path, status = status.as_u16(), "gateway response");
        if status.is_success() {
            return Ok(response);
        }

        let err = Self::error_from_response(status, response).await;
        warn!(%method, %path, what, status = status.as_u16(), error = %err, "gateway call failed");
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = self.send(request, what).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::gateway(None, format!("Failed to parse {} response: {}", what, e)))
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        let message = if error.is_timeout() {
            format!("Connection timed out after {} seconds", self.timeout.as_secs())
        } else if error.is_connect() {
            format!("Unable to connect to the course service at {}", self.base_url())
        } else {
            format!("Request failed: {}", error)
        };
        warn!(error = %error, "gateway transport error");
        Error::gateway(None, message)
    }

    /// Prefer the server's own message; fall back to a generic one
    async fn error_from_response(status: StatusCode, response: Response) -> Error {
        let body = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        let message = parsed
            .error
            .or(parsed.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| match status {
                StatusCode::UNAUTHORIZED => "Authentication failed. Please sign in again.".to_string(),
                StatusCode::FORBIDDEN => "You are not allowed to do that.".to_string(),
                _ => format!("Request failed with HTTP {}", status.as_u16()),
            });
        Error::gateway(Some(status.as_u16()), message)
    }
}

#[async_trait]
impl CourseGateway for HttpGateway {
    async fn list_courses(&self, sort: CourseSort, limit: u32, page: u32) -> Result<Vec<Course>> {
        let url = self.endpoint(&["courses"])?;
        let request = self.client.get(url).query(&[
            ("sort", sort.as_str().to_string()),
            ("limit", limit.to_string()),
            ("page", page.to_string()),
        ]);
        self.send_json(request, "load courses").await
    }

    async fn get_course(&self, course_id: &str) -> Result<Option<Course>> {
        let url = self.endpoint(&["courses", course_id])?;
        match self.send_json(self.client.get(url), "load course details").await {
            Ok(course) => Ok(Some(course)),
            Err(Error::Gateway {
                status: Some(404), ..
            }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn my_courses(&self, token: &str) -> Result<Vec<Course>> {
        let url = self.endpoint(&["courses", "my-courses"])?;
        self.send_json(self.client.get(url).bearer_auth(token), "load your courses")
            .await
    }

    async fn create_course(
        &self,
        token: &str,
        draft: &CourseDraft,
        owner: &Identity,
        added_at: DateTime<Utc>,
    ) -> Result<Course> {
        let url = self.endpoint(&["courses"])?;
        let body = json!({
            "title": draft.title,
            "description": draft.description,
            "imageUrl": draft.image_url,
            "duration": draft.duration,
            "addedByEmail": owner.email,
            "addedByName": owner.display_label(),
            "addedAt": added_at,
        });
        let created: JsonValue = self
            .send_json(self.client.post(url).bearer_auth(token).json(&body), "add course")
            .await?;

        // Either the stored document or an insert acknowledgement
        if let Ok(course) = serde_json::from_value::<Course>(created.clone()) {
            return Ok(course);
        }
        let ack: InsertedId = serde_json::from_value(created)?;
        let mut course = Course::new(ack.inserted_id, draft.title.clone());
        course.description = draft.description.clone();
        course.image_url = Some(draft.image_url.clone());
        course.duration = Some(draft.duration.clone());
        course.added_by_email = Some(owner.email.clone());
        course.added_by_name = Some(owner.display_label().to_string());
        course.added_at = Some(added_at);
        Ok(course)
    }

    async fn update_course(
        &self,
        token: &str,
        course_id: &str,
        draft: &CourseDraft,
        editor: &Identity,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let url = self.endpoint(&["courses", course_id])?;
        let body = json!({
            "title": draft.title,
            "description": draft.description,
            "imageUrl": draft.image_url,
            "duration": draft.duration,
            "updatedByEmail": editor.email,
            "updatedByName": editor.display_label(),
            "updatedAt": updated_at,
        });
        self.send(self.client.put(url).bearer_auth(token).json(&body), "update course")
            .await?;
        Ok(())
    }

    async fn delete_course(&self, token: &str, course_id: &str) -> Result<()> {
        let url = self.endpoint(&["courses", course_id])?;
        self.send(self.client.delete(url).bearer_auth(token), "delete course")
            .await?;
        Ok(())
    }

    async fn seat_info(&self, course_id: &str) -> Result<SeatInfo> {
        let url = self.endpoint(&["enrollments", "seats", course_id])?;
        let seats: SeatInfo = self
            .send_json(self.client.get(url), "load seat information")
            .await?;
        // Normalise: never trust an inconsistent isFull flag
        Ok(SeatInfo::new(seats.total_seats, seats.available_seats))
    }

    async fn check_enrollment(
        &self,
        token: &str,
        user_email: &str,
        course_id: &str,
    ) -> Result<bool> {
        let url = self.endpoint(&["enrollments", "check"])?;
        let request = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("userEmail", user_email), ("courseId", course_id)]);
        let check: EnrollmentCheck = self.send_json(request, "check enrollment").await?;
        Ok(check.is_enrolled)
    }

    async fn user_enrollments(&self, token: &str, user_email: &str) -> Result<Vec<Enrollment>> {
        let url = self.endpoint(&["enrollments", "user", user_email])?;
        self.send_json(self.client.get(url).bearer_auth(token), "load your enrollments")
            .await
    }

    async fn my_enrollments(&self, token: &str) -> Result<Vec<Enrollment>> {
        let url = self.endpoint(&["enrollments", "my-courses"])?;
        self.send_json(self.client.get(url).bearer_auth(token), "load enrolled courses")
            .await
    }

    async fn create_enrollment(
        &self,
        token: &str,
        course_id: &str,
        enrolled_at: DateTime<Utc>,
    ) -> Result<EnrollmentReceipt> {
        let url = self.endpoint(&["enrollments"])?;
        let body = json!({ "courseId": course_id, "enrolledAt": enrolled_at });
        let response = self
            .send(self.client.post(url).bearer_auth(token).json(&body), "enroll in the course")
            .await?;
        // Some deployments answer with an empty body
        let text = response
            .text()
            .await
            .map_err(|e| Error::gateway(None, format!("Failed to read enrollment response: {}", e)))?;
        if text.trim().is_empty() {
            return Ok(EnrollmentReceipt::default());
        }
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    async fn delete_enrollment(&self, token: &str, course_id: &str, user_email: &str) -> Result<()> {
        let url = self.endpoint(&["enrollments"])?;
        let body = json!({ "courseId": course_id, "userEmail": user_email });
        self.send(
            self.client.delete(url).bearer_auth(token).json(&body),
            "unenroll from the course",
        )
        .await?;
        Ok(())
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        let url = self.endpoint(&["jobs"])?;
        self.send_json(self.client.get(url), "load jobs").await
    }

    async fn post_job(&self, token: &str, draft: &JobDraft) -> Result<Job> {
        let url = self.endpoint(&["jobs"])?;
        let mut body = serde_json::to_value(draft)?;
        body["postedAt"] = json!(Utc::now());
        let created: JsonValue = self
            .send_json(self.client.post(url).bearer_auth(token).json(&body), "post job")
            .await?;
        if let Ok(job) = serde_json::from_value::<Job>(created.clone()) {
            return Ok(job);
        }
        let ack: InsertedId = serde_json::from_value(created)?;
        Ok(Job {
            id: ack.inserted_id,
            title: draft.title.clone(),
            company: draft.company.clone(),
            location: draft.location.clone(),
            salary: draft.salary.clone(),
            job_type: draft.job_type.clone(),
            description: draft.description.clone(),
            posted_at: Some(Utc::now()),
        })
    }

    async fn apply_job(
        &self,
        token: &str,
        job_id: &str,
        application: &JobApplication,
    ) -> Result<()> {
        let url = self.endpoint(&["jobs", job_id, "apply"])?;
        self.send(
            self.client.post(url).bearer_auth(token).json(application),
            "submit application",
        )
        .await?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
