//! Enrollment and seat domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::course::CourseSummary;

/// Maximum number of courses a user may be enrolled in at the same time
pub const MAX_CONCURRENT_ENROLLMENTS: usize = 3;

/// A record linking one user to one course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub course_id: String,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub enrolled_at: Option<DateTime<Utc>>,
    /// Present on dashboard rows only
    #[serde(default)]
    pub course_details: Option<CourseSummary>,
}

impl Enrollment {
    pub fn new(course_id: impl Into<String>, user_email: impl Into<String>) -> Self {
        Self {
            course_id: course_id.into(),
            user_email: Some(user_email.into()),
            enrolled_at: Some(Utc::now()),
            course_details: None,
        }
    }

    pub fn title(&self) -> &str {
        self.course_details
            .as_ref()
            .and_then(|d| d.title.as_deref())
            .unwrap_or("Course Title Not Available")
    }

    pub fn description(&self) -> &str {
        self.course_details
            .as_ref()
            .and_then(|d| d.description.as_deref())
            .unwrap_or("No description available")
    }
}

/// Seat availability snapshot for one course
///
/// Local patches keep `available_seats` within `[0, total_seats]` and always
/// recompute `is_full`. The gateway's next answer replaces the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatInfo {
    pub total_seats: u32,
    pub available_seats: u32,
    pub is_full: bool,
}

impl SeatInfo {
    pub fn new(total_seats: u32, available_seats: u32) -> Self {
        let available_seats = available_seats.min(total_seats);
        Self {
            total_seats,
            available_seats,
            is_full: available_seats == 0,
        }
    }

    /// Optimistically take one seat
    pub fn reserve(&mut self) {
        self.available_seats = self.available_seats.saturating_sub(1);
        self.is_full = self.available_seats == 0;
    }

    /// Optimistically give one seat back
    pub fn release(&mut self) {
        self.available_seats = (self.available_seats + 1).min(self.total_seats);
        self.is_full = self.available_seats == 0;
    }

    /// Take an authoritative count returned by a mutation
    pub fn apply_available(&mut self, available: i64) {
        let clamped = available.clamp(0, i64::from(self.total_seats));
        self.available_seats = clamped as u32;
        self.is_full = self.available_seats == 0;
    }

    /// Seats currently taken
    pub fn taken(&self) -> u32 {
        self.total_seats - self.available_seats
    }
}

/// Response body of a successful create-enrollment call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentReceipt {
    /// Seats left after the write, when the server reports it
    #[serde(default)]
    pub available_seats: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// The caller's active enrollments, used for the concurrent-enrollment cap
///
/// Membership is by course id and is idempotent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserEnrollmentSet {
    entries: Vec<Enrollment>,
}

impl UserEnrollmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a gateway list, dropping duplicate course ids
    pub fn from_enrollments(enrollments: Vec<Enrollment>) -> Self {
        let mut set = Self::new();
        for enrollment in enrollments {
            set.insert(enrollment);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, course_id: &str) -> bool {
        self.entries.iter().any(|e| e.course_id == course_id)
    }

    pub fn is_at_limit(&self) -> bool {
        self.entries.len() >= MAX_CONCURRENT_ENROLLMENTS
    }

    /// Insert an enrollment; returns false if the course was already present
    pub fn insert(&mut self, enrollment: Enrollment) -> bool {
        if self.contains(&enrollment.course_id) {
            return false;
        }
        self.entries.push(enrollment);
        true
    }

    /// Remove the enrollment for `course_id`; returns false if absent
    pub fn remove(&mut self, course_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.course_id != course_id);
        self.entries.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Enrollment> {
        self.entries.iter()
    }

    pub fn course_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.course_id.as_str()).collect()
    }
}
