//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod course;
mod enrollment;
mod job;
mod user;
pub mod result;

pub use course::{
    Course, CourseDraft, CourseQuery, CourseSort, CourseSummary, COURSE_CATEGORIES,
    DEFAULT_COURSES_PER_PAGE, DEFAULT_COURSE_IMAGE,
};
pub use enrollment::{
    Enrollment, EnrollmentReceipt, SeatInfo, UserEnrollmentSet, MAX_CONCURRENT_ENROLLMENTS,
};
pub use job::{Job, JobApplication, JobDraft};
pub use user::{validate_password, Identity, MIN_PASSWORD_LEN};
