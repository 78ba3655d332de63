//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod catalog;
pub mod course_admin;
pub mod enrollment;
pub mod jobs;
pub mod logging;

pub use catalog::{CatalogService, CoursePage};
pub use course_admin::CourseAdminService;
pub use enrollment::{
    ContextPart, ControlState, CourseView, DisabledReason, EnrollmentController, LoadFailure,
    ViewPhase, ViewState,
};
pub use jobs::JobService;
pub use logging::{init_tracing, LogFormat};
