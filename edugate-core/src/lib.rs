//! EduGate Core - client-side logic for the course marketplace
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Course, Enrollment, SeatInfo, etc.)
//! - **ports**: Trait definitions for external dependencies (CourseGateway, IdentitySession)
//! - **services**: Business logic orchestration (the enrollment controller lives here)
//! - **adapters**: Concrete implementations (reqwest gateway, in-memory gateway, sessions)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::http::HttpGateway;
use adapters::session::StaticSession;
use config::Config;
use ports::{CourseGateway, IdentitySession};
use services::*;

// Re-export commonly used types at crate root
pub use domain::{
    validate_password, Course, CourseDraft, CourseQuery, CourseSort, Enrollment, Identity, Job,
    SeatInfo, UserEnrollmentSet,
};
pub use domain::result::{Error, OperationResult};

/// Main context for EduGate operations
///
/// This is the primary entry point for all business logic. It holds
/// the configuration, the gateway, the identity session and all services.
pub struct EduGateContext {
    pub config: Config,
    pub gateway: Arc<dyn CourseGateway>,
    pub session: Arc<dyn IdentitySession>,
    pub enrollment: Arc<EnrollmentController>,
    pub catalog: CatalogService,
    pub admin: CourseAdminService,
    pub jobs: JobService,
}

impl EduGateContext {
    /// Create a context talking to the configured backend, with the
    /// identity taken from the environment
    pub fn new(edugate_dir: &Path) -> Result<Self> {
        let config = Config::load(edugate_dir)?;
        let gateway: Arc<dyn CourseGateway> = Arc::new(HttpGateway::new(&config)?);
        let session: Arc<dyn IdentitySession> = Arc::new(StaticSession::from_env());
        Ok(Self::with_parts(config, gateway, session))
    }

    /// Wire services around an existing gateway and session
    pub fn with_parts(
        config: Config,
        gateway: Arc<dyn CourseGateway>,
        session: Arc<dyn IdentitySession>,
    ) -> Self {
        let enrollment = Arc::new(EnrollmentController::new(
            Arc::clone(&gateway),
            config.reconcile_after_write,
        ));
        let catalog = CatalogService::new(Arc::clone(&gateway), Arc::clone(&enrollment));
        let admin = CourseAdminService::new(Arc::clone(&gateway));
        let jobs = JobService::new(Arc::clone(&gateway));

        Self {
            config,
            gateway,
            session,
            enrollment,
            catalog,
            admin,
            jobs,
        }
    }
}
