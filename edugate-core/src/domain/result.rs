//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core library error type
///
/// The first group of variants are local precondition failures: they are
/// decided from cached state and never issue a network call.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Please sign in to continue")]
    Unauthenticated,

    #[error("No seats available for this course")]
    SeatsExhausted,

    #[error("You cannot enroll in more than 3 courses at the same time")]
    EnrollmentLimitReached,

    #[error("You are already enrolled in this course")]
    AlreadyEnrolled,

    #[error("Another enrollment change for this course is still in progress")]
    MutationInFlight,

    #[error("Only the course owner can change this course")]
    NotOwner,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Any failed gateway call. `message` is the server's own message when
    /// the response carried one.
    #[error("{message}")]
    Gateway {
        status: Option<u16>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a gateway error with an optional HTTP status
    pub fn gateway(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Gateway {
            status,
            message: msg.into(),
        }
    }

    /// True for failures decided entirely client-side
    pub fn is_local_precondition(&self) -> bool {
        matches!(
            self,
            Error::Unauthenticated
                | Error::SeatsExhausted
                | Error::EnrollmentLimitReached
                | Error::AlreadyEnrolled
                | Error::MutationInFlight
                | Error::NotOwner
                | Error::Validation(_)
        )
    }

    /// True when the host should send the user to sign in
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, Error::Unauthenticated)
            || matches!(self, Error::Gateway { status: Some(401), .. })
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (JSON envelope for `--json` output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: None,
        }
    }

    /// Attach a context entry
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_result_ok() {
        let result: OperationResult<i32> = OperationResult::ok(42);
        assert!(result.success);
        assert_eq!(result.data, Some(42));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_operation_result_fail_with_context() {
        let result: OperationResult<i32> = OperationResult::fail("Something went wrong")
            .with_context("courseId", serde_json::json!("c1"));
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.error, Some("Something went wrong".to_string()));
        assert_eq!(result.context.unwrap()["courseId"], "c1");
    }

    #[test]
    fn test_from_result() {
        let ok: Result<i32> = Ok(42);
        let result: OperationResult<i32> = ok.into();
        assert!(result.success);

        let err: Result<i32> = Err(Error::validation("bad input"));
        let result: OperationResult<i32> = err.into();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Validation error"));
    }

    #[test]
    fn test_gateway_error_displays_server_message_verbatim() {
        let err = Error::gateway(Some(409), "Course is full");
        assert_eq!(err.to_string(), "Course is full");
        assert!(!err.is_local_precondition());
    }

    #[test]
    fn test_precondition_classification() {
        assert!(Error::SeatsExhausted.is_local_precondition());
        assert!(Error::EnrollmentLimitReached.is_local_precondition());
        assert!(!Error::not_found("course c1").is_local_precondition());
    }

    #[test]
    fn test_requires_sign_in() {
        assert!(Error::Unauthenticated.requires_sign_in());
        assert!(Error::gateway(Some(401), "expired").requires_sign_in());
        assert!(!Error::gateway(Some(500), "boom").requires_sign_in());
        assert!(!Error::SeatsExhausted.requires_sign_in());
    }
}
