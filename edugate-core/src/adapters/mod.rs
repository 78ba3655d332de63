//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - reqwest HTTP client for the CourseGateway (the EduGate REST backend)
//! - In-memory CourseGateway for tests and offline demos
//! - Host-supplied IdentitySession
//! - Mock HTTP server speaking the backend's wire format, for adapter tests

pub mod http;
pub mod memory;
pub mod session;

#[cfg(test)]
pub mod gateway_mock;
