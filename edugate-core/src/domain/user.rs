//! Identity domain model

use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Shortest password accepted at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// The signed-in caller as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Name recorded as a course's owner or editor: display name, else email
    pub fn display_label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| Some(self.email.as_str()).filter(|e| !e.is_empty()))
            .unwrap_or("Unknown")
    }
}

/// Registration password policy
///
/// Rules are checked in order and the first one broken is reported.
pub fn validate_password(password: &str) -> Result<()> {
    if !password.chars().any(char::is_uppercase) {
        return Err(Error::Validation(
            "Password must contain at least one uppercase letter.".to_string(),
        ));
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(Error::Validation(
            "Password must contain at least one lowercase letter.".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "Password must be at least {} characters long.",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
