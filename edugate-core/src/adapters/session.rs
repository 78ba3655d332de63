//! In-process identity session
//!
//! Holds whatever identity the host established with the identity provider.
//! The CLI fills it from environment variables; tests fill it directly.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::result::{Error, Result};
use crate::domain::Identity;
use crate::ports::IdentitySession;

/// Environment variables read by `StaticSession::from_env`
pub const USER_EMAIL_ENV: &str = "EDUGATE_USER_EMAIL";
pub const USER_NAME_ENV: &str = "EDUGATE_USER_NAME";
pub const USER_UID_ENV: &str = "EDUGATE_USER_UID";
pub const ID_TOKEN_ENV: &str = "EDUGATE_ID_TOKEN";

#[derive(Debug, Clone)]
struct SignedIn {
    identity: Identity,
    token: String,
}

/// Session whose token is supplied by the host
#[derive(Debug, Default)]
pub struct StaticSession {
    inner: RwLock<Option<SignedIn>>,
}

impl StaticSession {
    /// A session with nobody signed in
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(identity: Identity, token: impl Into<String>) -> Self {
        let session = Self::default();
        session.sign_in(identity, token.into());
        session
    }

    /// Build from `EDUGATE_USER_EMAIL` / `EDUGATE_ID_TOKEN` (plus optional
    /// name and uid); signed out unless both email and token are set
    pub fn from_env() -> Self {
        let email = std::env::var(USER_EMAIL_ENV).ok().filter(|v| !v.trim().is_empty());
        let token = std::env::var(ID_TOKEN_ENV).ok().filter(|v| !v.trim().is_empty());
        match (email, token) {
            (Some(email), Some(token)) => {
                let uid = std::env::var(USER_UID_ENV).unwrap_or_else(|_| email.clone());
                let mut identity = Identity::new(uid, email);
                if let Ok(name) = std::env::var(USER_NAME_ENV) {
                    identity = identity.with_display_name(name);
                }
                Self::signed_in(identity, token)
            }
            _ => Self::signed_out(),
        }
    }

    fn read(&self) -> Option<SignedIn> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl IdentitySession for StaticSession {
    fn current_user(&self) -> Option<Identity> {
        self.read().map(|s| s.identity)
    }

    async fn id_token(&self) -> Result<String> {
        self.read().map(|s| s.token).ok_or(Error::Unauthenticated)
    }

    fn sign_in(&self, identity: Identity, token: String) {
        tracing::info!(uid = %identity.uid, "signed in");
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = Some(SignedIn { identity, token });
    }

    fn sign_out(&self) {
        tracing::info!("signed out");
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
