//! Identity session port
//!
//! The external identity provider: who is signed in, and a short-lived
//! bearer token for that user. The core never caches tokens; it asks for one
//! immediately before every authorized call.

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::Identity;

#[async_trait]
pub trait IdentitySession: Send + Sync {
    /// The signed-in user, if any
    fn current_user(&self) -> Option<Identity>;

    /// A fresh bearer token for the signed-in user
    ///
    /// Fails with `Error::Unauthenticated` when nobody is signed in.
    async fn id_token(&self) -> Result<String>;

    /// Record a completed provider sign-in
    fn sign_in(&self, identity: Identity, token: String);

    fn sign_out(&self);
}
