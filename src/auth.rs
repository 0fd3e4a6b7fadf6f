use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::{AuthSession, SignUpOutcome};

/// The hosted backend's authentication primitives. Session storage and
/// token refresh live behind this seam.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, RemoteError>;
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<SignUpOutcome, RemoteError>;
    async fn sign_out(&self) -> Result<(), RemoteError>;
    /// The stored session, refreshed first if it is about to expire.
    async fn current_session(&self) -> Result<Option<AuthSession>, RemoteError>;
    async fn refresh_session(&self) -> Result<Option<AuthSession>, RemoteError>;
}
