//! Step-up credential verification.
//!
//! Signing a payroll period re-verifies the user's password even inside an
//! authenticated session. The checker only answers yes/no; callers decide
//! how to surface a mismatch.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use recibos_core::AppError;

/// Source of stored password hashes (the portal user store).
#[async_trait]
pub trait PasswordHashSource: Send + Sync {
    async fn password_hash(&self, user_id: Uuid) -> Result<Option<String>, AppError>;
}

#[async_trait]
pub trait CredentialChecker: Send + Sync {
    /// `Ok(false)` covers both a wrong password and an unknown user; the
    /// distinction must not be observable.
    async fn verify(&self, user_id: Uuid, password: &str) -> Result<bool, AppError>;
}

/// Bcrypt verification against the stored hash.
pub struct BcryptCredentialChecker {
    source: Arc<dyn PasswordHashSource>,
}

impl BcryptCredentialChecker {
    pub fn new(source: Arc<dyn PasswordHashSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl CredentialChecker for BcryptCredentialChecker {
    async fn verify(&self, user_id: Uuid, password: &str) -> Result<bool, AppError> {
        let Some(hash) = self.source.password_hash(user_id).await? else {
            return Ok(false);
        };
        bcrypt::verify(password, &hash)
            .map_err(|e| AppError::Internal(format!("bcrypt verification error: {}", e)))
    }
}
