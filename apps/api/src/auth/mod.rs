//! Remote authentication. The hosted auth service owns identities and issues
//! bearer sessions; this module only speaks to it.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

mod gotrue;
#[cfg(test)]
pub mod memory;

pub use gotrue::GoTrueAuth;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No active session")]
    MissingSession,

    #[error("Backend URL or API key is not configured")]
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    /// Unix seconds.
    pub expires_at: Option<i64>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// A session without a known expiry is treated as live.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|at| at <= Utc::now().timestamp())
            .unwrap_or(false)
    }
}

/// Outcome of a sign-up. `session` is `None` when the backend requires
/// e-mail confirmation before the first sign-in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignUpResult {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
}

/// Remote auth operations. Carried in `AppState` as `Arc<dyn AuthBackend>`.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        user_data: Option<Value>,
    ) -> Result<SignUpResult, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    async fn reset_password_for_email(&self, email: &str) -> Result<(), AuthError>;

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError>;

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError>;
}
