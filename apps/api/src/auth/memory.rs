//! In-memory `AuthBackend` for session and router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{AuthBackend, AuthError, AuthUser, Session, SignUpResult};

#[derive(Default)]
struct Inner {
    /// email -> (password, user)
    accounts: HashMap<String, (String, AuthUser)>,
    /// access token -> user id
    access: HashMap<String, String>,
    /// refresh token -> user id
    refresh: HashMap<String, String>,
    resets: Vec<String>,
    unavailable: bool,
}

#[derive(Clone, Default)]
pub struct MemoryAuth {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account and returns its user.
    pub fn register(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
            user_metadata: json!({}),
        };
        self.inner
            .lock()
            .unwrap()
            .accounts
            .insert(email.to_string(), (password.to_string(), user.clone()));
        user
    }

    /// Issues a live session for an already registered account.
    pub fn issue_session(&self, email: &str) -> Session {
        let mut inner = self.inner.lock().unwrap();
        let user = inner.accounts[email].1.clone();
        issue(&mut inner, user, 3600)
    }

    /// Issues an already expired session for an already registered account.
    pub fn issue_expired_session(&self, email: &str) -> Session {
        let mut inner = self.inner.lock().unwrap();
        let user = inner.accounts[email].1.clone();
        issue(&mut inner, user, -60)
    }

    pub fn reset_requests(&self) -> Vec<String> {
        self.inner.lock().unwrap().resets.clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unwrap().unavailable = unavailable;
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Inner>, AuthError> {
        let inner = self.inner.lock().unwrap();
        if inner.unavailable {
            return Err(AuthError::Api {
                status: 503,
                message: "auth service unavailable".to_string(),
            });
        }
        Ok(inner)
    }
}

fn issue(inner: &mut Inner, user: AuthUser, ttl: i64) -> Session {
    let access_token = Uuid::new_v4().to_string();
    let refresh_token = Uuid::new_v4().to_string();
    inner.access.insert(access_token.clone(), user.id.clone());
    inner.refresh.insert(refresh_token.clone(), user.id.clone());
    Session {
        access_token,
        refresh_token: Some(refresh_token),
        expires_in: Some(ttl),
        expires_at: Some(Utc::now().timestamp() + ttl),
        token_type: "bearer".to_string(),
        user,
    }
}

fn user_by_id(inner: &Inner, id: &str) -> Option<AuthUser> {
    inner
        .accounts
        .values()
        .find(|(_, user)| user.id == id)
        .map(|(_, user)| user.clone())
}

fn rejected(message: &str) -> AuthError {
    AuthError::Api {
        status: 400,
        message: message.to_string(),
    }
}

#[async_trait]
impl AuthBackend for MemoryAuth {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        user_data: Option<Value>,
    ) -> Result<SignUpResult, AuthError> {
        let mut inner = self.guard()?;
        if inner.accounts.contains_key(email) {
            return Err(rejected("User already registered"));
        }
        let user = AuthUser {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
            user_metadata: user_data.unwrap_or_else(|| json!({})),
        };
        inner
            .accounts
            .insert(email.to_string(), (password.to_string(), user.clone()));
        let session = issue(&mut inner, user.clone(), 3600);
        Ok(SignUpResult {
            user: Some(user),
            session: Some(session),
        })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let mut inner = self.guard()?;
        let user = match inner.accounts.get(email) {
            Some((stored, user)) if stored == password => user.clone(),
            _ => return Err(rejected("Invalid login credentials")),
        };
        Ok(issue(&mut inner, user, 3600))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let mut inner = self.guard()?;
        inner.access.remove(access_token);
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<(), AuthError> {
        let mut inner = self.guard()?;
        inner.resets.push(email.to_string());
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let inner = self.guard()?;
        inner
            .access
            .get(access_token)
            .and_then(|id| user_by_id(&inner, id))
            .ok_or(AuthError::Api {
                status: 401,
                message: "invalid JWT".to_string(),
            })
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let mut inner = self.guard()?;
        let user = inner
            .refresh
            .remove(refresh_token)
            .and_then(|id| user_by_id(&inner, &id))
            .ok_or_else(|| rejected("Invalid Refresh Token"))?;
        Ok(issue(&mut inner, user, 3600))
    }
}
