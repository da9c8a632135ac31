//! Session and identity state.
//!
//! A [`SessionStore`] is owned by whoever drives it: one per HTTP request,
//! restored from the caller's bearer token. Every transition is an awaited
//! call; nothing changes behind the owner's back.

pub mod extract;
pub mod handlers;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::auth::{AuthBackend, AuthError, Session, SignUpResult};
use crate::errors::AppError;
use crate::gateway::DataGateway;
use crate::models::profile::{NewUserProfile, ProfileChanges, UserProfile};
use crate::profiles::{create_user_profile, fetch_user_profile, update_user_profile};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Authenticating,
    Authenticated {
        session: Session,
        profile: Option<UserProfile>,
    },
    Anonymous,
    Error {
        message: String,
    },
}

#[derive(Clone)]
pub struct SessionStore {
    auth: Arc<dyn AuthBackend>,
    gateway: Arc<dyn DataGateway>,
    state: SessionState,
    last_error: Option<String>,
}

/// What a client needs to know about the current caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub authenticated: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub is_recruiter: bool,
    pub can_post_jobs: bool,
    pub company_id: Option<String>,
    pub profile: Option<UserProfile>,
    pub last_error: Option<String>,
}

impl SessionStore {
    pub fn new(auth: Arc<dyn AuthBackend>, gateway: Arc<dyn DataGateway>) -> Self {
        Self {
            auth,
            gateway,
            state: SessionState::Uninitialized,
            last_error: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Authenticated { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        match &self.state {
            SessionState::Authenticated { profile, .. } => profile.as_ref(),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session().map(|s| s.user.id.as_str())
    }

    pub fn user_email(&self) -> Option<&str> {
        self.session().and_then(|s| s.user.email.as_deref())
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session().map(|s| s.access_token.as_str())
    }

    pub fn is_recruiter(&self) -> bool {
        self.profile().map(|p| p.is_recruiter).unwrap_or(false)
    }

    pub fn can_post_jobs(&self) -> bool {
        self.profile().map(UserProfile::can_post_jobs).unwrap_or(false)
    }

    pub fn company_id(&self) -> Option<&str> {
        self.profile().and_then(|p| p.company_id.as_deref())
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            authenticated: self.is_authenticated(),
            user_id: self.user_id().map(str::to_string),
            email: self.user_email().map(str::to_string),
            is_recruiter: self.is_recruiter(),
            can_post_jobs: self.can_post_jobs(),
            company_id: self.company_id().map(str::to_string),
            profile: self.profile().cloned(),
            last_error: self.last_error.clone(),
        }
    }

    /// The caller's id, or `Unauthorized` for anonymous callers.
    pub fn require_user_id(&self) -> Result<&str, AppError> {
        self.user_id().ok_or(AppError::Unauthorized)
    }

    /// The recruiter's company, or `Forbidden` when the caller cannot post jobs.
    pub fn require_company_id(&self) -> Result<&str, AppError> {
        if !self.is_authenticated() {
            return Err(AppError::Unauthorized);
        }
        if !self.can_post_jobs() {
            return Err(AppError::Forbidden);
        }
        self.company_id().ok_or(AppError::Forbidden)
    }

    /// A gateway acting as the signed-in user.
    pub fn data_gateway(&self) -> Result<Box<dyn DataGateway>, AppError> {
        let token = self.access_token().ok_or(AppError::Unauthorized)?;
        Ok(self.gateway.with_access_token(token))
    }

    /// Restores a previously issued session. An expired session is refreshed
    /// when it carries a refresh token and dropped otherwise.
    pub async fn initialize(&mut self, stored: Option<Session>) -> Result<(), AppError> {
        self.last_error = None;
        let Some(stored) = stored else {
            self.state = SessionState::Anonymous;
            return Ok(());
        };
        self.state = SessionState::Authenticating;

        let session = if stored.is_expired() {
            let Some(refresh_token) = stored.refresh_token.as_deref() else {
                debug!("Stored session expired and cannot be refreshed");
                self.state = SessionState::Anonymous;
                return Ok(());
            };
            match self.auth.refresh_session(refresh_token).await {
                Ok(session) => session,
                Err(e) => return Err(self.fail(e)),
            }
        } else {
            match self.auth.get_user(&stored.access_token).await {
                Ok(user) => Session { user, ..stored },
                Err(e) => return Err(self.fail(e)),
            }
        };

        self.establish(session).await;
        Ok(())
    }

    /// Restores the session behind a bare access token, as sent in a
    /// request's `Authorization` header.
    pub async fn resume(&mut self, access_token: &str) -> Result<(), AppError> {
        self.last_error = None;
        self.state = SessionState::Authenticating;
        let user = match self.auth.get_user(access_token).await {
            Ok(user) => user,
            Err(e) => return Err(self.fail(e)),
        };
        let session = Session {
            access_token: access_token.to_string(),
            refresh_token: None,
            expires_in: None,
            expires_at: None,
            token_type: "bearer".to_string(),
            user,
        };
        self.establish(session).await;
        Ok(())
    }

    /// Creates the identity and, when one comes back, its non-recruiter
    /// profile. A failed profile insert leaves the identity in place.
    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        user_data: Option<Value>,
    ) -> Result<SignUpResult, AppError> {
        self.last_error = None;
        self.state = SessionState::Authenticating;
        let result = match self.auth.sign_up(email, password, user_data.clone()).await {
            Ok(result) => result,
            Err(e) => return Err(self.fail(e)),
        };

        let Some(user) = result.user.as_ref() else {
            self.state = SessionState::Anonymous;
            return Ok(result);
        };

        let metadata = |key: &str| {
            user_data
                .as_ref()
                .and_then(|data| data.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let new_profile = NewUserProfile {
            id: user.id.clone(),
            email: user.email.clone().unwrap_or_else(|| email.to_string()),
            first_name: metadata("first_name"),
            last_name: metadata("last_name"),
            is_recruiter: false,
        };

        let created = match &result.session {
            Some(session) => {
                let gateway = self.gateway.with_access_token(&session.access_token);
                create_user_profile(gateway.as_ref(), &new_profile).await
            }
            None => create_user_profile(self.gateway.as_ref(), &new_profile).await,
        };

        let profile = match created {
            Ok(profile) => Some(profile),
            Err(e) => {
                error!("Identity {} has no profile, creation failed: {e}", user.id);
                self.last_error = Some(e.to_string());
                self.state = match &result.session {
                    Some(session) => SessionState::Authenticated {
                        session: session.clone(),
                        profile: None,
                    },
                    None => SessionState::Anonymous,
                };
                return Err(e);
            }
        };

        info!("Signed up user {}", user.id);
        self.state = match &result.session {
            Some(session) => SessionState::Authenticated {
                session: session.clone(),
                profile,
            },
            None => SessionState::Anonymous,
        };
        Ok(result)
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, AppError> {
        self.last_error = None;
        self.state = SessionState::Authenticating;
        let session = match self.auth.sign_in_with_password(email, password).await {
            Ok(session) => session,
            Err(e) => return Err(self.fail(e)),
        };
        info!("User {} signed in", session.user.id);
        self.establish(session.clone()).await;
        Ok(session)
    }

    pub async fn sign_out(&mut self) -> Result<(), AppError> {
        self.last_error = None;
        if let Some(token) = self.access_token().map(str::to_string) {
            if let Err(e) = self.auth.sign_out(&token).await {
                return Err(self.fail(e));
            }
        }
        self.state = SessionState::Anonymous;
        Ok(())
    }

    /// Asks the backend to mail a reset link. The session itself is untouched.
    pub async fn reset_password(&mut self, email: &str) -> Result<(), AppError> {
        self.last_error = None;
        self.auth
            .reset_password_for_email(email)
            .await
            .map_err(|e| self.record(e))
    }

    /// Swaps the held session for a fresh one, keeping the profile.
    pub async fn refresh_session(&mut self) -> Result<Session, AppError> {
        let refresh_token = self
            .session()
            .and_then(|s| s.refresh_token.clone())
            .ok_or_else(|| self.record(AuthError::MissingSession))?;
        self.exchange_refresh_token(&refresh_token).await
    }

    pub async fn exchange_refresh_token(&mut self, refresh_token: &str) -> Result<Session, AppError> {
        self.last_error = None;
        let session = match self.auth.refresh_session(refresh_token).await {
            Ok(session) => session,
            Err(e) => return Err(self.fail(e)),
        };
        debug!("Refreshed session for user {}", session.user.id);
        if self.user_id() == Some(session.user.id.as_str()) {
            if let SessionState::Authenticated { session: held, .. } = &mut self.state {
                *held = session.clone();
            }
        } else {
            self.establish(session.clone()).await;
        }
        Ok(session)
    }

    pub async fn refresh_profile(&mut self) -> Result<UserProfile, AppError> {
        self.last_error = None;
        let gateway = self.data_gateway()?;
        let user_id = self.require_user_id()?.to_string();
        let profile = fetch_user_profile(gateway.as_ref(), &user_id)
            .await
            .map_err(|e| self.record(e))?;
        self.set_profile(profile.clone());
        Ok(profile)
    }

    pub async fn update_profile(&mut self, changes: &ProfileChanges) -> Result<UserProfile, AppError> {
        self.last_error = None;
        let gateway = self.data_gateway()?;
        let user_id = self.require_user_id()?.to_string();
        let profile = update_user_profile(gateway.as_ref(), &user_id, changes)
            .await
            .map_err(|e| self.record(e))?;
        info!("Updated profile of user {user_id}");
        self.set_profile(profile.clone());
        Ok(profile)
    }

    /// Moves to `Authenticated`, loading the profile. A profile that cannot
    /// be loaded is reported through `last_error` only.
    async fn establish(&mut self, session: Session) {
        let gateway = self.gateway.with_access_token(&session.access_token);
        let profile = match fetch_user_profile(gateway.as_ref(), &session.user.id).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("Profile of user {} unavailable: {e}", session.user.id);
                self.last_error = Some(e.to_string());
                None
            }
        };
        self.state = SessionState::Authenticated { session, profile };
    }

    fn set_profile(&mut self, updated: UserProfile) {
        if let SessionState::Authenticated { profile, .. } = &mut self.state {
            *profile = Some(updated);
        }
    }

    fn record(&mut self, err: impl Into<AppError>) -> AppError {
        let err = err.into();
        self.last_error = Some(err.to_string());
        err
    }

    fn fail(&mut self, err: impl Into<AppError>) -> AppError {
        let err = self.record(err);
        self.state = SessionState::Error {
            message: err.to_string(),
        };
        err
    }
}
