use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::{AuthUser, Session};
use crate::errors::AppError;
use crate::models::profile::UserProfile;
use crate::session::extract::CurrentSession;
use crate::session::SessionSummary;

#[derive(Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl SignUpRequest {
    fn user_data(&self) -> Option<Value> {
        let mut data = Map::new();
        if let Some(first) = &self.first_name {
            data.insert("first_name".to_string(), Value::String(first.clone()));
        }
        if let Some(last) = &self.last_name {
            data.insert("last_name".to_string(), Value::String(last.clone()));
        }
        (!data.is_empty()).then_some(Value::Object(data))
    }
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
    pub profile: Option<UserProfile>,
    /// Set when the user is signed in but their profile could not be loaded.
    pub warning: Option<String>,
}

/// POST /api/v1/auth/signup
pub async fn handle_sign_up(
    CurrentSession(mut session): CurrentSession,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let result = session
        .sign_up(&req.email, &req.password, req.user_data())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: result.user,
            session: result.session,
            profile: session.profile().cloned(),
            warning: None,
        }),
    ))
}

/// POST /api/v1/auth/signin
pub async fn handle_sign_in(
    CurrentSession(mut session): CurrentSession,
    Json(req): Json<Credentials>,
) -> Result<Json<AuthResponse>, AppError> {
    let signed_in = session.sign_in(&req.email, &req.password).await?;
    Ok(Json(AuthResponse {
        user: Some(signed_in.user.clone()),
        session: Some(signed_in),
        profile: session.profile().cloned(),
        warning: session.last_error().map(str::to_string),
    }))
}

/// POST /api/v1/auth/signout
pub async fn handle_sign_out(
    CurrentSession(mut session): CurrentSession,
) -> Result<StatusCode, AppError> {
    session.sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/reset-password
pub async fn handle_reset_password(
    CurrentSession(mut session): CurrentSession,
    Json(req): Json<ResetRequest>,
) -> Result<StatusCode, AppError> {
    session.reset_password(&req.email).await?;
    Ok(StatusCode::ACCEPTED)
}

/// POST /api/v1/auth/refresh
pub async fn handle_refresh(
    CurrentSession(mut session): CurrentSession,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let refreshed = session.exchange_refresh_token(&req.refresh_token).await?;
    Ok(Json(AuthResponse {
        user: Some(refreshed.user.clone()),
        session: Some(refreshed),
        profile: session.profile().cloned(),
        warning: session.last_error().map(str::to_string),
    }))
}

/// GET /api/v1/auth/session
pub async fn handle_get_session(CurrentSession(session): CurrentSession) -> Json<SessionSummary> {
    Json(session.summary())
}
