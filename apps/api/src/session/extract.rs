use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::auth::AuthError;
use crate::errors::AppError;
use crate::session::SessionStore;
use crate::state::AppState;

/// The caller's session, restored from `Authorization: Bearer <token>`.
///
/// Guard middleware restores it once and stashes it in the request
/// extensions; handlers behind a guard reuse that copy.
#[derive(Clone)]
pub struct CurrentSession(pub SessionStore);

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// True when the auth service answered and refused the token.
fn is_rejected_token(err: &AppError) -> bool {
    matches!(
        err,
        AppError::Auth(AuthError::Api { status, .. }) if *status < 500
    ) || matches!(err, AppError::Auth(AuthError::MissingSession))
}

/// Builds a session for a request. A token the auth service rejects
/// yields a session in the error state, which guards treat as anonymous.
/// Failing to reach the auth service fails the request.
pub async fn restore_session(state: &AppState, headers: &HeaderMap) -> Result<SessionStore, AppError> {
    let mut session = SessionStore::new(state.auth.clone(), state.gateway.clone());
    let result = match bearer_token(headers) {
        Some(token) => session.resume(token).await,
        None => session.initialize(None).await,
    };
    match result {
        Ok(()) => Ok(session),
        Err(e) if is_rejected_token(&e) => {
            debug!("Request session not restored: {e}");
            Ok(session)
        }
        Err(e) => Err(e),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(existing) = parts.extensions.remove::<CurrentSession>() {
            return Ok(existing);
        }
        restore_session(state, &parts.headers).await.map(CurrentSession)
    }
}
