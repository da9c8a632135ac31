//! Route guards: which callers may reach a route, and where the rest go.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::session::extract::{restore_session, CurrentSession};
use crate::session::SessionStore;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_guest: bool,
    pub requires_recruiter: bool,
}

impl RouteMeta {
    pub const AUTHENTICATED: RouteMeta = RouteMeta {
        requires_auth: true,
        requires_guest: false,
        requires_recruiter: false,
    };

    pub const GUEST: RouteMeta = RouteMeta {
        requires_auth: false,
        requires_guest: true,
        requires_recruiter: false,
    };

    pub const RECRUITER: RouteMeta = RouteMeta {
        requires_auth: true,
        requires_guest: false,
        requires_recruiter: true,
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum NavigationDecision {
    Proceed,
    Redirect { to: &'static str },
}

pub fn check(meta: &RouteMeta, session: &SessionStore) -> NavigationDecision {
    let authenticated = session.is_authenticated();
    if (meta.requires_auth || meta.requires_recruiter) && !authenticated {
        return NavigationDecision::Redirect { to: LOGIN_PATH };
    }
    if meta.requires_guest && authenticated {
        return NavigationDecision::Redirect { to: HOME_PATH };
    }
    if meta.requires_recruiter && !session.is_recruiter() {
        return NavigationDecision::Redirect { to: HOME_PATH };
    }
    NavigationDecision::Proceed
}

impl NavigationDecision {
    /// A redirect to the login page is a 401; any other redirect is a 403.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            NavigationDecision::Proceed => Ok(()),
            NavigationDecision::Redirect { to: LOGIN_PATH } => Err(AppError::Unauthorized),
            NavigationDecision::Redirect { .. } => Err(AppError::Forbidden),
        }
    }
}

async fn enforce(
    meta: RouteMeta,
    state: AppState,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = restore_session(&state, request.headers()).await?;
    let decision = check(&meta, &session);
    if decision != NavigationDecision::Proceed {
        debug!("Guard refused {} {}: {decision:?}", request.method(), request.uri().path());
    }
    decision.into_result()?;
    request.extensions_mut().insert(CurrentSession(session));
    Ok(next.run(request).await)
}

pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(RouteMeta::AUTHENTICATED, state, request, next).await
}

pub async fn require_guest(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(RouteMeta::GUEST, state, request, next).await
}

pub async fn require_recruiter(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(RouteMeta::RECRUITER, state, request, next).await
}

/// POST /api/v1/navigation/check
pub async fn handle_navigation_check(
    CurrentSession(session): CurrentSession,
    Json(meta): Json<RouteMeta>,
) -> Json<NavigationDecision> {
    Json(check(&meta, &session))
}
