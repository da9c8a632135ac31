use axum::Json;

use crate::errors::AppError;
use crate::models::profile::{ProfileChanges, UserProfile};
use crate::session::extract::CurrentSession;

/// GET /api/v1/profile
pub async fn handle_get_profile(
    CurrentSession(mut session): CurrentSession,
) -> Result<Json<UserProfile>, AppError> {
    if let Some(profile) = session.profile().cloned() {
        return Ok(Json(profile));
    }
    Ok(Json(session.refresh_profile().await?))
}

/// PATCH /api/v1/profile
pub async fn handle_update_profile(
    CurrentSession(mut session): CurrentSession,
    Json(changes): Json<ProfileChanges>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(session.update_profile(&changes).await?))
}
