use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::applications::{application_company_id, check_existing_application};
use crate::applications::store::{ApplicationBoard, StatusCounts};
use crate::errors::AppError;
use crate::jobs::management::get_managed_job;
use crate::models::application::{
    ApplicationRow, ApplicationStatus, ExistingApplication, NewApplication,
};
use crate::session::extract::CurrentSession;

#[derive(Serialize)]
pub struct ApplicationListResponse {
    pub applications: Vec<ApplicationRow>,
    pub counts: StatusCounts,
}

impl From<ApplicationBoard> for ApplicationListResponse {
    fn from(board: ApplicationBoard) -> Self {
        let counts = board.grouped().counts();
        Self {
            applications: board.applications.data,
            counts,
        }
    }
}

#[derive(Deserialize)]
pub struct ApplyRequest {
    pub job_id: String,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
}

#[derive(Deserialize)]
pub struct JobIdQuery {
    pub job_id: String,
}

#[derive(Deserialize)]
pub struct StatusChange {
    pub status: ApplicationStatus,
}

/// GET /api/v1/applications/mine
pub async fn handle_my_applications(
    CurrentSession(session): CurrentSession,
) -> Result<Json<ApplicationListResponse>, AppError> {
    let gateway = session.data_gateway()?;
    let mut board = ApplicationBoard::default();
    board
        .fetch_for_user(gateway.as_ref(), session.require_user_id()?)
        .await?;
    Ok(Json(board.into()))
}

/// POST /api/v1/applications
pub async fn handle_apply(
    CurrentSession(session): CurrentSession,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    let gateway = session.data_gateway()?;
    let user_id = session.require_user_id()?;

    let existing = check_existing_application(gateway.as_ref(), user_id, &req.job_id).await?;
    if existing.exists {
        return Err(AppError::Conflict(format!(
            "Already applied to job {}",
            req.job_id
        )));
    }

    let application = NewApplication {
        user_id: user_id.to_string(),
        job_id: req.job_id,
        cover_letter: req.cover_letter,
        resume_url: req.resume_url,
    };
    let mut board = ApplicationBoard::default();
    let created = board.submit(gateway.as_ref(), &application).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/applications/check?job_id=
pub async fn handle_check_application(
    CurrentSession(session): CurrentSession,
    Query(params): Query<JobIdQuery>,
) -> Result<Json<ExistingApplication>, AppError> {
    let gateway = session.data_gateway()?;
    let existing =
        check_existing_application(gateway.as_ref(), session.require_user_id()?, &params.job_id)
            .await?;
    Ok(Json(existing))
}

/// GET /api/v1/recruiter/jobs/:id/applications
pub async fn handle_job_applications(
    CurrentSession(session): CurrentSession,
    Path(job_id): Path<String>,
) -> Result<Json<ApplicationListResponse>, AppError> {
    let company_id = session.require_company_id()?;
    let gateway = session.data_gateway()?;

    let job = get_managed_job(gateway.as_ref(), &job_id).await?;
    if job.company_id.as_deref() != Some(company_id) {
        return Err(AppError::Forbidden);
    }

    let mut board = ApplicationBoard::default();
    board.fetch_for_job(gateway.as_ref(), &job_id).await?;
    Ok(Json(board.into()))
}

/// GET /api/v1/recruiter/applications
pub async fn handle_company_applications(
    CurrentSession(session): CurrentSession,
) -> Result<Json<ApplicationListResponse>, AppError> {
    let company_id = session.require_company_id()?;
    let gateway = session.data_gateway()?;
    let mut board = ApplicationBoard::default();
    board.fetch_for_company(gateway.as_ref(), company_id).await?;
    Ok(Json(board.into()))
}

/// PATCH /api/v1/recruiter/applications/:id/status
pub async fn handle_update_application_status(
    CurrentSession(session): CurrentSession,
    Path(application_id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Result<Json<ApplicationRow>, AppError> {
    let company_id = session.require_company_id()?;
    let gateway = session.data_gateway()?;

    let owner = application_company_id(gateway.as_ref(), &application_id).await?;
    if owner.as_deref() != Some(company_id) {
        return Err(AppError::Forbidden);
    }

    let mut board = ApplicationBoard::default();
    let updated = board
        .set_status(gateway.as_ref(), &application_id, change.status)
        .await?;
    Ok(Json(updated))
}
