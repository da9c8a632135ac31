use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::fmt::Display;
use std::str::FromStr;

use serde::Deserialize;

use crate::errors::AppError;
use crate::gateway::DataGateway;
use crate::jobs::categories::{fetch_categories, get_category_by_id};
use crate::jobs::filter::JobFilters;
use crate::jobs::listing::{get_job_by_id, search_jobs};
use crate::jobs::management::{create_job, delete_job, get_managed_job, update_job};
use crate::jobs::store::{JobBoard, JobPage, ManagedJobs};
use crate::models::company::JobCategory;
use crate::models::job::{
    EmploymentType, ExperienceLevel, JobForm, JobPatch, JobRow, JobStatus, JobView,
};
use crate::session::extract::CurrentSession;
use crate::state::AppState;
use crate::tracked::Tracked;

/// Listing query string. `types` is comma-separated, e.g. `types=Full-time,Contract`.
/// Fields are kept raw so that an empty value (`posted=`) means unset.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobsQuery {
    pub q: Option<String>,
    pub keyword: Option<String>,
    pub location: Option<String>,
    pub types: Option<String>,
    pub experience: Option<String>,
    pub posted: Option<String>,
    pub skills: Option<String>,
    pub salary_min: Option<String>,
    pub salary_max: Option<String>,
    pub category: Option<String>,
    pub page: Option<String>,
}

/// Parses a query value, treating a missing or blank one as unset.
fn parse_set<T>(field: &str, raw: Option<&str>) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|e| AppError::Validation(format!("Invalid {field} '{value}': {e}"))),
        None => Ok(None),
    }
}

impl JobsQuery {
    pub fn filters(&self) -> Result<JobFilters, AppError> {
        let types = match self.types.as_deref() {
            Some(raw) => raw
                .split(',')
                .filter(|t| !t.trim().is_empty())
                .map(|t| t.parse::<EmploymentType>().map_err(AppError::Validation))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(JobFilters {
            keyword: self.keyword.clone().unwrap_or_default(),
            location: self.location.clone().unwrap_or_default(),
            types,
            experience: parse_set::<ExperienceLevel>("experience", self.experience.as_deref())?,
            posted: parse_set("posted", self.posted.as_deref())?,
            skills: self.skills.clone().unwrap_or_default(),
            salary_min: parse_set("salaryMin", self.salary_min.as_deref())?,
            salary_max: parse_set("salaryMax", self.salary_max.as_deref())?,
            category: self.category.clone().filter(|c| !c.is_empty()),
        })
    }

    pub fn page(&self) -> Result<usize, AppError> {
        Ok(parse_set("page", self.page.as_deref())?.unwrap_or(1))
    }
}

#[derive(Deserialize)]
pub struct StatusChange {
    pub status: JobStatus,
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobsQuery>,
) -> Result<Json<JobPage>, AppError> {
    let filters = query.filters()?;
    let mut board = JobBoard::default();
    board.fetch(state.gateway.as_ref(), Some(&filters)).await?;
    board.current_page = query.page()?;
    Ok(Json(board.current(&filters)))
}

/// GET /api/v1/jobs/search?q=
pub async fn handle_search_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobsQuery>,
) -> Result<Json<JobPage>, AppError> {
    let filters = query.filters()?;
    let term = query.q.as_deref().unwrap_or_default();
    let results = search_jobs(state.gateway.as_ref(), term, Some(&filters)).await?;
    Ok(Json(JobPage::of(&results, query.page()?)))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobView>, AppError> {
    Ok(Json(get_job_by_id(state.gateway.as_ref(), &id).await?))
}

/// GET /api/v1/categories
pub async fn handle_list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobCategory>>, AppError> {
    Ok(Json(fetch_categories(state.gateway.as_ref()).await?))
}

/// GET /api/v1/categories/:id
pub async fn handle_get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobCategory>, AppError> {
    Ok(Json(get_category_by_id(state.gateway.as_ref(), &id).await?))
}

/// Loads a job and checks it belongs to `company_id`.
async fn owned_job(
    gateway: &dyn DataGateway,
    company_id: &str,
    job_id: &str,
) -> Result<JobRow, AppError> {
    let job = get_managed_job(gateway, job_id).await?;
    if job.company_id.as_deref() != Some(company_id) {
        return Err(AppError::Forbidden);
    }
    Ok(job)
}

/// GET /api/v1/recruiter/jobs
pub async fn handle_company_jobs(
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let company_id = session.require_company_id()?;
    let gateway = session.data_gateway()?;
    let mut managed = ManagedJobs::default();
    managed.fetch(gateway.as_ref(), company_id).await?;
    Ok(Json(managed.jobs.data))
}

/// POST /api/v1/recruiter/jobs
pub async fn handle_create_job(
    CurrentSession(session): CurrentSession,
    Json(mut form): Json<JobForm>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    form.company_id = session.require_company_id()?.to_string();
    let gateway = session.data_gateway()?;
    let job = create_job(gateway.as_ref(), &form).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/recruiter/jobs/:id
pub async fn handle_get_managed_job(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> Result<Json<JobRow>, AppError> {
    let company_id = session.require_company_id()?;
    let gateway = session.data_gateway()?;
    Ok(Json(owned_job(gateway.as_ref(), company_id, &id).await?))
}

/// PATCH /api/v1/recruiter/jobs/:id
pub async fn handle_update_job(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(patch): Json<JobPatch>,
) -> Result<Json<JobRow>, AppError> {
    let company_id = session.require_company_id()?;
    let gateway = session.data_gateway()?;
    owned_job(gateway.as_ref(), company_id, &id).await?;
    Ok(Json(update_job(gateway.as_ref(), &id, &patch).await?))
}

/// DELETE /api/v1/recruiter/jobs/:id
pub async fn handle_delete_job(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let company_id = session.require_company_id()?;
    let gateway = session.data_gateway()?;
    owned_job(gateway.as_ref(), company_id, &id).await?;
    delete_job(gateway.as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/recruiter/jobs/:id/status
pub async fn handle_update_job_status(
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Result<Json<JobRow>, AppError> {
    let company_id = session.require_company_id()?;
    let gateway = session.data_gateway()?;
    let job = owned_job(gateway.as_ref(), company_id, &id).await?;
    let mut managed = ManagedJobs {
        jobs: Tracked::new(vec![job]),
    };
    Ok(Json(managed.set_status(gateway.as_ref(), &id, change.status).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_lowers_to_filters() {
        let query = JobsQuery {
            types: Some("Full-time, contract".to_string()),
            salary_min: Some("70".to_string()),
            posted: Some(String::new()),
            experience: Some(String::new()),
            category: Some(String::new()),
            ..JobsQuery::default()
        };
        let filters = query.filters().unwrap();
        assert_eq!(
            filters.types,
            vec![EmploymentType::FullTime, EmploymentType::Contract]
        );
        assert_eq!(filters.salary_min, Some(70));
        assert_eq!(filters.posted, None);
        assert_eq!(filters.experience, None);
        assert_eq!(filters.category, None);
        assert_eq!(query.page().unwrap(), 1);
    }

    #[test]
    fn test_malformed_number_is_rejected() {
        let query = JobsQuery {
            posted: Some("soon".to_string()),
            ..JobsQuery::default()
        };
        assert!(matches!(query.filters(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let query = JobsQuery {
            types: Some("Gig".to_string()),
            ..JobsQuery::default()
        };
        assert!(matches!(query.filters(), Err(AppError::Validation(_))));
    }
}
