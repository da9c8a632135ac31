//! Recruiter-side job management: posting, editing, retiring jobs.

use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::errors::AppError;
use crate::gateway::{
    insert_as, remove_as, select_as, tables, update_as, DataGateway, Filter, OrderBy, SelectOptions,
};
use crate::models::job::{JobForm, JobPatch, JobRow, JobStatus};

const COMPANY_JOB_COLUMNS: &str = r#"
    id,
    title,
    company_id,
    location,
    posted_days_ago,
    employment_type,
    experience_level,
    salary_min,
    salary_max,
    currency,
    status,
    views_count,
    applications_count,
    created_at,
    updated_at,
    company:companies ( id, name, logo_url )
"#;

const MANAGED_JOB_COLUMNS: &str = r#"
    id,
    title,
    company_id,
    location,
    posted_days_ago,
    employment_type,
    experience_level,
    salary_min,
    salary_max,
    currency,
    description,
    skills,
    requirements,
    benefits,
    equity,
    remote_allowed,
    status,
    views_count,
    applications_count,
    created_at,
    updated_at,
    company:companies ( id, name, description, logo_url )
"#;

/// A new job row: the recruiter's form plus zeroed lifecycle counters.
#[derive(Serialize)]
struct NewJobRow<'a> {
    #[serde(flatten)]
    form: &'a JobForm,
    posted_days_ago: u32,
    views_count: u64,
    applications_count: u64,
}

pub async fn create_job(gateway: &dyn DataGateway, form: &JobForm) -> Result<JobRow, AppError> {
    if form.title.trim().is_empty() {
        return Err(AppError::Validation("Job title is required".to_string()));
    }
    if form.company_id.trim().is_empty() {
        return Err(AppError::Validation("Job must belong to a company".to_string()));
    }

    let row = NewJobRow {
        form,
        posted_days_ago: 0,
        views_count: 0,
        applications_count: 0,
    };
    let created: Vec<JobRow> = insert_as(gateway, tables::JOBS, &row).await?;
    let job = created
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Job insert returned no row")))?;

    info!("Created job {} for company {}", job.id, form.company_id);
    Ok(job)
}

pub async fn update_job(
    gateway: &dyn DataGateway,
    job_id: &str,
    patch: &JobPatch,
) -> Result<JobRow, AppError> {
    let updated: Vec<JobRow> =
        update_as(gateway, tables::JOBS, patch, &[Filter::eq("id", job_id)]).await?;
    updated
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

/// Hard delete. Returns the removed rows (empty if the id did not exist).
pub async fn delete_job(gateway: &dyn DataGateway, job_id: &str) -> Result<Vec<JobRow>, AppError> {
    let removed: Vec<JobRow> =
        remove_as(gateway, tables::JOBS, &[Filter::eq("id", job_id)]).await?;
    info!("Deleted job {job_id} ({} rows)", removed.len());
    Ok(removed)
}

/// Every job of a company regardless of status, newest first.
pub async fn fetch_company_jobs(
    gateway: &dyn DataGateway,
    company_id: &str,
) -> Result<Vec<JobRow>, AppError> {
    let options = SelectOptions::columns(COMPANY_JOB_COLUMNS)
        .filter(Filter::eq("company_id", company_id))
        .order(OrderBy::desc("created_at"));
    Ok(select_as(gateway, tables::JOBS, &options).await?)
}

/// A job in any status, with full detail.
pub async fn get_managed_job(gateway: &dyn DataGateway, job_id: &str) -> Result<JobRow, AppError> {
    let options = SelectOptions::columns(MANAGED_JOB_COLUMNS).filter(Filter::eq("id", job_id));
    let rows: Vec<JobRow> = select_as(gateway, tables::JOBS, &options).await?;
    rows.into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

pub async fn update_job_status(
    gateway: &dyn DataGateway,
    job_id: &str,
    status: JobStatus,
) -> Result<JobRow, AppError> {
    let updated: Vec<JobRow> = update_as(
        gateway,
        tables::JOBS,
        &json!({ "status": status }),
        &[Filter::eq("id", job_id)],
    )
    .await?;
    let job = updated
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    info!("Job {job_id} is now {}", status.as_str());
    Ok(job)
}
