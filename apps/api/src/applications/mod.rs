//! Job applications: applicants submit them, recruiters review them.
//!
//! The one-application-per-user-per-job rule is checked, not enforced: call
//! [`check_existing_application`] before [`create_application`]. Two racing
//! submissions can both pass the check.

pub mod handlers;
pub mod store;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::gateway::{insert_as, select_as, tables, update_as, DataGateway, Filter, OrderBy, SelectOptions};
use crate::models::application::{
    ApplicationRow, ApplicationStatus, ApplicationSummary, ExistingApplication, NewApplication,
};

const APPLICANT_COLUMNS: &str = r#"
    id,
    email,
    first_name,
    last_name,
    avatar_url,
    location,
    skills,
    experience_years,
    resume_url,
    linkedin_url,
    github_url
"#;

const USER_APPLICATION_COLUMNS: &str = r#"
    id, user_id, job_id, status, cover_letter, resume_url, applied_at, updated_at,
    job:jobs (
        id, title, location, employment_type, experience_level, salary_min, salary_max,
        company:companies ( id, name, logo_url )
    )
"#;

fn job_application_columns() -> String {
    format!(
        "id, user_id, job_id, status, cover_letter, resume_url, applied_at, updated_at, \
         user:user_profiles ( {APPLICANT_COLUMNS} )"
    )
}

fn company_application_columns() -> String {
    format!(
        "id, user_id, job_id, status, cover_letter, resume_url, applied_at, updated_at, \
         job:jobs!inner ( id, title, location, employment_type, experience_level, company_id ), \
         user:user_profiles ( {APPLICANT_COLUMNS} )"
    )
}

fn newest_first(columns: &str) -> SelectOptions {
    SelectOptions::columns(columns).order(OrderBy::desc("applied_at"))
}

/// An applicant's own applications with the job and company attached.
pub async fn fetch_user_applications(
    gateway: &dyn DataGateway,
    user_id: &str,
) -> Result<Vec<ApplicationRow>, AppError> {
    let options = newest_first(USER_APPLICATION_COLUMNS).filter(Filter::eq("user_id", user_id));
    Ok(select_as(gateway, tables::APPLICATIONS, &options).await?)
}

/// Applications to one job with the applicant's profile attached.
pub async fn fetch_job_applications(
    gateway: &dyn DataGateway,
    job_id: &str,
) -> Result<Vec<ApplicationRow>, AppError> {
    let options = newest_first(&job_application_columns()).filter(Filter::eq("job_id", job_id));
    Ok(select_as(gateway, tables::APPLICATIONS, &options).await?)
}

/// Applications to any job of `company_id`.
///
/// Fetches every application visible to the caller and keeps the company's
/// on this side, so cost grows with all applications, not the company's.
pub async fn fetch_company_applications(
    gateway: &dyn DataGateway,
    company_id: &str,
) -> Result<Vec<ApplicationRow>, AppError> {
    let options = newest_first(&company_application_columns());
    let all: Vec<ApplicationRow> = select_as(gateway, tables::APPLICATIONS, &options).await?;
    let total = all.len();
    let mine: Vec<ApplicationRow> = all
        .into_iter()
        .filter(|app| app.company_id() == Some(company_id))
        .collect();
    debug!("Kept {} of {} applications for company {company_id}", mine.len(), total);
    Ok(mine)
}

#[derive(Serialize)]
struct PendingApplication<'a> {
    #[serde(flatten)]
    application: &'a NewApplication,
    status: ApplicationStatus,
}

/// Inserts the application as pending, whatever the caller asked for.
pub async fn create_application(
    gateway: &dyn DataGateway,
    application: &NewApplication,
) -> Result<ApplicationRow, AppError> {
    let row = PendingApplication {
        application,
        status: ApplicationStatus::Pending,
    };
    let created: Vec<ApplicationRow> = insert_as(gateway, tables::APPLICATIONS, &row).await?;
    let created = created
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Application insert returned no row")))?;
    info!(
        "User {} applied to job {} ({})",
        created.user_id, created.job_id, created.id
    );
    Ok(created)
}

/// Overwrites the status and touches `updated_at`. No transition rules apply.
pub async fn update_application_status(
    gateway: &dyn DataGateway,
    application_id: &str,
    status: ApplicationStatus,
) -> Result<ApplicationRow, AppError> {
    let updated: Vec<ApplicationRow> = update_as(
        gateway,
        tables::APPLICATIONS,
        &json!({ "status": status, "updated_at": Utc::now() }),
        &[Filter::eq("id", application_id)],
    )
    .await?;
    updated
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))
}

#[derive(Deserialize)]
struct ApplicationOwner {
    job: Option<JobOwner>,
}

#[derive(Deserialize)]
struct JobOwner {
    company_id: Option<String>,
}

/// The company owning the job an application was made to.
pub async fn application_company_id(
    gateway: &dyn DataGateway,
    application_id: &str,
) -> Result<Option<String>, AppError> {
    let options = SelectOptions::columns("id, job:jobs!inner ( company_id )")
        .filter(Filter::eq("id", application_id));
    let found: Vec<ApplicationOwner> = select_as(gateway, tables::APPLICATIONS, &options).await?;
    let owner = found
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
    Ok(owner.job.and_then(|job| job.company_id))
}

pub async fn check_existing_application(
    gateway: &dyn DataGateway,
    user_id: &str,
    job_id: &str,
) -> Result<ExistingApplication, AppError> {
    let options = SelectOptions::columns("id, status")
        .filter(Filter::eq("user_id", user_id))
        .filter(Filter::eq("job_id", job_id));
    let found: Vec<ApplicationSummary> = select_as(gateway, tables::APPLICATIONS, &options).await?;
    let application = found.into_iter().next();
    Ok(ExistingApplication {
        exists: application.is_some(),
        application,
    })
}
