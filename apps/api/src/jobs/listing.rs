//! Public job board: active listings, search and detail.

use tracing::debug;

use crate::errors::AppError;
use crate::gateway::{select_as, tables, DataGateway, Filter, OrderBy, SelectOptions};
use crate::jobs::filter::{filter_jobs, JobFilters};
use crate::models::job::{CompanyView, JobRow, JobStatus, JobView};

const DEFAULT_LOCATION: &str = "Remote";
const DEFAULT_CURRENCY: &str = "PLN";
const UNKNOWN_COMPANY: &str = "Unknown Company";

const LISTING_COLUMNS: &str = r#"
    id,
    title,
    location,
    posted_days_ago,
    employment_type,
    experience_level,
    salary_min,
    salary_max,
    currency,
    description,
    skills,
    company:companies ( name ),
    job_category_relations ( job_categories ( id, name ) )
"#;

const DETAIL_COLUMNS: &str = r#"
    id,
    title,
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
    company:companies ( id, name, description, logo_url ),
    job_category_relations ( job_categories ( id, name ) )
"#;

/// Flattens a joined job row into the board's view model.
pub fn to_job_view(row: JobRow) -> JobView {
    let categories: Vec<_> = row
        .job_category_relations
        .unwrap_or_default()
        .into_iter()
        .filter_map(|relation| relation.job_categories)
        .collect();
    let category = categories.first().map(|c| c.id.clone());

    JobView {
        id: row.id,
        title: row.title,
        company: row
            .company
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
        location: row
            .location
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
        posted_days: row.posted_days_ago,
        employment_type: row.employment_type,
        experience: row.experience_level,
        salary_min: row.salary_min.unwrap_or(0),
        salary_max: row.salary_max.unwrap_or(0),
        description: row.description.unwrap_or_default(),
        skills: row.skills.unwrap_or_default(),
        requirements: row.requirements.unwrap_or_default(),
        benefits: row.benefits.unwrap_or_default(),
        equity: row.equity.unwrap_or(0.0),
        remote_allowed: row.remote_allowed.unwrap_or(false),
        currency: row
            .currency
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        category,
        categories,
        company_details: row.company.map(|c| CompanyView {
            id: c.id,
            name: c.name,
            description: c.description,
            logo_url: c.logo_url,
        }),
    }
}

fn active_listing_query(columns: &str) -> SelectOptions {
    SelectOptions::columns(columns)
        .filter(Filter::eq("status", JobStatus::Active.as_str()))
        .order(OrderBy::desc("created_at"))
}

/// Lowers the filter fields the backend can evaluate into predicates.
fn server_side_filters(filters: &JobFilters) -> Vec<Filter> {
    let mut predicates = Vec::new();
    if !filters.location.trim().is_empty() {
        predicates.push(Filter::ilike("location", filters.location.trim()));
    }
    if let Some(level) = filters.experience {
        predicates.push(Filter::eq("experience_level", level.as_str()));
    }
    if !filters.types.is_empty() {
        predicates.push(Filter::one_of(
            "employment_type",
            filters.types.iter().map(|t| t.as_str()),
        ));
    }
    predicates
}

/// Fetches active jobs, newest first, optionally narrowed by location,
/// experience level and employment types on the backend.
pub async fn fetch_jobs(
    gateway: &dyn DataGateway,
    filters: Option<&JobFilters>,
) -> Result<Vec<JobView>, AppError> {
    let mut options = active_listing_query(LISTING_COLUMNS);
    if let Some(filters) = filters {
        options.filters.extend(server_side_filters(filters));
    }

    let rows: Vec<JobRow> = select_as(gateway, tables::JOBS, &options).await?;
    debug!("Fetched {} active jobs", rows.len());
    Ok(rows.into_iter().map(to_job_view).collect())
}

/// Active jobs whose title or description contains `term`, then narrowed
/// client-side by `filters`.
pub async fn search_jobs(
    gateway: &dyn DataGateway,
    term: &str,
    filters: Option<&JobFilters>,
) -> Result<Vec<JobView>, AppError> {
    let mut options = active_listing_query(LISTING_COLUMNS);
    let term = term.trim();
    if !term.is_empty() {
        options = options.filter(Filter::AnyOf(vec![
            Filter::ilike("title", term),
            Filter::ilike("description", term),
        ]));
    }

    let rows: Vec<JobRow> = select_as(gateway, tables::JOBS, &options).await?;
    let results: Vec<JobView> = rows.into_iter().map(to_job_view).collect();
    debug!("Search '{term}' matched {} jobs", results.len());

    Ok(match filters {
        Some(filters) => filter_jobs(&results, filters),
        None => results,
    })
}

pub async fn get_job_by_id(gateway: &dyn DataGateway, job_id: &str) -> Result<JobView, AppError> {
    let options = SelectOptions::columns(DETAIL_COLUMNS)
        .filter(Filter::eq("id", job_id))
        .filter(Filter::eq("status", JobStatus::Active.as_str()));

    let rows: Vec<JobRow> = select_as(gateway, tables::JOBS, &options).await?;
    rows.into_iter()
        .next()
        .map(to_job_view)
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::MemoryGateway;
    use crate::models::job::{EmploymentType, ExperienceLevel};
    use serde_json::json;

    fn seeded() -> MemoryGateway {
        let gateway = MemoryGateway::new();
        gateway.seed(
            tables::JOBS,
            vec![
                json!({
                    "id": "j1", "title": "Rust Engineer", "status": "active",
                    "location": "Berlin", "posted_days_ago": 2,
                    "employment_type": "Full-time", "experience_level": "Senior",
                    "salary_min": 90, "salary_max": 120, "currency": "EUR",
                    "description": "Build the matching engine", "skills": ["Rust", "SQL"],
                    "created_at": "2024-03-01T00:00:00Z",
                    "company": {"id": "c1", "name": "Acme", "logo_url": "https://acme/logo.png"},
                    "job_category_relations": [
                        {"job_categories": {"id": "backend", "name": "Backend"}},
                        {"job_categories": {"id": "infra", "name": "Infrastructure"}}
                    ]
                }),
                json!({
                    "id": "j2", "title": "Vue Developer", "status": "active",
                    "employment_type": "Contract", "experience_level": "Mid",
                    "created_at": "2024-02-01T00:00:00Z"
                }),
                json!({
                    "id": "j3", "title": "Old Rust Role", "status": "closed",
                    "employment_type": "Full-time", "experience_level": "Senior",
                    "created_at": "2024-01-01T00:00:00Z"
                }),
            ],
        );
        gateway
    }

    #[tokio::test]
    async fn test_fetch_jobs_returns_active_newest_first() {
        let gateway = seeded();
        let jobs = fetch_jobs(&gateway, None).await.unwrap();
        let ids: Vec<_> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["j1", "j2"]);
    }

    #[tokio::test]
    async fn test_transform_defaults_and_primary_category() {
        let gateway = seeded();
        let jobs = fetch_jobs(&gateway, None).await.unwrap();

        let rust = &jobs[0];
        assert_eq!(rust.company, "Acme");
        assert_eq!(rust.category.as_deref(), Some("backend"));
        assert_eq!(rust.categories.len(), 2);
        assert_eq!(rust.currency, "EUR");

        let vue = &jobs[1];
        assert_eq!(vue.location, "Remote");
        assert_eq!(vue.company, "Unknown Company");
        assert_eq!(vue.salary_min, 0);
        assert_eq!(vue.salary_max, 0);
        assert_eq!(vue.currency, "PLN");
        assert!(vue.category.is_none());
        assert!(vue.skills.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_jobs_lowers_filters_to_predicates() {
        let gateway = seeded();
        let filters = JobFilters {
            location: "berl".to_string(),
            experience: Some(ExperienceLevel::Senior),
            types: vec![EmploymentType::FullTime],
            ..JobFilters::default()
        };
        let jobs = fetch_jobs(&gateway, Some(&filters)).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "j1");

        let (_, options) = gateway.last_select().unwrap();
        assert!(options.filters.contains(&Filter::ilike("location", "berl")));
        assert!(options
            .filters
            .contains(&Filter::one_of("employment_type", ["Full-time"])));
    }

    #[tokio::test]
    async fn test_search_matches_title_or_description() {
        let gateway = seeded();
        let by_description = search_jobs(&gateway, "matching", None).await.unwrap();
        assert_eq!(by_description.len(), 1);
        assert_eq!(by_description[0].id, "j1");

        let narrowed = search_jobs(
            &gateway,
            "rust",
            Some(&JobFilters {
                skills: "go".to_string(),
                ..JobFilters::default()
            }),
        )
        .await
        .unwrap();
        assert!(narrowed.is_empty());
    }

    #[tokio::test]
    async fn test_get_job_by_id_only_sees_active_jobs() {
        let gateway = seeded();
        assert_eq!(get_job_by_id(&gateway, "j1").await.unwrap().title, "Rust Engineer");
        assert!(matches!(
            get_job_by_id(&gateway, "j3").await,
            Err(AppError::NotFound(_))
        ));
    }
}
