//! Client-side narrowing and paging of an already fetched job list.
//!
//! Every clause is vacuously true when its filter field is empty, so
//! `JobFilters::default()` keeps every job. Filtering never reorders.

use serde::{Deserialize, Serialize};

use crate::models::job::{EmploymentType, ExperienceLevel, JobView};

pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobFilters {
    /// Case-insensitive substring of the title.
    pub keyword: String,
    /// Case-insensitive substring of the location.
    pub location: String,
    pub types: Vec<EmploymentType>,
    pub experience: Option<ExperienceLevel>,
    /// Maximum age in days.
    pub posted: Option<u32>,
    /// Comma-separated; every term must be among the job's skills.
    pub skills: String,
    pub salary_min: Option<u64>,
    pub salary_max: Option<u64>,
    /// Primary category id.
    pub category: Option<String>,
}

impl JobFilters {
    /// Lower-cased, trimmed, non-empty skill terms.
    pub fn skill_terms(&self) -> Vec<String> {
        self.skills
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Salary ranges match when they intersect; an unset bound is open.
fn salary_overlaps(job: &JobView, filters: &JobFilters) -> bool {
    let above_min = filters.salary_min.map_or(true, |min| job.salary_max >= min);
    let below_max = filters.salary_max.map_or(true, |max| job.salary_min <= max);
    above_min && below_max
}

fn has_all_skills(job: &JobView, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let owned: Vec<String> = job.skills.iter().map(|s| s.to_lowercase()).collect();
    terms.iter().all(|term| owned.contains(term))
}

pub fn matches(job: &JobView, filters: &JobFilters) -> bool {
    contains_ignore_case(&job.title, &filters.keyword)
        && contains_ignore_case(&job.location, &filters.location)
        && (filters.types.is_empty() || filters.types.contains(&job.employment_type))
        && filters.experience.map_or(true, |level| job.experience == level)
        && filters.posted.map_or(true, |days| job.posted_days <= days)
        && has_all_skills(job, &filters.skill_terms())
        && salary_overlaps(job, filters)
        && filters
            .category
            .as_deref()
            .map_or(true, |category| job.category.as_deref() == Some(category))
}

pub fn filter_jobs(jobs: &[JobView], filters: &JobFilters) -> Vec<JobView> {
    jobs.iter()
        .filter(|job| matches(job, filters))
        .cloned()
        .collect()
}

/// Returns the 1-based `page` of `items`. Page 0 and pages past the end are empty.
pub fn paginate<T>(items: &[T], page: usize) -> &[T] {
    if page == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(PAGE_SIZE).min(items.len());
    let end = start.saturating_add(PAGE_SIZE).min(items.len());
    &items[start..end]
}

pub fn total_pages<T>(items: &[T]) -> usize {
    items.len().div_ceil(PAGE_SIZE)
}
