//! Caller-owned job state: the board's listings and a recruiter's postings.

use serde::Serialize;

use crate::errors::AppError;
use crate::gateway::DataGateway;
use crate::jobs::filter::{filter_jobs, paginate, total_pages, JobFilters};
use crate::jobs::listing::fetch_jobs;
use crate::jobs::management::{fetch_company_jobs, update_job_status};
use crate::models::job::{JobRow, JobStatus, JobView};
use crate::tracked::Tracked;

/// One page of a filtered listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobPage {
    pub jobs: Vec<JobView>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
}

impl JobPage {
    pub fn of(filtered: &[JobView], page: usize) -> Self {
        Self {
            jobs: paginate(filtered, page).to_vec(),
            page,
            total_pages: total_pages(filtered),
            total: filtered.len(),
        }
    }
}

#[derive(Debug)]
pub struct JobBoard {
    pub listings: Tracked<Vec<JobView>>,
    pub current_page: usize,
}

impl Default for JobBoard {
    fn default() -> Self {
        Self {
            listings: Tracked::default(),
            current_page: 1,
        }
    }
}

impl JobBoard {
    /// Replaces the held listings and rewinds to the first page.
    pub async fn fetch(
        &mut self,
        gateway: &dyn DataGateway,
        filters: Option<&JobFilters>,
    ) -> Result<&[JobView], AppError> {
        let jobs = self.listings.track(fetch_jobs(gateway, filters)).await?;
        self.listings.data = jobs;
        self.current_page = 1;
        Ok(&self.listings.data)
    }

    pub fn filtered(&self, filters: &JobFilters) -> Vec<JobView> {
        filter_jobs(&self.listings.data, filters)
    }

    pub fn current(&self, filters: &JobFilters) -> JobPage {
        JobPage::of(&self.filtered(filters), self.current_page)
    }
}

#[derive(Debug, Default)]
pub struct ManagedJobs {
    pub jobs: Tracked<Vec<JobRow>>,
}

impl ManagedJobs {
    pub async fn fetch(&mut self, gateway: &dyn DataGateway, company_id: &str) -> Result<(), AppError> {
        self.jobs.data = self
            .jobs
            .track(fetch_company_jobs(gateway, company_id))
            .await?;
        Ok(())
    }

    /// Updates the remote status and patches the held copy of the job.
    pub async fn set_status(
        &mut self,
        gateway: &dyn DataGateway,
        job_id: &str,
        status: JobStatus,
    ) -> Result<JobRow, AppError> {
        let updated = self
            .jobs
            .track(update_job_status(gateway, job_id, status))
            .await?;
        if let Some(held) = self.jobs.data.iter_mut().find(|job| job.id == updated.id) {
            *held = updated.clone();
        }
        Ok(updated)
    }

    pub fn clear(&mut self) {
        self.jobs = Tracked::default();
    }
}
