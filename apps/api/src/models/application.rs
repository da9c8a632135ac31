use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::job::JobRow;
use crate::models::profile::UserProfile;

/// Any status may be set from any other; there is no enforced workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Interview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Interview,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRow {
    pub id: String,
    pub user_id: String,
    pub job_id: String,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
    pub applied_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub job: Option<JobRow>,
    pub user: Option<UserProfile>,
}

impl ApplicationRow {
    pub fn company_id(&self) -> Option<&str> {
        self.job.as_ref().and_then(|job| job.company_id.as_deref())
    }
}

/// Fields an applicant supplies; status is always forced to pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApplication {
    pub user_id: String,
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
}

/// Result of the duplicate-application check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExistingApplication {
    pub exists: bool,
    pub application: Option<ApplicationSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSummary {
    pub id: String,
    pub status: ApplicationStatus,
}
