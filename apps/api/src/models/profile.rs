use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::company::CompanyRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub website_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<u32>,
    pub resume_url: Option<String>,
    #[serde(default)]
    pub is_recruiter: bool,
    pub company_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(alias = "companies")]
    pub company: Option<CompanyRow>,
}

impl UserProfile {
    pub fn can_post_jobs(&self) -> bool {
        self.is_recruiter
    }
}

/// Row written when an identity signs up.
#[derive(Debug, Clone, Serialize)]
pub struct NewUserProfile {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub is_recruiter: bool,
}

/// Self-service profile edits. The recruiter flag and company link are
/// managed on the backend and cannot be changed here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
}
