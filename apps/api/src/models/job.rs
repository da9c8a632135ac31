use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::company::{CategoryRef, CompanyRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Internship,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "Full-time",
            EmploymentType::PartTime => "Part-time",
            EmploymentType::Contract => "Contract",
            EmploymentType::Internship => "Internship",
        }
    }
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmploymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            EmploymentType::FullTime,
            EmploymentType::PartTime,
            EmploymentType::Contract,
            EmploymentType::Internship,
        ]
        .into_iter()
        .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("Unknown employment type '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Junior,
    Mid,
    Senior,
    Lead,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "Junior",
            ExperienceLevel::Mid => "Mid",
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Lead => "Lead",
        }
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            ExperienceLevel::Junior,
            ExperienceLevel::Mid,
            ExperienceLevel::Senior,
            ExperienceLevel::Lead,
        ]
        .into_iter()
        .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("Unknown experience level '{s}'"))
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Active,
    Closed,
    Draft,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Closed => "closed",
            JobStatus::Draft => "draft",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRelation {
    pub job_categories: Option<CategoryRef>,
}

/// A job row as returned by the backend. Which columns are present depends
/// on the select shape, so most fields are optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRow {
    pub id: String,
    pub title: String,
    pub company_id: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub posted_days_ago: u32,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub salary_min: Option<u64>,
    pub salary_max: Option<u64>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub skills: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    pub equity: Option<f64>,
    pub remote_allowed: Option<bool>,
    pub status: Option<JobStatus>,
    pub views_count: Option<u64>,
    pub applications_count: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(alias = "companies")]
    pub company: Option<CompanyRow>,
    pub job_category_relations: Option<Vec<CategoryRelation>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyView {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

/// Flattened job shape served to the board UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub posted_days: u32,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    pub experience: ExperienceLevel,
    pub salary_min: u64,
    pub salary_max: u64,
    pub description: String,
    pub skills: Vec<String>,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
    pub equity: f64,
    pub remote_allowed: bool,
    pub currency: String,
    /// Primary category id.
    pub category: Option<String>,
    pub categories: Vec<CategoryRef>,
    pub company_details: Option<CompanyView>,
}

/// Recruiter-side job form. Status defaults to active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobForm {
    pub title: String,
    #[serde(default)]
    pub company_id: String,
    pub location: Option<String>,
    pub employment_type: EmploymentType,
    pub experience_level: ExperienceLevel,
    pub salary_min: Option<u64>,
    pub salary_max: Option<u64>,
    pub currency: String,
    pub description: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub equity: Option<f64>,
    #[serde(default)]
    pub remote_allowed: bool,
    #[serde(default)]
    pub status: JobStatus,
}

/// Partial job update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<EmploymentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefits: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_allowed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
}
