use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A company as embedded in job and profile rows. Embeds select a subset of
/// columns, so everything except the name is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRow {
    pub id: Option<String>,
    pub handle: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub num_employees: Option<u32>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobCategory {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// `{id, name}` of a category reached through `job_category_relations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
}
