//! Remote data gateway: the single point of entry for table access.
//!
//! Domain accessors build a [`SelectOptions`] (or a values object plus
//! [`Filter`]s) and hand it to a [`DataGateway`]. The production backend is
//! [`RestGateway`], which speaks the PostgREST dialect of the hosted database.
//! Filters are typed; no caller ever assembles operator strings.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

mod filter;
#[cfg(test)]
pub mod memory;
mod postgrest;

pub use filter::{Filter, OrderBy, SelectOptions};
pub use postgrest::RestGateway;

/// Remote table names.
pub mod tables {
    pub const JOBS: &str = "jobs";
    pub const APPLICATIONS: &str = "applications";
    pub const JOB_CATEGORIES: &str = "job_categories";
    pub const USER_PROFILES: &str = "user_profiles";
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        details: Option<String>,
        hint: Option<String>,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Refusing to {verb} '{table}' without a filter")]
    MissingFilter { verb: &'static str, table: String },

    #[error("Backend URL or API key is not configured")]
    NotConfigured,
}

/// Generic table operations against the remote backend.
///
/// Carried in `AppState` as `Arc<dyn DataGateway>`; per-request copies bound
/// to a user's access token come from [`DataGateway::with_access_token`].
#[async_trait]
pub trait DataGateway: Send + Sync {
    async fn select(&self, table: &str, options: &SelectOptions) -> Result<Vec<Value>, GatewayError>;

    /// Inserts one row (object) or many (array) and returns the stored rows.
    async fn insert(&self, table: &str, values: Value) -> Result<Vec<Value>, GatewayError>;

    /// Applies `values` to every row matching all `filters`; returns the updated rows.
    async fn update(
        &self,
        table: &str,
        values: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>, GatewayError>;

    /// Inserts or merges on primary key; returns the stored rows.
    async fn upsert(&self, table: &str, values: Value) -> Result<Vec<Value>, GatewayError>;

    /// Deletes every row matching all `filters`; returns the deleted rows.
    async fn remove(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, GatewayError>;

    /// Returns a gateway that authenticates as the holder of `access_token`.
    fn with_access_token(&self, access_token: &str) -> Box<dyn DataGateway>;
}

pub async fn select_as<T: DeserializeOwned>(
    gateway: &dyn DataGateway,
    table: &str,
    options: &SelectOptions,
) -> Result<Vec<T>, GatewayError> {
    let rows = gateway.select(table, options).await?;
    decode_rows(rows)
}

pub async fn insert_as<T: DeserializeOwned, V: Serialize + ?Sized>(
    gateway: &dyn DataGateway,
    table: &str,
    values: &V,
) -> Result<Vec<T>, GatewayError> {
    let rows = gateway.insert(table, serde_json::to_value(values)?).await?;
    decode_rows(rows)
}

pub async fn update_as<T: DeserializeOwned, V: Serialize + ?Sized>(
    gateway: &dyn DataGateway,
    table: &str,
    values: &V,
    filters: &[Filter],
) -> Result<Vec<T>, GatewayError> {
    let rows = gateway
        .update(table, serde_json::to_value(values)?, filters)
        .await?;
    decode_rows(rows)
}

pub async fn remove_as<T: DeserializeOwned>(
    gateway: &dyn DataGateway,
    table: &str,
    filters: &[Filter],
) -> Result<Vec<T>, GatewayError> {
    let rows = gateway.remove(table, filters).await?;
    decode_rows(rows)
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, GatewayError> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(GatewayError::Parse)
}
