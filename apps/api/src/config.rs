use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::error;

const DEFAULT_PREFERENCES_PATH: &str = ".jobboard-preferences.json";

/// Application configuration loaded from environment variables.
///
/// The backend URL and public key are reported but not enforced: a missing
/// value is logged and the service still starts, failing its remote calls
/// with `NotConfigured` instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub preferences_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            supabase_url: optional_env("SUPABASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            supabase_anon_key: optional_env("SUPABASE_ANON_KEY"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            preferences_path: std::env::var("THEME_PREFERENCES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_PREFERENCES_PATH)),
        })
    }

    /// Logs an error for each missing backend variable. Called once the
    /// subscriber is installed so the report is not lost.
    pub fn report_missing(&self) {
        if self.supabase_url.is_none() || self.supabase_anon_key.is_none() {
            error!("Missing backend configuration. Please check your environment variables.");
            error!("Required variables: SUPABASE_URL, SUPABASE_ANON_KEY");
        }
    }

    pub fn backend_configured(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_anon_key.is_some()
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
