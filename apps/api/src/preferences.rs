//! Light/dark theme preference, persisted as a one-key JSON file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(default)]
    theme: Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThemeResponse {
    pub theme: Theme,
    pub is_dark_mode: bool,
}

impl From<Theme> for ThemeResponse {
    fn from(theme: Theme) -> Self {
        Self {
            theme,
            is_dark_mode: theme == Theme::Dark,
        }
    }
}

#[derive(Debug)]
pub struct ThemeStore {
    path: PathBuf,
    theme: Theme,
}

impl ThemeStore {
    /// Reads the stored preference. A missing or unreadable file means light.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let theme = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<PreferenceFile>(&raw) {
                Ok(file) => file.theme,
                Err(e) => {
                    warn!("Ignoring unreadable preferences at {}: {e}", path.display());
                    Theme::default()
                }
            },
            Err(_) => Theme::default(),
        };
        Self { path, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flips the theme and writes it through.
    pub async fn toggle(&mut self) -> anyhow::Result<Theme> {
        let next = self.theme.toggled();
        let raw = serde_json::to_string_pretty(&PreferenceFile { theme: next })?;
        tokio::fs::write(&self.path, raw)
            .await
            .with_context(|| format!("writing preferences to {}", self.path.display()))?;
        self.theme = next;
        info!("Theme switched to {next:?}");
        Ok(next)
    }
}

/// GET /api/v1/preferences/theme
pub async fn handle_get_theme(State(state): State<AppState>) -> Json<ThemeResponse> {
    let store = state.theme.lock().await;
    Json(store.theme().into())
}

/// POST /api/v1/preferences/theme/toggle
pub async fn handle_toggle_theme(
    State(state): State<AppState>,
) -> Result<Json<ThemeResponse>, AppError> {
    let mut store = state.theme.lock().await;
    let theme = store.toggle().await?;
    Ok(Json(theme.into()))
}
