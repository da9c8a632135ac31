//! User profiles: the 1:1 record behind each identity, carrying the
//! recruiter capability and company link.

pub mod handlers;

use tracing::info;

use crate::errors::AppError;
use crate::gateway::{insert_as, select_as, tables, update_as, DataGateway, Filter, SelectOptions};
use crate::models::profile::{NewUserProfile, ProfileChanges, UserProfile};

const PROFILE_COLUMNS: &str = r#"
    id,
    email,
    first_name,
    last_name,
    username,
    bio,
    avatar_url,
    location,
    website_url,
    linkedin_url,
    github_url,
    skills,
    experience_years,
    resume_url,
    is_recruiter,
    company_id,
    created_at,
    updated_at,
    company:companies ( id, handle, name, description, logo_url )
"#;

pub async fn fetch_user_profile(
    gateway: &dyn DataGateway,
    user_id: &str,
) -> Result<UserProfile, AppError> {
    let options = SelectOptions::columns(PROFILE_COLUMNS).filter(Filter::eq("id", user_id));
    let rows: Vec<UserProfile> = select_as(gateway, tables::USER_PROFILES, &options).await?;
    rows.into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Profile {user_id} not found")))
}

pub async fn update_user_profile(
    gateway: &dyn DataGateway,
    user_id: &str,
    changes: &ProfileChanges,
) -> Result<UserProfile, AppError> {
    let rows: Vec<UserProfile> = update_as(
        gateway,
        tables::USER_PROFILES,
        changes,
        &[Filter::eq("id", user_id)],
    )
    .await?;
    rows.into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Profile {user_id} not found")))
}

pub async fn create_user_profile(
    gateway: &dyn DataGateway,
    profile: &NewUserProfile,
) -> Result<UserProfile, AppError> {
    let rows: Vec<UserProfile> = insert_as(gateway, tables::USER_PROFILES, profile).await?;
    let created = rows
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Profile creation returned no row")))?;
    info!("Created profile for user {}", created.id);
    Ok(created)
}
