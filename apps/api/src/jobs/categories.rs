use crate::errors::AppError;
use crate::gateway::{select_as, tables, DataGateway, Filter, OrderBy, SelectOptions};
use crate::models::company::JobCategory;

const CATEGORY_COLUMNS: &str = "id, name, description, color";

/// All categories, alphabetical.
pub async fn fetch_categories(gateway: &dyn DataGateway) -> Result<Vec<JobCategory>, AppError> {
    let options = SelectOptions::columns(CATEGORY_COLUMNS).order(OrderBy::asc("name"));
    Ok(select_as(gateway, tables::JOB_CATEGORIES, &options).await?)
}

pub async fn get_category_by_id(
    gateway: &dyn DataGateway,
    category_id: &str,
) -> Result<JobCategory, AppError> {
    let options = SelectOptions::columns(CATEGORY_COLUMNS).filter(Filter::eq("id", category_id));
    let rows: Vec<JobCategory> = select_as(gateway, tables::JOB_CATEGORIES, &options).await?;
    rows.into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Category {category_id} not found")))
}
