//! Field mapping service functions.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

use super::models::{validate_columns, ColumnMappings, FieldMapping};
use super::queries;
use super::status::{MappingError, MappingStatus};

async fn load(pool: &PgPool, id: Uuid) -> Result<FieldMapping, AppError> {
    let row = queries::find_mapping(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Field mapping {}", id)))?;
    Ok(FieldMapping::try_from(row)?)
}

/// Fetch one mapping
pub async fn get_mapping(pool: &PgPool, id: Uuid) -> Result<FieldMapping, AppError> {
    load(pool, id).await
}

/// List a vendor's mappings
pub async fn list_mappings(pool: &PgPool, vendor_id: Uuid) -> Result<Vec<FieldMapping>, AppError> {
    queries::list_vendor_mappings(pool, vendor_id)
        .await?
        .into_iter()
        .map(|row| FieldMapping::try_from(row).map_err(AppError::from))
        .collect()
}

/// Create a new draft mapping
pub async fn create_mapping(
    pool: &PgPool,
    vendor_id: Uuid,
    name: &str,
    columns: &ColumnMappings,
) -> Result<FieldMapping, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be blank".to_string()));
    }
    validate_columns(columns).map_err(AppError::BadRequest)?;

    let row = queries::insert_mapping(pool, vendor_id, name, columns).await?;
    let mapping = FieldMapping::try_from(row)?;
    tracing::info!("Created draft field mapping {} for vendor {}", mapping.id, vendor_id);

    Ok(mapping)
}

/// Replace the columns of a draft mapping
pub async fn update_columns(
    pool: &PgPool,
    id: Uuid,
    columns: &ColumnMappings,
) -> Result<FieldMapping, AppError> {
    validate_columns(columns).map_err(AppError::BadRequest)?;

    let current = load(pool, id).await?;
    if !current.status.is_editable() {
        return Err(MappingError::NotEditable(current.status).into());
    }

    let row = queries::update_draft_columns(pool, id, columns)
        .await?
        .ok_or(MappingError::StatusChanged {
            expected: MappingStatus::Draft,
        })?;
    Ok(FieldMapping::try_from(row)?)
}

/// Move a mapping along its lifecycle
pub async fn transition_mapping(
    pool: &PgPool,
    id: Uuid,
    next: MappingStatus,
) -> Result<FieldMapping, AppError> {
    let current = load(pool, id).await?;
    current.status.transition(next)?;

    let row = queries::update_mapping_status(pool, id, current.status, next)
        .await?
        .ok_or(MappingError::StatusChanged {
            expected: current.status,
        })?;
    let mapping = FieldMapping::try_from(row)?;

    tracing::info!(
        "Field mapping {} moved from {} to {}",
        id,
        current.status,
        mapping.status
    );

    Ok(mapping)
}
