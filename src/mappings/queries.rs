//! Database queries for vendor field mappings.

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

use super::models::{ColumnMappings, FieldMappingRow};
use super::status::MappingStatus;

/// Create a mapping in draft status
pub async fn insert_mapping(
    pool: &PgPool,
    vendor_id: Uuid,
    name: &str,
    columns: &ColumnMappings,
) -> Result<FieldMappingRow, AppError> {
    let row = sqlx::query_as::<_, FieldMappingRow>(
        r#"
        INSERT INTO vendor_field_mappings (
            id, vendor_id, name, status, column_mappings, created_at, updated_at
        )
        VALUES ($1, $2, $3, 'draft', $4, NOW(), NOW())
        RETURNING
            id, vendor_id, name, status, column_mappings,
            created_at, updated_at, approved_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(vendor_id)
    .bind(name)
    .bind(Json(columns))
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Get a mapping by id
pub async fn find_mapping(pool: &PgPool, id: Uuid) -> Result<Option<FieldMappingRow>, AppError> {
    let row = sqlx::query_as::<_, FieldMappingRow>(
        r#"
        SELECT
            id, vendor_id, name, status, column_mappings,
            created_at, updated_at, approved_at
        FROM vendor_field_mappings
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// All mappings of a vendor, newest first
pub async fn list_vendor_mappings(
    pool: &PgPool,
    vendor_id: Uuid,
) -> Result<Vec<FieldMappingRow>, AppError> {
    let rows = sqlx::query_as::<_, FieldMappingRow>(
        r#"
        SELECT
            id, vendor_id, name, status, column_mappings,
            created_at, updated_at, approved_at
        FROM vendor_field_mappings
        WHERE vendor_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(vendor_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Move a mapping to `next` if it is still in `expected`.
/// Returns `None` when the status changed underneath.
pub async fn update_mapping_status(
    pool: &PgPool,
    id: Uuid,
    expected: MappingStatus,
    next: MappingStatus,
) -> Result<Option<FieldMappingRow>, AppError> {
    let row = sqlx::query_as::<_, FieldMappingRow>(
        r#"
        UPDATE vendor_field_mappings
        SET status = $3,
            approved_at = CASE WHEN $3 = 'approved' THEN NOW() ELSE approved_at END,
            updated_at = NOW()
        WHERE id = $1
          AND status = $2
        RETURNING
            id, vendor_id, name, status, column_mappings,
            created_at, updated_at, approved_at
        "#,
    )
    .bind(id)
    .bind(expected.as_str())
    .bind(next.as_str())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Replace the column mappings of a draft.
/// Returns `None` when the mapping is no longer a draft.
pub async fn update_draft_columns(
    pool: &PgPool,
    id: Uuid,
    columns: &ColumnMappings,
) -> Result<Option<FieldMappingRow>, AppError> {
    let row = sqlx::query_as::<_, FieldMappingRow>(
        r#"
        UPDATE vendor_field_mappings
        SET column_mappings = $2,
            updated_at = NOW()
        WHERE id = $1
          AND status = 'draft'
        RETURNING
            id, vendor_id, name, status, column_mappings,
            created_at, updated_at, approved_at
        "#,
    )
    .bind(id)
    .bind(Json(columns))
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
