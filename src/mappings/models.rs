//! Database models for vendor field mappings.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{MappingError, MappingStatus};

/// CSV column name -> product field name
pub type ColumnMappings = BTreeMap<String, String>;

/// Row from vendor_field_mappings
#[derive(Debug, Clone, FromRow)]
pub struct FieldMappingRow {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub status: String,
    pub column_mappings: Json<ColumnMappings>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

/// A vendor field mapping contract
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub status: MappingStatus,
    pub column_mappings: ColumnMappings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl TryFrom<FieldMappingRow> for FieldMapping {
    type Error = MappingError;

    fn try_from(row: FieldMappingRow) -> Result<Self, Self::Error> {
        Ok(FieldMapping {
            id: row.id,
            vendor_id: row.vendor_id,
            name: row.name,
            status: row.status.parse()?,
            column_mappings: row.column_mappings.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
            approved_at: row.approved_at,
        })
    }
}

/// Check a column mapping set before storing it.
pub fn validate_columns(columns: &ColumnMappings) -> Result<(), String> {
    if columns.is_empty() {
        return Err("at least one column mapping is required".to_string());
    }
    for (column, field) in columns {
        if column.trim().is_empty() {
            return Err("column names must not be blank".to_string());
        }
        if field.trim().is_empty() {
            return Err(format!("column '{}' has no target field", column));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(pairs: &[(&str, &str)]) -> ColumnMappings {
        pairs
            .iter()
            .map(|(c, f)| (c.to_string(), f.to_string()))
            .collect()
    }

    #[test]
    fn test_row_to_mapping() {
        let now = Utc::now();
        let row = FieldMappingRow {
            id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            name: "Acme nightly feed".to_string(),
            status: "approved".to_string(),
            column_mappings: Json(columns(&[("SKU", "sku"), ("Dealer Cost", "cost")])),
            created_at: now,
            updated_at: now,
            approved_at: Some(now),
        };

        let mapping = FieldMapping::try_from(row).unwrap();
        assert_eq!(mapping.status, MappingStatus::Approved);
        assert_eq!(mapping.column_mappings.get("Dealer Cost").map(String::as_str), Some("cost"));
    }

    #[test]
    fn test_validate_columns() {
        assert!(validate_columns(&columns(&[("SKU", "sku")])).is_ok());
        assert!(validate_columns(&ColumnMappings::new()).is_err());
        assert!(validate_columns(&columns(&[(" ", "sku")])).is_err());
        assert_eq!(
            validate_columns(&columns(&[("MAP", "")])).unwrap_err(),
            "column 'MAP' has no target field"
        );
    }
}
