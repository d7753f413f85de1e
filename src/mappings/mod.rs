//! Vendor field mapping contracts.
//!
//! A mapping describes how a vendor's CSV columns map onto product fields.
//! This module stores mappings and enforces their status lifecycle; running
//! an import against a mapping happens elsewhere.

pub mod models;
pub mod queries;
pub mod routes;
pub mod services;
pub mod status;

pub use models::{ColumnMappings, FieldMapping};
pub use routes::router;
pub use status::{MappingError, MappingStatus};
