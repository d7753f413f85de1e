//! Field mapping route handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::AppState;

use super::models::{ColumnMappings, FieldMapping};
use super::services;
use super::status::MappingStatus;

/// Request to create a draft mapping
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMappingRequest {
    pub name: String,
    pub column_mappings: ColumnMappings,
}

/// Request to replace a draft's columns
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateColumnsRequest {
    pub column_mappings: ColumnMappings,
}

/// Request to change a mapping's status
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: MappingStatus,
}

/// Field mapping API routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/vendors/:vendor_id/mappings",
            get(list_mappings).post(create_mapping),
        )
        .route("/api/mappings/:id", get(get_mapping))
        .route("/api/mappings/:id/columns", put(update_columns))
        .route("/api/mappings/:id/status", post(transition))
}

async fn list_mappings(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
) -> Result<Json<Vec<FieldMapping>>> {
    Ok(Json(services::list_mappings(&state.db, vendor_id).await?))
}

async fn create_mapping(
    State(state): State<AppState>,
    Path(vendor_id): Path<Uuid>,
    Json(req): Json<CreateMappingRequest>,
) -> Result<(StatusCode, Json<FieldMapping>)> {
    let mapping =
        services::create_mapping(&state.db, vendor_id, &req.name, &req.column_mappings).await?;
    Ok((StatusCode::CREATED, Json(mapping)))
}

async fn get_mapping(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FieldMapping>> {
    Ok(Json(services::get_mapping(&state.db, id).await?))
}

async fn update_columns(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateColumnsRequest>,
) -> Result<Json<FieldMapping>> {
    Ok(Json(
        services::update_columns(&state.db, id, &req.column_mappings).await?,
    ))
}

async fn transition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<FieldMapping>> {
    Ok(Json(
        services::transition_mapping(&state.db, id, req.status).await?,
    ))
}
