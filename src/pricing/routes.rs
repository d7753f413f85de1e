//! Pricing route handlers

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::AppState;

use super::calculators::resolve_price;
use super::requests::{BatchPriceRequest, ProductPriceRequest, ResolvePriceRequest};
use super::responses::{
    BatchPriceEntry, BatchPriceResponse, PricingRuleResponse, ProductPriceResponse,
    ResolvedPriceResponse,
};
use super::rules::{PricingRuleSettings, RuleScope};
use super::services;

/// Pricing API routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pricing/resolve", post(resolve))
        .route(
            "/api/pricing/rules/:scope_type/:scope_id",
            get(get_rule).put(put_rule).delete(delete_rule),
        )
        .route("/api/pricing/products/price", post(price_batch))
        .route("/api/pricing/products/:product_id/price", post(price_product))
}

fn parse_scope(scope_type: &str, scope_id: Uuid) -> Result<RuleScope> {
    RuleScope::parse(scope_type, scope_id).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Resolve a price from caller-supplied rule and figures. No database access.
async fn resolve(Json(req): Json<ResolvePriceRequest>) -> Result<Json<ResolvedPriceResponse>> {
    let rule = req.rule.to_rule()?;
    let price = resolve_price(&rule, &req.selected, &req.siblings)?;
    Ok(Json(ResolvedPriceResponse::from(&price)))
}

async fn get_rule(
    State(state): State<AppState>,
    Path((scope_type, scope_id)): Path<(String, Uuid)>,
) -> Result<Json<PricingRuleResponse>> {
    let scope = parse_scope(&scope_type, scope_id)?;
    let stored = services::get_rule(&state.db, scope).await?;
    Ok(Json(stored.into()))
}

async fn put_rule(
    State(state): State<AppState>,
    Path((scope_type, scope_id)): Path<(String, Uuid)>,
    Json(settings): Json<PricingRuleSettings>,
) -> Result<Json<PricingRuleResponse>> {
    let scope = parse_scope(&scope_type, scope_id)?;
    let stored = services::save_rule(&state.db, &state.cache, scope, &settings).await?;
    Ok(Json(stored.into()))
}

async fn delete_rule(
    State(state): State<AppState>,
    Path((scope_type, scope_id)): Path<(String, Uuid)>,
) -> Result<Json<PricingRuleResponse>> {
    let scope = parse_scope(&scope_type, scope_id)?;
    let stored = services::reset_rule(&state.db, &state.cache, scope).await?;
    Ok(Json(stored.into()))
}

async fn price_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(req): Json<ProductPriceRequest>,
) -> Result<Json<ProductPriceResponse>> {
    let result = services::price_product(
        &state.db,
        &state.cache,
        product_id,
        req.vendor_id,
        req.organization_id,
        req.subscription_id,
    )
    .await?;
    Ok(Json(result.into()))
}

async fn price_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchPriceRequest>,
) -> Result<Json<BatchPriceResponse>> {
    if req.items.is_empty() {
        return Err(AppError::BadRequest("items must not be empty".to_string()));
    }

    let items: Vec<(Uuid, Uuid)> = req
        .items
        .iter()
        .map(|item| (item.product_id, item.vendor_id))
        .collect();
    let (effective, outcomes) = services::price_products(
        &state.db,
        &state.cache,
        &items,
        req.organization_id,
        req.subscription_id,
    )
    .await?;

    let results: Vec<BatchPriceEntry> = outcomes.iter().map(BatchPriceEntry::from).collect();
    let failed = results.iter().filter(|entry| entry.error.is_some()).count();

    Ok(Json(BatchPriceResponse {
        rule_source: effective.source.map(|scope| scope.to_string()),
        priced: results.len() - failed,
        failed,
        results,
    }))
}
