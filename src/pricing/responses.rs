//! Response DTOs for pricing API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ErrorResponse;

use super::calculators::ResolvedPrice;
use super::rules::{PricingRuleSettings, RoundingRule, StrategyKind};
use super::services::{BatchPriceOutcome, ProductPriceResult, StoredRule};

/// A resolved price
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPriceResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub unrounded_amount: Decimal,
    pub strategy: StrategyKind,
    pub used_fallback: bool,
    pub cross_vendor: bool,
    pub rounding_rule: RoundingRule,
}

impl From<&ResolvedPrice> for ResolvedPriceResponse {
    fn from(price: &ResolvedPrice) -> Self {
        Self {
            amount: price.amount,
            unrounded_amount: price.unrounded_amount,
            strategy: price.strategy,
            used_fallback: price.used_fallback,
            cross_vendor: price.cross_vendor,
            rounding_rule: price.rounding,
        }
    }
}

/// A pricing rule as stored for a scope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRuleResponse {
    pub scope_type: &'static str,
    pub scope_id: Uuid,
    pub is_default: bool,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub rule: PricingRuleSettings,
}

impl From<StoredRule> for PricingRuleResponse {
    fn from(stored: StoredRule) -> Self {
        Self {
            scope_type: stored.scope.scope_type(),
            scope_id: stored.scope.scope_id(),
            is_default: stored.is_default,
            updated_at: stored.updated_at,
            rule: stored.settings,
        }
    }
}

/// Price of a stored product
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPriceResponse {
    pub product_id: Uuid,
    pub vendor_id: Uuid,
    /// "scope_type:scope_id" of the rule used, absent when defaults applied
    pub rule_source: Option<String>,
    #[serde(flatten)]
    pub price: ResolvedPriceResponse,
}

impl From<ProductPriceResult> for ProductPriceResponse {
    fn from(result: ProductPriceResult) -> Self {
        Self {
            product_id: result.product_id,
            vendor_id: result.vendor_id,
            rule_source: result.rule_source.map(|scope| scope.to_string()),
            price: ResolvedPriceResponse::from(&result.price),
        }
    }
}

/// One entry of a batch response: either a price or an error
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPriceEntry {
    pub product_id: Uuid,
    pub vendor_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<ResolvedPriceResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

impl From<&BatchPriceOutcome> for BatchPriceEntry {
    fn from(outcome: &BatchPriceOutcome) -> Self {
        let (price, error) = match &outcome.result {
            Ok(price) => (Some(ResolvedPriceResponse::from(price)), None),
            Err(failure) => (
                None,
                Some(ErrorResponse {
                    error_type: failure.error_type().to_string(),
                    message: failure.to_string(),
                }),
            ),
        };
        Self {
            product_id: outcome.product_id,
            vendor_id: outcome.vendor_id,
            price,
            error,
        }
    }
}

/// Response for batch pricing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPriceResponse {
    pub rule_source: Option<String>,
    pub priced: usize,
    pub failed: usize,
    pub results: Vec<BatchPriceEntry>,
}
