//! Database models for pricing queries.
//!
//! These models use sqlx's FromRow derive for direct database deserialization.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use super::calculators::ProductPricePoint;
use super::rules::{ParseRuleError, PricingRuleSettings};

/// Stored rule from pricing_rules, keyed by (scope_type, scope_id)
#[derive(Debug, Clone, FromRow)]
pub struct PricingRuleRow {
    pub scope_type: String,
    pub scope_id: Uuid,
    pub primary_strategy: String,
    pub markup_percentage: Option<Decimal>,
    pub margin_percentage: Option<Decimal>,
    pub premium_amount: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub rounding_rule: String,
    pub fallback_strategy: String,
    pub fallback_markup_percentage: Option<Decimal>,
    pub use_cross_vendor_fallback: bool,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PricingRuleRow> for PricingRuleSettings {
    type Error = ParseRuleError;

    fn try_from(row: PricingRuleRow) -> Result<Self, Self::Error> {
        Ok(PricingRuleSettings {
            primary_strategy: row.primary_strategy.parse()?,
            markup_percentage: row.markup_percentage,
            margin_percentage: row.margin_percentage,
            premium_amount: row.premium_amount,
            discount_percentage: row.discount_percentage,
            rounding_rule: row.rounding_rule.parse()?,
            fallback_strategy: row.fallback_strategy.parse()?,
            fallback_markup_percentage: row.fallback_markup_percentage,
            use_cross_vendor_fallback: row.use_cross_vendor_fallback,
        })
    }
}

/// Vendor price figures from vendor_product_prices
#[derive(Debug, Clone, FromRow)]
pub struct VendorPrice {
    pub product_id: Uuid,
    pub vendor_id: Uuid,
    pub cost: Option<Decimal>,
    pub map: Option<Decimal>,
    pub msrp: Option<Decimal>,
}

impl VendorPrice {
    pub fn price_point(&self) -> ProductPricePoint {
        ProductPricePoint {
            cost: self.cost,
            map: self.map,
            msrp: self.msrp,
        }
    }
}
