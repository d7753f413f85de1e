//! Database queries for pricing rules and vendor price figures.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

use super::models::{PricingRuleRow, VendorPrice};
use super::rules::{PricingRuleSettings, RuleScope};

/// Get the stored rule for a scope
pub async fn find_pricing_rule(
    pool: &PgPool,
    scope: &RuleScope,
) -> Result<Option<PricingRuleRow>, AppError> {
    let row = sqlx::query_as::<_, PricingRuleRow>(
        r#"
        SELECT
            scope_type, scope_id, primary_strategy,
            markup_percentage, margin_percentage, premium_amount, discount_percentage,
            rounding_rule, fallback_strategy, fallback_markup_percentage,
            use_cross_vendor_fallback, updated_at
        FROM pricing_rules
        WHERE scope_type = $1
          AND scope_id = $2
        "#,
    )
    .bind(scope.scope_type())
    .bind(scope.scope_id())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Insert or replace the rule for a scope
pub async fn upsert_pricing_rule(
    pool: &PgPool,
    scope: &RuleScope,
    settings: &PricingRuleSettings,
) -> Result<PricingRuleRow, AppError> {
    let row = sqlx::query_as::<_, PricingRuleRow>(
        r#"
        INSERT INTO pricing_rules (
            scope_type, scope_id, primary_strategy,
            markup_percentage, margin_percentage, premium_amount, discount_percentage,
            rounding_rule, fallback_strategy, fallback_markup_percentage,
            use_cross_vendor_fallback, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())
        ON CONFLICT (scope_type, scope_id) DO UPDATE SET
            primary_strategy = EXCLUDED.primary_strategy,
            markup_percentage = EXCLUDED.markup_percentage,
            margin_percentage = EXCLUDED.margin_percentage,
            premium_amount = EXCLUDED.premium_amount,
            discount_percentage = EXCLUDED.discount_percentage,
            rounding_rule = EXCLUDED.rounding_rule,
            fallback_strategy = EXCLUDED.fallback_strategy,
            fallback_markup_percentage = EXCLUDED.fallback_markup_percentage,
            use_cross_vendor_fallback = EXCLUDED.use_cross_vendor_fallback,
            updated_at = NOW()
        RETURNING
            scope_type, scope_id, primary_strategy,
            markup_percentage, margin_percentage, premium_amount, discount_percentage,
            rounding_rule, fallback_strategy, fallback_markup_percentage,
            use_cross_vendor_fallback, updated_at
        "#,
    )
    .bind(scope.scope_type())
    .bind(scope.scope_id())
    .bind(settings.primary_strategy.as_str())
    .bind(settings.markup_percentage)
    .bind(settings.margin_percentage)
    .bind(settings.premium_amount)
    .bind(settings.discount_percentage)
    .bind(settings.rounding_rule.as_str())
    .bind(settings.fallback_strategy.as_str())
    .bind(settings.fallback_markup_percentage)
    .bind(settings.use_cross_vendor_fallback)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Delete the rule for a scope. Returns whether a row existed.
pub async fn delete_pricing_rule(pool: &PgPool, scope: &RuleScope) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        DELETE FROM pricing_rules
        WHERE scope_type = $1
          AND scope_id = $2
        "#,
    )
    .bind(scope.scope_type())
    .bind(scope.scope_id())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// All vendor price figures for a product
pub async fn find_vendor_prices(
    pool: &PgPool,
    product_id: Uuid,
) -> Result<Vec<VendorPrice>, AppError> {
    let prices = sqlx::query_as::<_, VendorPrice>(
        r#"
        SELECT product_id, vendor_id, cost, map, msrp
        FROM vendor_product_prices
        WHERE product_id = $1
        ORDER BY vendor_id
        "#,
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(prices)
}

/// Vendor price figures for a batch of products
pub async fn find_vendor_prices_for_products(
    pool: &PgPool,
    product_ids: &[Uuid],
) -> Result<Vec<VendorPrice>, AppError> {
    let prices = sqlx::query_as::<_, VendorPrice>(
        r#"
        SELECT product_id, vendor_id, cost, map, msrp
        FROM vendor_product_prices
        WHERE product_id = ANY($1)
        ORDER BY product_id, vendor_id
        "#,
    )
    .bind(product_ids)
    .fetch_all(pool)
    .await?;

    Ok(prices)
}

/// Get every stored rule (for cache warming)
pub async fn list_pricing_rules(pool: &PgPool) -> Result<Vec<PricingRuleRow>, AppError> {
    let rows = sqlx::query_as::<_, PricingRuleRow>(
        r#"
        SELECT
            scope_type, scope_id, primary_strategy,
            markup_percentage, margin_percentage, premium_amount, discount_percentage,
            rounding_rule, fallback_strategy, fallback_markup_percentage,
            use_cross_vendor_fallback, updated_at
        FROM pricing_rules
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
