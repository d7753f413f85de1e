//! Pricing service functions with database access.
//!
//! These functions load rules (through the cache) and vendor price figures,
//! then hand them to the pure resolver in [`super::calculators`].

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::AppCache;
use crate::error::AppError;

use super::calculators::{resolve_price, ProductPricePoint, ResolvedPrice};
use super::error::PricingError;
use super::models::VendorPrice;
use super::queries;
use super::rules::{PricingRule, PricingRuleSettings, RuleScope};

/// Rule as stored for one scope
#[derive(Debug, Clone)]
pub struct StoredRule {
    pub scope: RuleScope,
    pub settings: PricingRuleSettings,
    /// No row exists; `settings` are the defaults
    pub is_default: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Rule that applies to a pricing request, and where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveRule {
    pub rule: PricingRule,
    /// `None` when no scope has a stored rule and defaults apply
    pub source: Option<RuleScope>,
}

/// Result of pricing one product for one vendor
#[derive(Debug, Clone)]
pub struct ProductPriceResult {
    pub product_id: Uuid,
    pub vendor_id: Uuid,
    pub price: ResolvedPrice,
    pub rule_source: Option<RuleScope>,
}

/// Why a product in a batch got no price
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingFailure {
    #[error("vendor {0} has no price figures for this product")]
    VendorNotCarried(Uuid),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl PricingFailure {
    pub fn error_type(&self) -> &'static str {
        match self {
            PricingFailure::VendorNotCarried(_) => "vendor_not_carried",
            PricingFailure::Pricing(e) => e.error_type(),
        }
    }
}

/// One entry of a batch pricing run
#[derive(Debug, Clone)]
pub struct BatchPriceOutcome {
    pub product_id: Uuid,
    pub vendor_id: Uuid,
    pub result: Result<ResolvedPrice, PricingFailure>,
}

/// Split a product's vendor prices into the selected vendor and its siblings.
pub fn split_vendor_prices(
    prices: &[VendorPrice],
    vendor_id: Uuid,
) -> Option<(ProductPricePoint, Vec<ProductPricePoint>)> {
    let selected = prices.iter().find(|p| p.vendor_id == vendor_id)?.price_point();
    let siblings = prices
        .iter()
        .filter(|p| p.vendor_id != vendor_id)
        .map(VendorPrice::price_point)
        .collect();
    Some((selected, siblings))
}

/// Price one product/vendor pair from already loaded figures.
pub fn price_from_figures(
    rule: &PricingRule,
    prices: &[VendorPrice],
    vendor_id: Uuid,
) -> Result<ResolvedPrice, PricingFailure> {
    let (selected, siblings) =
        split_vendor_prices(prices, vendor_id).ok_or(PricingFailure::VendorNotCarried(vendor_id))?;
    Ok(resolve_price(rule, &selected, &siblings)?)
}

/// Stored rule of one scope, through the cache.
pub async fn load_rule(
    pool: &PgPool,
    cache: &AppCache,
    scope: &RuleScope,
) -> Result<Option<PricingRule>, AppError> {
    if let Some(cached) = cache.rules.get(scope).await {
        tracing::debug!("Cache HIT for pricing rule: {}", scope);
        return Ok(cached);
    }

    tracing::debug!("Cache MISS for pricing rule: {}", scope);
    let rule = match queries::find_pricing_rule(pool, scope).await? {
        Some(row) => Some(PricingRuleSettings::try_from(row)?.to_rule()?),
        None => None,
    };
    cache.rules.insert(*scope, rule).await;

    Ok(rule)
}

/// Resolve which rule applies: subscription, then organization, then defaults.
pub async fn effective_rule(
    pool: &PgPool,
    cache: &AppCache,
    organization_id: Uuid,
    subscription_id: Option<Uuid>,
) -> Result<EffectiveRule, AppError> {
    let scopes = subscription_id
        .map(RuleScope::Subscription)
        .into_iter()
        .chain(std::iter::once(RuleScope::Organization(organization_id)));

    for scope in scopes {
        if let Some(rule) = load_rule(pool, cache, &scope).await? {
            return Ok(EffectiveRule {
                rule,
                source: Some(scope),
            });
        }
    }

    Ok(EffectiveRule {
        rule: PricingRule::default(),
        source: None,
    })
}

/// Read the rule stored for a scope, or defaults when none is stored.
pub async fn get_rule(pool: &PgPool, scope: RuleScope) -> Result<StoredRule, AppError> {
    match queries::find_pricing_rule(pool, &scope).await? {
        Some(row) => {
            let updated_at = row.updated_at;
            Ok(StoredRule {
                scope,
                settings: PricingRuleSettings::try_from(row)?,
                is_default: false,
                updated_at: Some(updated_at),
            })
        }
        None => Ok(StoredRule {
            scope,
            settings: PricingRuleSettings::default(),
            is_default: true,
            updated_at: None,
        }),
    }
}

/// Validate and store a rule. Parameters the selected strategies ignore are
/// cleared before saving.
pub async fn save_rule(
    pool: &PgPool,
    cache: &AppCache,
    scope: RuleScope,
    settings: &PricingRuleSettings,
) -> Result<StoredRule, AppError> {
    let normalized = settings.normalized()?;
    let rule = normalized.to_rule()?;
    let row = queries::upsert_pricing_rule(pool, &scope, &normalized).await?;
    cache.store_rule(scope, Some(rule)).await;

    tracing::info!(
        "Pricing rule for {} set to {} (fallback {}, rounding {})",
        scope,
        normalized.primary_strategy,
        normalized.fallback_strategy.as_str(),
        normalized.rounding_rule
    );

    Ok(StoredRule {
        scope,
        settings: normalized,
        is_default: false,
        updated_at: Some(row.updated_at),
    })
}

/// Reset a scope to defaults by removing its stored rule.
pub async fn reset_rule(
    pool: &PgPool,
    cache: &AppCache,
    scope: RuleScope,
) -> Result<StoredRule, AppError> {
    let existed = queries::delete_pricing_rule(pool, &scope).await?;
    cache.store_rule(scope, None).await;
    if existed {
        tracing::info!("Pricing rule for {} reset to defaults", scope);
    }

    Ok(StoredRule {
        scope,
        settings: PricingRuleSettings::default(),
        is_default: true,
        updated_at: None,
    })
}

/// Price one product for one vendor using stored figures and the effective rule.
pub async fn price_product(
    pool: &PgPool,
    cache: &AppCache,
    product_id: Uuid,
    vendor_id: Uuid,
    organization_id: Uuid,
    subscription_id: Option<Uuid>,
) -> Result<ProductPriceResult, AppError> {
    let effective = effective_rule(pool, cache, organization_id, subscription_id).await?;
    let prices = queries::find_vendor_prices(pool, product_id).await?;

    let price = match price_from_figures(&effective.rule, &prices, vendor_id) {
        Ok(price) => price,
        Err(PricingFailure::VendorNotCarried(_)) => {
            return Err(AppError::NotFound(format!(
                "Price figures for product {} from vendor {}",
                product_id, vendor_id
            )))
        }
        Err(PricingFailure::Pricing(e)) => return Err(e.into()),
    };

    Ok(ProductPriceResult {
        product_id,
        vendor_id,
        price,
        rule_source: effective.source,
    })
}

/// Price many product/vendor pairs. A product that cannot be priced is
/// reported in its own entry and does not fail the batch.
pub async fn price_products(
    pool: &PgPool,
    cache: &AppCache,
    items: &[(Uuid, Uuid)],
    organization_id: Uuid,
    subscription_id: Option<Uuid>,
) -> Result<(EffectiveRule, Vec<BatchPriceOutcome>), AppError> {
    let effective = effective_rule(pool, cache, organization_id, subscription_id).await?;

    let mut product_ids: Vec<Uuid> = items.iter().map(|(product_id, _)| *product_id).collect();
    product_ids.sort_unstable();
    product_ids.dedup();
    let prices = queries::find_vendor_prices_for_products(pool, &product_ids).await?;

    let outcomes = price_batch(&effective.rule, &prices, items);
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if failed > 0 {
        tracing::warn!("{} of {} products could not be priced", failed, outcomes.len());
    }

    Ok((effective, outcomes))
}

/// Batch pricing over figures already loaded for every product in `items`.
pub fn price_batch(
    rule: &PricingRule,
    prices: &[VendorPrice],
    items: &[(Uuid, Uuid)],
) -> Vec<BatchPriceOutcome> {
    items
        .iter()
        .map(|&(product_id, vendor_id)| {
            let product_prices: Vec<VendorPrice> = prices
                .iter()
                .filter(|p| p.product_id == product_id)
                .cloned()
                .collect();
            BatchPriceOutcome {
                product_id,
                vendor_id,
                result: price_from_figures(rule, &product_prices, vendor_id),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::calculators::PriceField;
    use crate::pricing::rules::{FallbackStrategy, Strategy, StrategyKind};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn vendor_price(
        product_id: Uuid,
        vendor_id: Uuid,
        cost: Option<Decimal>,
        map: Option<Decimal>,
    ) -> VendorPrice {
        VendorPrice {
            product_id,
            vendor_id,
            cost,
            map,
            msrp: None,
        }
    }

    #[test]
    fn test_split_vendor_prices() {
        let product = Uuid::new_v4();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let prices = vec![
            vendor_price(product, a, Some(dec!(5)), None),
            vendor_price(product, b, None, Some(dec!(12))),
            vendor_price(product, c, None, Some(dec!(14))),
        ];

        let (selected, siblings) = split_vendor_prices(&prices, a).unwrap();
        assert_eq!(selected.cost, Some(dec!(5)));
        assert_eq!(siblings.len(), 2);

        assert!(split_vendor_prices(&prices, Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_price_batch_reports_each_product() {
        let (p1, p2, p3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let (v1, v2) = (Uuid::new_v4(), Uuid::new_v4());
        let prices = vec![
            vendor_price(p1, v1, None, Some(dec!(20))),
            vendor_price(p2, v1, Some(dec!(10)), None),
            vendor_price(p2, v2, None, Some(dec!(30))),
        ];
        let rule = PricingRule {
            primary: Strategy::Map,
            fallback: FallbackStrategy::None,
            use_cross_vendor_fallback: true,
            ..PricingRule::default()
        };

        let outcomes = price_batch(&rule, &prices, &[(p1, v1), (p2, v1), (p3, v1)]);
        assert_eq!(outcomes.len(), 3);

        assert_eq!(outcomes[0].result.as_ref().unwrap().amount, dec!(20.00));

        let borrowed = outcomes[1].result.as_ref().unwrap();
        assert_eq!(borrowed.amount, dec!(30.00));
        assert!(borrowed.cross_vendor);

        assert_eq!(
            outcomes[2].result,
            Err(PricingFailure::VendorNotCarried(v1))
        );
    }

    #[test]
    fn test_price_from_figures_uses_only_that_product() {
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
        let (v1, v2) = (Uuid::new_v4(), Uuid::new_v4());
        // p2's MAP must not be borrowed when pricing p1
        let prices = vec![
            vendor_price(p1, v1, Some(dec!(10)), None),
            vendor_price(p2, v2, None, Some(dec!(99))),
        ];
        let rule = PricingRule {
            primary: Strategy::Map,
            fallback: FallbackStrategy::None,
            use_cross_vendor_fallback: true,
            ..PricingRule::default()
        };

        let outcomes = price_batch(&rule, &prices, &[(p1, v1)]);
        assert_eq!(
            outcomes[0].result,
            Err(PricingFailure::Pricing(PricingError::MissingRequiredInput {
                strategy: StrategyKind::Map,
                field: PriceField::Map,
            }))
        );
        assert_eq!(outcomes[0].result.as_ref().unwrap_err().error_type(), "missing_required_input");
    }
}
