//! Request DTOs for pricing API endpoints.

use serde::Deserialize;
use uuid::Uuid;

use super::calculators::ProductPricePoint;
use super::rules::PricingRuleSettings;

/// Request to resolve a price from figures supplied by the caller
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvePriceRequest {
    #[serde(default)]
    pub rule: PricingRuleSettings,
    pub selected: ProductPricePoint,
    /// Other vendors carrying the product (for cross-vendor fallback)
    #[serde(default)]
    pub siblings: Vec<ProductPricePoint>,
}

/// Request to price a stored product for one vendor
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPriceRequest {
    pub vendor_id: Uuid,
    pub organization_id: Uuid,
    #[serde(default)]
    pub subscription_id: Option<Uuid>,
}

/// Request to price a batch of stored products
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPriceRequest {
    pub organization_id: Uuid,
    #[serde(default)]
    pub subscription_id: Option<Uuid>,
    pub items: Vec<BatchPriceItem>,
}

/// A product/vendor pair in a batch request
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPriceItem {
    pub product_id: Uuid,
    pub vendor_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::rules::StrategyKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_resolve_request_parses() {
        let req: ResolvePriceRequest = serde_json::from_value(serde_json::json!({
            "rule": { "primaryStrategy": "cost_markup", "markupPercentage": 25 },
            "selected": { "cost": "10.00" },
            "siblings": [{ "map": 22 }, { "map": "24", "msrp": null }]
        }))
        .unwrap();

        assert_eq!(req.rule.primary_strategy, StrategyKind::CostMarkup);
        assert_eq!(req.selected.cost, Some(dec!(10.00)));
        assert_eq!(req.selected.map, None);
        assert_eq!(req.siblings.len(), 2);
        assert_eq!(req.siblings[1].map, Some(dec!(24)));
    }

    #[test]
    fn test_resolve_request_defaults_rule() {
        let req: ResolvePriceRequest =
            serde_json::from_value(serde_json::json!({ "selected": { "msrp": 30 } })).unwrap();
        assert_eq!(req.rule.primary_strategy, StrategyKind::Msrp);
        assert!(req.siblings.is_empty());
    }
}
