//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no database access. Everything here is
//! safe to call concurrently for any number of products.

use std::fmt;

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::PricingError;
use super::rules::{PricingRule, RoundingDirection, RoundingRule, Strategy, StrategyKind};

/// Money is reported with two decimal places.
pub const MONEY_PLACES: u32 = 2;

/// Largest price the resolver will report. Keeps rounding arithmetic exact.
pub const MAX_PRICE: Decimal = dec!(1000000000000);

/// Round to specified decimal places, half-up away from zero.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use vendor_pricing::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(3));
/// assert_eq!(round_money(dec!(-2.5), 0), dec!(-3));
/// assert_eq!(round_money(dec!(1.235), 2), dec!(1.24));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Price figures one vendor publishes for a product. Any of them may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductPricePoint {
    pub cost: Option<Decimal>,
    pub map: Option<Decimal>,
    pub msrp: Option<Decimal>,
}

/// One of the figures in a [`ProductPricePoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Cost,
    Map,
    Msrp,
}

impl PriceField {
    pub fn read(&self, point: &ProductPricePoint) -> Option<Decimal> {
        match self {
            PriceField::Cost => point.cost,
            PriceField::Map => point.map,
            PriceField::Msrp => point.msrp,
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PriceField::Cost => "cost",
            PriceField::Map => "MAP",
            PriceField::Msrp => "MSRP",
        })
    }
}

/// Highest value of `field` across the other vendors carrying the product.
pub fn max_across_vendors(siblings: &[ProductPricePoint], field: PriceField) -> Option<Decimal> {
    siblings.iter().filter_map(|point| field.read(point)).max()
}

/// Check a strategy's parameter is in a usable range.
pub fn validate_strategy(strategy: &Strategy) -> Result<(), PricingError> {
    let hundred = Decimal::ONE_HUNDRED;
    let invalid = |parameter: &'static str, reason: &str| PricingError::InvalidParameter {
        parameter,
        reason: reason.to_string(),
    };

    match *strategy {
        Strategy::Msrp | Strategy::Map => Ok(()),
        Strategy::CostMarkup { markup_percentage } if markup_percentage.is_sign_negative() => {
            Err(invalid("markupPercentage", "must not be negative"))
        }
        Strategy::CostMargin { margin_percentage } if margin_percentage.is_sign_negative() => {
            Err(invalid("marginPercentage", "must not be negative"))
        }
        Strategy::CostMargin { margin_percentage } if margin_percentage >= hundred => {
            Err(invalid("marginPercentage", "must be below 100"))
        }
        Strategy::MapPremium { premium_amount } if premium_amount.is_sign_negative() => {
            Err(invalid("premiumAmount", "must not be negative"))
        }
        Strategy::MsrpDiscount {
            discount_percentage,
        } if discount_percentage.is_sign_negative() || discount_percentage > hundred => {
            Err(invalid("discountPercentage", "must be between 0 and 100"))
        }
        _ => Ok(()),
    }
}

fn out_of_range() -> PricingError {
    PricingError::PriceOutOfRange { limit: MAX_PRICE }
}

/// Apply a strategy's formula to its base figure.
///
/// Arithmetic is checked; a result that does not fit a `Decimal` is
/// reported as [`PricingError::PriceOutOfRange`].
pub fn apply_strategy(strategy: &Strategy, base: Decimal) -> Result<Decimal, PricingError> {
    let hundred = Decimal::ONE_HUNDRED;
    let amount = match *strategy {
        Strategy::Msrp | Strategy::Map => Some(base),
        Strategy::CostMarkup { markup_percentage } => markup_percentage
            .checked_div(hundred)
            .and_then(|rate| Decimal::ONE.checked_add(rate))
            .and_then(|factor| base.checked_mul(factor)),
        Strategy::CostMargin { margin_percentage } => margin_percentage
            .checked_div(hundred)
            .and_then(|rate| Decimal::ONE.checked_sub(rate))
            .and_then(|divisor| base.checked_div(divisor)),
        Strategy::MapPremium { premium_amount } => base.checked_add(premium_amount),
        Strategy::MsrpDiscount {
            discount_percentage,
        } => discount_percentage
            .checked_div(hundred)
            .and_then(|rate| Decimal::ONE.checked_sub(rate))
            .and_then(|factor| base.checked_mul(factor)),
    };
    amount.ok_or_else(out_of_range)
}

/// Apply a rounding rule to a price already rounded to cents.
///
/// Each rule snaps the price onto the grid `step * n + ending` in its
/// direction, so applying a rule to its own output is a no-op. Prices above
/// [`MAX_PRICE`] are rejected rather than rounded.
pub fn apply_rounding(amount: Decimal, rule: RoundingRule) -> Result<Decimal, PricingError> {
    if amount.abs() > MAX_PRICE {
        return Err(out_of_range());
    }
    let Some(step) = rule.step() else {
        return Ok(amount);
    };

    let position = amount
        .checked_sub(step.ending)
        .and_then(|offset| offset.checked_div(step.step))
        .ok_or_else(out_of_range)?;
    let whole = match step.direction {
        RoundingDirection::Up => position.ceil(),
        RoundingDirection::Down => position.floor(),
        RoundingDirection::Nearest => {
            position.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        }
    };
    whole
        .checked_mul(step.step)
        .and_then(|snapped| snapped.checked_add(step.ending))
        .ok_or_else(out_of_range)
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPrice {
    /// Final price, two decimal places.
    pub amount: Decimal,
    /// Price before the rounding rule, rounded to cents.
    pub unrounded_amount: Decimal,
    pub strategy: StrategyKind,
    pub used_fallback: bool,
    /// Base figure was borrowed from another vendor.
    pub cross_vendor: bool,
    pub rounding: RoundingRule,
}

struct Evaluation {
    amount: Decimal,
    cross_vendor: bool,
}

/// Evaluate one strategy. `siblings` is only given when cross-vendor
/// substitution is allowed for this evaluation.
fn evaluate(
    strategy: &Strategy,
    selected: &ProductPricePoint,
    siblings: Option<&[ProductPricePoint]>,
) -> Result<Evaluation, PricingError> {
    validate_strategy(strategy)?;

    let field = strategy.required_field();
    let (base, cross_vendor) = match field.read(selected) {
        Some(value) => (value, false),
        None => {
            let substitute = siblings
                .filter(|_| strategy.allows_cross_vendor())
                .and_then(|siblings| max_across_vendors(siblings, field));
            match substitute {
                Some(value) => (value, true),
                None => {
                    return Err(PricingError::MissingRequiredInput {
                        strategy: strategy.kind(),
                        field,
                    })
                }
            }
        }
    };

    Ok(Evaluation {
        amount: apply_strategy(strategy, base)?,
        cross_vendor,
    })
}

fn ensure_in_range(price: Decimal) -> Result<Decimal, PricingError> {
    if price > MAX_PRICE {
        return Err(out_of_range());
    }
    Ok(price)
}

fn ensure_positive(price: Decimal) -> Result<Decimal, PricingError> {
    if price <= Decimal::ZERO {
        return Err(PricingError::NonPositivePrice { price });
    }
    Ok(price)
}

/// Resolve the retail price of a product for the selected vendor.
///
/// # Arguments
/// * `rule` - Pricing rule in effect
/// * `selected` - Price point of the vendor being priced
/// * `siblings` - Price points of the other vendors carrying the product,
///   consulted only for cross-vendor fallback
///
/// # Returns
/// `ResolvedPrice` with the final amount and how it was reached
pub fn resolve_price(
    rule: &PricingRule,
    selected: &ProductPricePoint,
    siblings: &[ProductPricePoint],
) -> Result<ResolvedPrice, PricingError> {
    let cross_vendor_siblings = rule.use_cross_vendor_fallback.then_some(siblings);

    let (evaluation, strategy, used_fallback) =
        match evaluate(&rule.primary, selected, cross_vendor_siblings) {
            Ok(evaluation) => (evaluation, rule.primary, false),
            Err(PricingError::MissingRequiredInput { strategy, field }) => {
                let Some(fallback) = rule.fallback.as_strategy() else {
                    return Err(PricingError::MissingRequiredInput { strategy, field });
                };
                match evaluate(&fallback, selected, None) {
                    Ok(evaluation) => (evaluation, fallback, true),
                    Err(PricingError::MissingRequiredInput {
                        strategy: fallback_kind,
                        field: fallback_field,
                    }) => {
                        return Err(PricingError::NoApplicableStrategy {
                            primary: strategy,
                            primary_field: field,
                            fallback: fallback_kind,
                            fallback_field,
                        })
                    }
                    Err(err) => return Err(err),
                }
            }
            Err(err) => return Err(err),
        };

    let unrounded_amount =
        ensure_positive(ensure_in_range(round_money(evaluation.amount, MONEY_PLACES))?)?;
    let mut amount = ensure_in_range(ensure_positive(apply_rounding(
        unrounded_amount,
        rule.rounding,
    )?)?)?;
    amount.rescale(MONEY_PLACES);

    Ok(ResolvedPrice {
        amount,
        unrounded_amount,
        strategy: strategy.kind(),
        used_fallback,
        cross_vendor: evaluation.cross_vendor,
        rounding: rule.rounding,
    })
}
