//! Pricing rule configuration model.
//!
//! A rule exists in two shapes:
//! - [`PricingRuleSettings`]: the flat form administrators edit and the
//!   database stores, with one optional field per strategy parameter.
//! - [`PricingRule`]: the typed form the resolver evaluates, where each
//!   parameter lives inside the strategy variant that owns it.
//!
//! Converting settings into a rule checks that the selected strategies have
//! their parameters and drops everything else, so a value left over from a
//! previously selected strategy never reaches a price calculation.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calculators::{validate_strategy, PriceField};
use super::error::PricingError;

/// Error parsing a stored enum name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseRuleError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseRuleError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Name of a pricing strategy, without its parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Msrp,
    Map,
    CostMarkup,
    CostMargin,
    MapPremium,
    #[serde(alias = "msrn_discount")]
    MsrpDiscount,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Msrp => "msrp",
            StrategyKind::Map => "map",
            StrategyKind::CostMarkup => "cost_markup",
            StrategyKind::CostMargin => "cost_margin",
            StrategyKind::MapPremium => "map_premium",
            StrategyKind::MsrpDiscount => "msrp_discount",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ParseRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "msrp" => Ok(StrategyKind::Msrp),
            "map" => Ok(StrategyKind::Map),
            "cost_markup" => Ok(StrategyKind::CostMarkup),
            "cost_margin" => Ok(StrategyKind::CostMargin),
            "map_premium" => Ok(StrategyKind::MapPremium),
            "msrp_discount" | "msrn_discount" => Ok(StrategyKind::MsrpDiscount),
            other => Err(ParseRuleError::new("pricing strategy", other)),
        }
    }
}

/// Name of a fallback strategy. A subset of [`StrategyKind`] plus `none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    None,
    Map,
    Msrp,
    CostMarkup,
    CostMargin,
}

impl FallbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackKind::None => "none",
            FallbackKind::Map => "map",
            FallbackKind::Msrp => "msrp",
            FallbackKind::CostMarkup => "cost_markup",
            FallbackKind::CostMargin => "cost_margin",
        }
    }
}

impl FromStr for FallbackKind {
    type Err = ParseRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(FallbackKind::None),
            "map" => Ok(FallbackKind::Map),
            "msrp" => Ok(FallbackKind::Msrp),
            "cost_markup" => Ok(FallbackKind::CostMarkup),
            "cost_margin" => Ok(FallbackKind::CostMargin),
            other => Err(ParseRuleError::new("fallback strategy", other)),
        }
    }
}

/// Post-processing applied to a computed price.
///
/// The arithmetic behind each variant is a single table entry, see
/// [`RoundingRule::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoundingRule {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "up_99")]
    Up99,
    #[serde(rename = "down_99")]
    Down99,
    #[serde(rename = "up_95")]
    Up95,
    #[serde(rename = "down_95")]
    Down95,
    #[serde(rename = "up_10cent")]
    Up10Cent,
    #[serde(rename = "down_10cent")]
    Down10Cent,
    #[serde(rename = "nearest_dollar")]
    NearestDollar,
    #[serde(rename = "up_dollar")]
    UpDollar,
    #[serde(rename = "down_dollar")]
    DownDollar,
}

/// Direction a rounding step moves a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingDirection {
    Up,
    Down,
    /// Half-up, away from zero.
    Nearest,
}

/// One row of the rounding table: snap to `step * n + ending` in `direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundingStep {
    pub direction: RoundingDirection,
    pub step: Decimal,
    pub ending: Decimal,
}

impl RoundingRule {
    pub const ALL: [RoundingRule; 10] = [
        RoundingRule::None,
        RoundingRule::Up99,
        RoundingRule::Down99,
        RoundingRule::Up95,
        RoundingRule::Down95,
        RoundingRule::Up10Cent,
        RoundingRule::Down10Cent,
        RoundingRule::NearestDollar,
        RoundingRule::UpDollar,
        RoundingRule::DownDollar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoundingRule::None => "none",
            RoundingRule::Up99 => "up_99",
            RoundingRule::Down99 => "down_99",
            RoundingRule::Up95 => "up_95",
            RoundingRule::Down95 => "down_95",
            RoundingRule::Up10Cent => "up_10cent",
            RoundingRule::Down10Cent => "down_10cent",
            RoundingRule::NearestDollar => "nearest_dollar",
            RoundingRule::UpDollar => "up_dollar",
            RoundingRule::DownDollar => "down_dollar",
        }
    }

    /// Rounding table. `None` leaves the price untouched.
    pub fn step(&self) -> Option<RoundingStep> {
        use RoundingDirection::{Down, Nearest, Up};

        let dollar = Decimal::ONE;
        let dime = Decimal::new(1, 1);
        let (direction, step, ending) = match self {
            RoundingRule::None => return None,
            RoundingRule::Up99 => (Up, dollar, Decimal::new(99, 2)),
            RoundingRule::Down99 => (Down, dollar, Decimal::new(99, 2)),
            RoundingRule::Up95 => (Up, dollar, Decimal::new(95, 2)),
            RoundingRule::Down95 => (Down, dollar, Decimal::new(95, 2)),
            RoundingRule::Up10Cent => (Up, dime, Decimal::ZERO),
            RoundingRule::Down10Cent => (Down, dime, Decimal::ZERO),
            RoundingRule::NearestDollar => (Nearest, dollar, Decimal::ZERO),
            RoundingRule::UpDollar => (Up, dollar, Decimal::ZERO),
            RoundingRule::DownDollar => (Down, dollar, Decimal::ZERO),
        };
        Some(RoundingStep {
            direction,
            step,
            ending,
        })
    }
}

impl fmt::Display for RoundingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundingRule {
    type Err = ParseRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoundingRule::ALL
            .into_iter()
            .find(|rule| rule.as_str() == s)
            .ok_or_else(|| ParseRuleError::new("rounding rule", s))
    }
}

/// A pricing strategy together with the parameter it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Msrp,
    Map,
    CostMarkup { markup_percentage: Decimal },
    CostMargin { margin_percentage: Decimal },
    MapPremium { premium_amount: Decimal },
    MsrpDiscount { discount_percentage: Decimal },
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Msrp => StrategyKind::Msrp,
            Strategy::Map => StrategyKind::Map,
            Strategy::CostMarkup { .. } => StrategyKind::CostMarkup,
            Strategy::CostMargin { .. } => StrategyKind::CostMargin,
            Strategy::MapPremium { .. } => StrategyKind::MapPremium,
            Strategy::MsrpDiscount { .. } => StrategyKind::MsrpDiscount,
        }
    }

    /// The vendor price point this strategy starts from.
    pub fn required_field(&self) -> PriceField {
        match self {
            Strategy::Msrp | Strategy::MsrpDiscount { .. } => PriceField::Msrp,
            Strategy::Map | Strategy::MapPremium { .. } => PriceField::Map,
            Strategy::CostMarkup { .. } | Strategy::CostMargin { .. } => PriceField::Cost,
        }
    }

    /// Whether a missing input may be borrowed from another vendor.
    /// Cost is vendor-specific and never substituted.
    pub fn allows_cross_vendor(&self) -> bool {
        self.required_field() != PriceField::Cost
    }
}

/// Fallback strategy, evaluated only when the primary lacks its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackStrategy {
    None,
    #[default]
    Map,
    Msrp,
    CostMarkup { markup_percentage: Decimal },
    CostMargin { margin_percentage: Decimal },
}

impl FallbackStrategy {
    pub fn kind(&self) -> FallbackKind {
        match self {
            FallbackStrategy::None => FallbackKind::None,
            FallbackStrategy::Map => FallbackKind::Map,
            FallbackStrategy::Msrp => FallbackKind::Msrp,
            FallbackStrategy::CostMarkup { .. } => FallbackKind::CostMarkup,
            FallbackStrategy::CostMargin { .. } => FallbackKind::CostMargin,
        }
    }

    /// The strategy to evaluate, or `None` when fallback is disabled.
    pub fn as_strategy(&self) -> Option<Strategy> {
        match *self {
            FallbackStrategy::None => None,
            FallbackStrategy::Map => Some(Strategy::Map),
            FallbackStrategy::Msrp => Some(Strategy::Msrp),
            FallbackStrategy::CostMarkup { markup_percentage } => {
                Some(Strategy::CostMarkup { markup_percentage })
            }
            FallbackStrategy::CostMargin { margin_percentage } => Some(Strategy::CostMargin {
                margin_percentage,
            }),
        }
    }
}

/// Typed pricing rule evaluated by [`super::calculators::resolve_price`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingRule {
    pub primary: Strategy,
    pub fallback: FallbackStrategy,
    pub rounding: RoundingRule,
    pub use_cross_vendor_fallback: bool,
}

impl Default for PricingRule {
    fn default() -> Self {
        Self {
            primary: Strategy::Msrp,
            fallback: FallbackStrategy::Map,
            rounding: RoundingRule::None,
            use_cross_vendor_fallback: false,
        }
    }
}

/// Flat rule shape, keyed by the field names the admin API uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PricingRuleSettings {
    pub primary_strategy: StrategyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup_percentage: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_percentage: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<Decimal>,
    pub rounding_rule: RoundingRule,
    pub fallback_strategy: FallbackKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_markup_percentage: Option<Decimal>,
    pub use_cross_vendor_fallback: bool,
}

impl Default for PricingRuleSettings {
    fn default() -> Self {
        PricingRuleSettings::from(&PricingRule::default())
    }
}

impl PricingRuleSettings {
    /// Validate and convert into the typed rule.
    pub fn to_rule(&self) -> Result<PricingRule, PricingError> {
        PricingRule::try_from(self)
    }

    /// Same settings with every parameter the selected strategies ignore
    /// cleared.
    pub fn normalized(&self) -> Result<Self, PricingError> {
        self.to_rule().map(|rule| PricingRuleSettings::from(&rule))
    }
}

fn required(
    value: Option<Decimal>,
    parameter: &'static str,
    strategy: StrategyKind,
) -> Result<Decimal, PricingError> {
    value.ok_or_else(|| PricingError::missing_parameter(parameter, strategy))
}

impl TryFrom<&PricingRuleSettings> for PricingRule {
    type Error = PricingError;

    fn try_from(settings: &PricingRuleSettings) -> Result<Self, Self::Error> {
        let kind = settings.primary_strategy;
        let primary = match kind {
            StrategyKind::Msrp => Strategy::Msrp,
            StrategyKind::Map => Strategy::Map,
            StrategyKind::CostMarkup => Strategy::CostMarkup {
                markup_percentage: required(settings.markup_percentage, "markupPercentage", kind)?,
            },
            StrategyKind::CostMargin => Strategy::CostMargin {
                margin_percentage: required(settings.margin_percentage, "marginPercentage", kind)?,
            },
            StrategyKind::MapPremium => Strategy::MapPremium {
                premium_amount: required(settings.premium_amount, "premiumAmount", kind)?,
            },
            StrategyKind::MsrpDiscount => Strategy::MsrpDiscount {
                discount_percentage: required(
                    settings.discount_percentage,
                    "discountPercentage",
                    kind,
                )?,
            },
        };
        validate_strategy(&primary)?;

        let fallback = match settings.fallback_strategy {
            FallbackKind::None => FallbackStrategy::None,
            FallbackKind::Map => FallbackStrategy::Map,
            FallbackKind::Msrp => FallbackStrategy::Msrp,
            FallbackKind::CostMarkup => FallbackStrategy::CostMarkup {
                markup_percentage: required(
                    settings.fallback_markup_percentage,
                    "fallbackMarkupPercentage",
                    StrategyKind::CostMarkup,
                )?,
            },
            FallbackKind::CostMargin => FallbackStrategy::CostMargin {
                margin_percentage: required(
                    settings.fallback_markup_percentage,
                    "fallbackMarkupPercentage",
                    StrategyKind::CostMargin,
                )?,
            },
        };
        if let Some(strategy) = fallback.as_strategy() {
            validate_strategy(&strategy).map_err(|err| match err {
                PricingError::InvalidParameter { reason, .. } => PricingError::InvalidParameter {
                    parameter: "fallbackMarkupPercentage",
                    reason,
                },
                other => other,
            })?;
        }

        Ok(PricingRule {
            primary,
            fallback,
            rounding: settings.rounding_rule,
            use_cross_vendor_fallback: settings.use_cross_vendor_fallback,
        })
    }
}

impl From<&PricingRule> for PricingRuleSettings {
    fn from(rule: &PricingRule) -> Self {
        let mut settings = PricingRuleSettings {
            primary_strategy: rule.primary.kind(),
            markup_percentage: None,
            margin_percentage: None,
            premium_amount: None,
            discount_percentage: None,
            rounding_rule: rule.rounding,
            fallback_strategy: rule.fallback.kind(),
            fallback_markup_percentage: None,
            use_cross_vendor_fallback: rule.use_cross_vendor_fallback,
        };

        match rule.primary {
            Strategy::CostMarkup { markup_percentage } => {
                settings.markup_percentage = Some(markup_percentage)
            }
            Strategy::CostMargin { margin_percentage } => {
                settings.margin_percentage = Some(margin_percentage)
            }
            Strategy::MapPremium { premium_amount } => settings.premium_amount = Some(premium_amount),
            Strategy::MsrpDiscount {
                discount_percentage,
            } => settings.discount_percentage = Some(discount_percentage),
            Strategy::Msrp | Strategy::Map => {}
        }

        settings.fallback_markup_percentage = match rule.fallback {
            FallbackStrategy::CostMarkup { markup_percentage } => Some(markup_percentage),
            FallbackStrategy::CostMargin { margin_percentage } => Some(margin_percentage),
            _ => None,
        };

        settings
    }
}

/// Owner of a stored pricing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleScope {
    Organization(Uuid),
    Subscription(Uuid),
}

impl RuleScope {
    pub fn parse(scope_type: &str, scope_id: Uuid) -> Result<Self, ParseRuleError> {
        match scope_type {
            "organization" => Ok(RuleScope::Organization(scope_id)),
            "subscription" => Ok(RuleScope::Subscription(scope_id)),
            other => Err(ParseRuleError::new("rule scope", other)),
        }
    }

    pub fn scope_type(&self) -> &'static str {
        match self {
            RuleScope::Organization(_) => "organization",
            RuleScope::Subscription(_) => "subscription",
        }
    }

    pub fn scope_id(&self) -> Uuid {
        match self {
            RuleScope::Organization(id) | RuleScope::Subscription(id) => *id,
        }
    }
}

impl fmt::Display for RuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope_type(), self.scope_id())
    }
}
