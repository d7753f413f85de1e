//! Pricing engine module.
//!
//! Derives retail prices from vendor cost / MAP / MSRP figures using a
//! configurable rule, and stores those rules per organization or
//! subscription.

pub mod calculators;
pub mod error;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod rules;
pub mod services;

// Re-export commonly used items
pub use calculators::{resolve_price, round_money, ProductPricePoint, ResolvedPrice};
pub use error::PricingError;
pub use routes::router;
pub use rules::{PricingRule, PricingRuleSettings, RoundingRule, RuleScope, Strategy};
pub use services::{EffectiveRule, PricingFailure, ProductPriceResult};
