//! Pricing resolution errors.

use rust_decimal::Decimal;

use super::calculators::PriceField;
use super::rules::StrategyKind;

/// Why a price could not be resolved.
///
/// Returned to the caller, which decides whether to retry, omit or flag
/// the product.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("{strategy} pricing requires {field}, which is not available")]
    MissingRequiredInput {
        strategy: StrategyKind,
        field: PriceField,
    },

    #[error(
        "no applicable strategy: {primary} needs {primary_field}, fallback {fallback} needs {fallback_field}"
    )]
    NoApplicableStrategy {
        primary: StrategyKind,
        primary_field: PriceField,
        fallback: StrategyKind,
        fallback_field: PriceField,
    },

    #[error("computed price {price} is not positive")]
    NonPositivePrice { price: Decimal },

    #[error("computed price exceeds the supported maximum of {limit}")]
    PriceOutOfRange { limit: Decimal },

    #[error("invalid {parameter}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

impl PricingError {
    /// Stable machine-readable name used in JSON error bodies.
    pub fn error_type(&self) -> &'static str {
        match self {
            PricingError::MissingRequiredInput { .. } => "missing_required_input",
            PricingError::NoApplicableStrategy { .. } => "no_applicable_strategy",
            PricingError::NonPositivePrice { .. } => "non_positive_price",
            PricingError::PriceOutOfRange { .. } => "price_out_of_range",
            PricingError::InvalidParameter { .. } => "invalid_parameter",
        }
    }

    pub(crate) fn missing_parameter(parameter: &'static str, strategy: StrategyKind) -> Self {
        PricingError::InvalidParameter {
            parameter,
            reason: format!("required by the {} strategy", strategy),
        }
    }
}
