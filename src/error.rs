//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::mappings::MappingError;
use crate::pricing::rules::ParseRuleError;
use crate::pricing::PricingError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("Stored rule is corrupt: {0}")]
    StoredRule(#[from] ParseRuleError),
}

/// JSON error body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
}

impl AppError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Pricing(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.error_type()),
            AppError::Mapping(e @ MappingError::UnknownStatus(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.error_type())
            }
            AppError::Mapping(e) => (StatusCode::CONFLICT, e.error_type()),
            AppError::StoredRule(_) => (StatusCode::INTERNAL_SERVER_ERROR, "corrupt_rule"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();

        let message = if status.is_server_error() {
            tracing::error!("{}", self);
            "Internal error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error_type: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappings::MappingStatus;
    use rust_decimal::Decimal;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("mapping".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(PricingError::NonPositivePrice {
                price: Decimal::ZERO
            })
            .into_response()
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(MappingError::InvalidTransition {
                from: MappingStatus::Deprecated,
                to: MappingStatus::Draft,
            })
            .into_response()
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Database(sqlx::Error::PoolTimedOut)
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(AppError::NotFound("Mapping".into()).to_string(), "Mapping not found");
    }
}
