//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opal_core::checkout::CheckoutError;
use opal_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// Body sent when the backend is unreachable or not configured.
pub const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable, please try again";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(e) => store_status(e),
            Self::Checkout(e) => match e {
                CheckoutError::Validation(_) | CheckoutError::EmptyOrder => {
                    StatusCode::BAD_REQUEST
                }
                CheckoutError::OrderNumberExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
                CheckoutError::Store(e) => store_status(e),
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client.
    fn public_message(&self) -> String {
        match self.status() {
            StatusCode::SERVICE_UNAVAILABLE => UNAVAILABLE_MESSAGE.to_string(),
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => match self {
                Self::Checkout(e) => e.to_string(),
                Self::NotFound(what) => format!("{what} not found"),
                Self::BadRequest(msg) => msg.clone(),
                _ => self.to_string(),
            },
        }
    }
}

const fn store_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        StoreError::DataCorruption(_) | StoreError::Backend(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product".to_string());
        assert_eq!(err.to_string(), "Not found: product");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("order".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unavailable_store_maps_to_503() {
        let err = AppError::Store(StoreError::Unavailable("pool timed out".to_string()));
        assert_eq!(err.public_message(), UNAVAILABLE_MESSAGE);
        assert_eq!(get_status(err), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_checkout_validation_is_client_error() {
        let err = AppError::Checkout(CheckoutError::Validation("email is required".to_string()));
        assert_eq!(err.public_message(), "email is required");
        assert_eq!(get_status(err), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::EmptyOrder)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Store(StoreError::Backend("relation does not exist".to_string()));
        assert_eq!(err.public_message(), "Internal server error");
    }
}
