//! Unified error handling for admin.
//!
//! Every handler returns [`Result`]. Server-side failures are captured to
//! Sentry; clients only ever see a JSON `{"error": ...}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opal_core::backup::RestoreError;
use opal_core::catalog::{CategoryError, ProductError};
use opal_core::import::ImportError;
use opal_core::lifecycle::LifecycleError;
use opal_core::settings::SettingsError;
use opal_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// Body sent when the backend is unreachable or not configured.
pub const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable, please try again";

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Status change failed: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Invalid product: {0}")]
    Product(#[from] ProductError),

    #[error("Invalid category: {0}")]
    Category(#[from] CategoryError),

    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    #[error("Restore failed: {0}")]
    Restore(#[from] RestoreError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operator is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(e) | Self::Lifecycle(LifecycleError::Store(e)) => store_status(e),
            Self::Lifecycle(LifecycleError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Lifecycle(LifecycleError::Transition(_) | LifecycleError::StatusChanged { .. }) => {
                StatusCode::CONFLICT
            }
            Self::Restore(RestoreError::UnsupportedVersion { .. })
            | Self::Product(_)
            | Self::Category(_)
            | Self::Settings(_)
            | Self::Import(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Restore(RestoreError::Aborted { source, .. }) => store_status(source),
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client.
    fn public_message(&self) -> String {
        match self.status() {
            StatusCode::SERVICE_UNAVAILABLE => UNAVAILABLE_MESSAGE.to_string(),
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => match self {
                Self::Lifecycle(e) => e.to_string(),
                Self::Product(e) => e.to_string(),
                Self::Category(e) => e.to_string(),
                Self::Settings(e) => e.to_string(),
                Self::Import(e) => e.to_string(),
                Self::Restore(e) => e.to_string(),
                Self::NotFound(what) => format!("{what} not found"),
                Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
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

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
