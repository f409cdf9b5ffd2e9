use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::catalog::CatalogError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `NOT_FOUND`, `INTERNAL_ERROR`.
    #[schema(example = "NOT_FOUND")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Tobacco not found")]
    pub message: String,
}

/// Application-level error type.
///
/// `NotFound` and `Internal` carry a `context` that is only logged and a
/// `message` that is shown to the caller.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    NotFound { context: String, message: String },
    Internal { context: String, message: String },
}

const GENERIC_FAILURE: &str = "An unexpected error occurred";

impl AppError {
    pub fn not_found(context: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::NotFound {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn internal(context: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Internal {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Translate a catalog failure, masking store details behind `failure_message`.
    pub fn from_catalog(err: CatalogError, failure_message: &str) -> Self {
        match err {
            CatalogError::Validation(msg) => AppError::Validation(msg),
            CatalogError::NotFound(id) => {
                AppError::not_found(format!("tobacco {id} not found"), "Tobacco not found")
            }
            other => AppError::internal(other.to_string(), failure_message),
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
            ),
            AppError::NotFound { context, message } => {
                tracing::info!(%context, "Not found");
                (StatusCode::NOT_FOUND, "NOT_FOUND", message)
            }
            AppError::Internal { context, message } => {
                tracing::error!(%context, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
            }
        };
        (
            status,
            ErrorBody {
                success: false,
                code,
                message,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::internal(err.to_string(), GENERIC_FAILURE)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(locator) => {
                AppError::not_found(format!("asset {locator} not found"), "File not found")
            }
            err @ StorageError::InvalidLocator { .. } => AppError::Validation(err.to_string()),
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::Validation(format!("File exceeds maximum size of {limit} bytes"))
            }
            StorageError::Io(e) => AppError::internal(format!("storage IO error: {e}"), GENERIC_FAILURE),
        }
    }
}
