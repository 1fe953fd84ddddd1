//! Application-wide error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scholarship_pool::{ErrorBody, PoolError};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rejected by pool: {0}")]
    Pool(#[from] PoolError),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// HTTP status for a business rejection.
pub fn pool_status(err: PoolError) -> StatusCode {
    match err {
        PoolError::Unauthorized => StatusCode::FORBIDDEN,
        PoolError::PoolNotInitialized => StatusCode::NOT_FOUND,
        PoolError::AlreadyInitialized | PoolError::AlreadyApplied => StatusCode::CONFLICT,
        PoolError::InvalidAmount
        | PoolError::InvalidScholarshipRange
        | PoolError::InvalidDeadline
        | PoolError::InvalidApplicationData => StatusCode::UNPROCESSABLE_ENTITY,
        PoolError::PoolNotActive
        | PoolError::ApplicationDeadlinePassed
        | PoolError::ApplicationsStillOpen
        | PoolError::DistributionNotReady
        | PoolError::InsufficientBalance => StatusCode::CONFLICT,
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::Pool(err) => (pool_status(err), Json(ErrorBody::from(err))).into_response(),
            ServiceError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": format!("{what} not found") })),
            )
                .into_response(),
            other => {
                error!("request failed: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": other.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
