use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("not found: {0}")]
    NotFound(anyhow::Error),

    #[error("conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("dependency failure: {0}")]
    Dependency(anyhow::Error),

    #[error("database error: {0}")]
    Database(anyhow::Error),

    #[error("configuration error: {0}")]
    Config(anyhow::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::Database(anyhow::Error::new(err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

fn is_prod() -> bool {
    std::env::var("ENVIRONMENT").map(|e| e == "prod").unwrap_or(false)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Every error goes out in the same envelope the success paths use:
        // { "success": false, "message": ... }.
        #[derive(Serialize)]
        struct ErrorBody {
            success: bool,
            message: String,
        }

        let (status, message) = match self {
            AppError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            AppError::Conflict(err) => (StatusCode::CONFLICT, err.to_string()),
            AppError::Dependency(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            AppError::Database(err) | AppError::Internal(err) | AppError::Config(err) => {
                // Internal detail stays out of production responses.
                let message = if is_prod() {
                    "Something went wrong".to_string()
                } else {
                    err.to_string()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}
