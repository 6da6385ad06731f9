use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Raised by the store when a tracking id already exists.
    /// The report service retries on this variant before giving up with `Conflict`.
    #[error("Tracking id already taken: {0}")]
    TrackingIdTaken(String),

    #[error("File storage error: {0}")]
    FileStorage(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                    None,
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(ref msg) => (
                StatusCode::BAD_REQUEST,
                msg.clone(),
                Some(vec![msg.clone()]),
            ),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone(), None),
            AppError::TrackingIdTaken(ref id) => (
                StatusCode::CONFLICT,
                format!("Tracking id {} is already in use", id),
                None,
            ),
            AppError::FileStorage(ref msg) => {
                tracing::error!("File storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store file".to_string(),
                    None,
                )
            }
        };

        let body = Json(ApiResponse::<()>::error(Some(message), errors));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Map a sqlx error into the application taxonomy.
///
/// Unique violations become `Conflict`, foreign key violations become `Validation`.
/// Everything else is logged and surfaced as a storage failure.
pub fn handle_db_error(e: sqlx::Error, context: &str) -> AppError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.code().as_deref() {
            Some("23505") => {
                return AppError::Conflict(format!("{}: duplicate value", context));
            }
            Some("23503") => {
                return AppError::Validation(format!("{}: referenced record does not exist", context));
            }
            _ => {}
        }
    }

    tracing::error!("{}: {:?}", context, e);
    AppError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_carries_errors_list() {
        let (status, body) = body_json(AppError::Validation("bad month".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"][0], "bad month");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = vec![
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::TrackingIdTaken("YK2401011234".into()), StatusCode::CONFLICT),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::FileStorage("disk full".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let (status, _) = body_json(err).await;
            assert_eq!(status, expected);
        }
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let (_, body) = body_json(AppError::Internal("secret detail".to_string())).await;
        assert_eq!(body["message"], "Internal server error");
    }
}
