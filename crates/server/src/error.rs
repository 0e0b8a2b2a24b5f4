use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::ValidationError;
use service::CommentError;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Comment(#[from] CommentError),

    #[error("{0}")]
    Unauthenticated(#[from] AuthError),

    #[error("{0}")]
    BadRequest(String),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Comment(CommentError::Validation(e))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Comment(e) => match e {
                CommentError::RecipeNotFound
                | CommentError::UserNotFound
                | CommentError::CommentNotFound => StatusCode::NOT_FOUND,
                CommentError::Forbidden(_) => StatusCode::FORBIDDEN,
                CommentError::Validation(_) => StatusCode::BAD_REQUEST,
                CommentError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                CommentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Comment(CommentError::Internal(e)) => {
                tracing::error!("Internal error: {:?}", e);
                "Server error".to_string()
            }
            ApiError::Comment(CommentError::Unavailable(reason)) => {
                tracing::warn!("Service unavailable: {}", reason);
                "Service temporarily unavailable".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": true,
            "message": message,
            "statusCode": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}
