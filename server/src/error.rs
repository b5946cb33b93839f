// server/src/error.rs
use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use common::{AuthError, Role};
use serde_json::json;
use thiserror::Error;

/// The one message every authentication failure produces.
pub const AUTH_FAILURE_MESSAGE: &str = "You are not authorized, please login first";

/// Errors surfaced by HTTP handlers and the authentication guard.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Any guard rejection. The inner kind is for logs only.
    #[error("{}", AUTH_FAILURE_MESSAGE)]
    Unauthorized(#[from] AuthError),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Access denied - requires {0} role")]
    Forbidden(Role),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(detail) = self {
            tracing::error!("Internal error: {}", detail);
        }

        let mut response = HttpResponse::build(self.status_code());
        if matches!(self, ApiError::Unauthorized(_) | ApiError::InvalidCredentials) {
            response.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        response.json(json!({ "message": self.to_string() }))
    }
}
