// server/src/api/auth.rs
use actix_web::{post, web, HttpResponse};
use chrono::{DateTime, Utc};
use common::{Identity, Role, TokenCodec};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthenticatedUser, CredentialVerifier};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub subject: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

// Exchange credentials for a bearer token
#[post("/auth/token")]
pub async fn issue_token(
    body: web::Json<LoginRequest>,
    verifier: web::Data<dyn CredentialVerifier>,
    codec: web::Data<TokenCodec>,
) -> Result<HttpResponse, ApiError> {
    let LoginRequest { email, password } = body.into_inner();

    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest("All fields are required".into()));
    }

    let identity = verifier.verify(&email, &password).await.ok_or_else(|| {
        tracing::info!("Login rejected for {}", email);
        ApiError::InvalidCredentials
    })?;

    let issued = codec
        .issue(&identity.subject, identity.role)
        .map_err(|e| ApiError::Internal(format!("token issuance failed: {}", e)))?;

    tracing::info!("Issued token for {} ({})", identity.subject, identity.role);

    Ok(HttpResponse::Ok().json(TokenResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        subject: identity.subject,
        role: identity.role,
        expires_at: issued.expires_at,
    }))
}

// Identity the guard attached to this request
pub async fn me(user: AuthenticatedUser) -> web::Json<Identity> {
    web::Json(user.0)
}
