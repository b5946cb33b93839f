// server/src/auth/guard.rs
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderMap, HeaderValue},
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use common::{AuthError, Identity, Role, TokenCodec};
use futures_util::future::{ready, LocalBoxFuture, Ready};

use crate::error::ApiError;

/// Pull the token out of an `Authorization: <scheme> <token>` header.
///
/// An absent header is reported as such instead of being split.
pub fn extract_bearer(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;
    let value = header
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedCredential)?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MalformedCredential);
    }

    Ok(token)
}

/// Run the whole guard pipeline over a request's headers.
pub fn authenticate(headers: &HeaderMap, codec: &TokenCodec) -> Result<Identity, AuthError> {
    let token = extract_bearer(headers.get(header::AUTHORIZATION))?;
    Ok(codec.verify(token)?)
}

/// Middleware that only lets requests with a valid bearer token through and
/// attaches the verified [`Identity`] to the request extensions.
#[derive(Clone)]
pub struct RequireAuth {
    codec: web::Data<TokenCodec>,
}

impl RequireAuth {
    pub fn new(codec: web::Data<TokenCodec>) -> Self {
        Self { codec }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthMiddleware {
            service,
            codec: self.codec.clone(),
        }))
    }
}

pub struct RequireAuthMiddleware<S> {
    service: S,
    codec: web::Data<TokenCodec>,
}

impl<S, B> Service<ServiceRequest> for RequireAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(req.headers(), &self.codec) {
            Ok(identity) => {
                tracing::debug!(
                    "Authenticated {} ({}) for {}",
                    identity.subject,
                    identity.role,
                    req.path()
                );
                req.extensions_mut().insert(identity);

                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(kind) => {
                tracing::debug!("Rejected request to {}: {}", req.path(), kind);
                let response = req
                    .error_response(ApiError::Unauthorized(kind))
                    .map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

/// Extractor for the identity attached by [`RequireAuth`].
///
/// Used outside a guarded scope it rejects like a missing credential.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

impl AuthenticatedUser {
    pub fn subject(&self) -> &str {
        &self.0.subject
    }

    pub fn require_role(&self, role: Role) -> Result<&Identity, ApiError> {
        if self.0.role == role {
            Ok(&self.0)
        } else {
            Err(ApiError::Forbidden(role))
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let identity = req.extensions().get::<Identity>().cloned();
        ready(
            identity
                .map(AuthenticatedUser)
                .ok_or_else(|| ApiError::Unauthorized(AuthError::MissingCredential).into()),
        )
    }
}
