// common/src/error.rs
use thiserror::Error;

/// Rejection reasons raised by the authentication guard.
///
/// Callers never see which variant fired; the HTTP edge collapses all of them
/// into one uniform 401 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no credential header present")]
    MissingCredential,
    #[error("credential header is not of the form '<scheme> <token>'")]
    MalformedCredential,
    #[error("token signature is invalid")]
    InvalidToken,
    #[error("token has expired")]
    ExpiredToken,
    #[error("token could not be parsed")]
    MalformedToken,
}

/// Failures of the token codec itself.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signature verification failed")]
    Invalid,
    #[error("token expired at {expired_at}")]
    Expired { expired_at: u64 },
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token subject must not be empty")]
    EmptySubject,
    #[error("failed to encode token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AuthError::InvalidToken,
            TokenError::Expired { .. } => AuthError::ExpiredToken,
            TokenError::Malformed(_) | TokenError::EmptySubject | TokenError::Encoding(_) => {
                AuthError::MalformedToken
            }
        }
    }
}

/// Startup-time configuration problems. Any of these keeps the server from binding.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no JWT signing secret configured (set auth.jwt_secret or JWT_SECRET)")]
    MissingSecret,
    #[error("token TTL must be greater than zero")]
    InvalidTokenTtl,
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_map_onto_auth_errors() {
        assert_eq!(AuthError::from(TokenError::Invalid), AuthError::InvalidToken);
        assert_eq!(
            AuthError::from(TokenError::Expired { expired_at: 10 }),
            AuthError::ExpiredToken
        );
        assert_eq!(
            AuthError::from(TokenError::Malformed("bad".into())),
            AuthError::MalformedToken
        );
        assert_eq!(AuthError::from(TokenError::EmptySubject), AuthError::MalformedToken);
    }
}
