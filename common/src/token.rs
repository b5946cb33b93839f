// common/src/token.rs
use crate::config::AuthConfig;
use crate::error::{ConfigurationError, TokenError};
use crate::models::identity::{Claims, Identity, IssuedToken, Role};
use crate::utils::{now_secs, timestamp_to_datetime};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;

/// Signs and verifies identity assertions with a shared HS256 secret.
///
/// A codec can only be built from a non-empty secret, so a running server never
/// has to deal with an unconfigured signer at request time.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &str, ttl_secs: u64) -> Result<Self, ConfigurationError> {
        if secret.trim().is_empty() {
            return Err(ConfigurationError::MissingSecret);
        }
        if ttl_secs == 0 {
            return Err(ConfigurationError::InvalidTokenTtl);
        }

        // Expiry is checked by hand in `verify_at` so that `now == exp` already counts as expired.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigurationError> {
        let secret = config
            .jwt_secret
            .as_deref()
            .ok_or(ConfigurationError::MissingSecret)?;
        Self::new(secret, config.token_ttl_secs)
    }

    /// Issue a token for `subject` valid from now for the configured TTL.
    pub fn issue(&self, subject: &str, role: Role) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, role, now_secs())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        role: Role,
        issued_at: u64,
    ) -> Result<IssuedToken, TokenError> {
        if subject.trim().is_empty() {
            return Err(TokenError::EmptySubject);
        }

        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_secs),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)?;

        Ok(IssuedToken {
            token,
            issued_at: timestamp_to_datetime(claims.iat),
            expires_at: timestamp_to_datetime(claims.exp),
        })
    }

    /// Verify `token` against the current time.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify_at(token, now_secs())
    }

    pub fn verify_at(&self, token: &str, now: u64) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(classify_decode_error)?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(TokenError::Malformed("empty subject".into()));
        }
        if claims.exp <= claims.iat {
            return Err(TokenError::Malformed("expiry is not after issued-at".into()));
        }
        if now >= claims.exp {
            return Err(TokenError::Expired {
                expired_at: claims.exp,
            });
        }

        Ok(Identity::new(claims.sub, claims.role))
    }
}

fn classify_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::Invalid,
        ErrorKind::ExpiredSignature => TokenError::Expired { expired_at: 0 },
        _ => TokenError::Malformed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "test-secret";
    const NOW: u64 = 1_700_000_000;

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, 3600).unwrap()
    }

    #[test]
    fn test_round_trip_preserves_subject_and_role() {
        let codec = codec();
        for (subject, role) in [("u1", Role::Student), ("64f0c2a9e1", Role::Recruiter)] {
            let issued = codec.issue_at(subject, role, NOW).unwrap();
            let identity = codec.verify_at(&issued.token, NOW + 10).unwrap();
            assert_eq!(identity, Identity::new(subject, role));
        }
    }

    #[test]
    fn test_issued_token_reports_expiry() {
        let issued = codec().issue_at("u1", Role::Student, NOW).unwrap();
        assert_eq!(issued.issued_at.timestamp(), NOW as i64);
        assert_eq!(issued.expires_at.timestamp(), (NOW + 3600) as i64);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let codec = codec();
        let issued = codec.issue_at("u1", Role::Student, NOW).unwrap();

        // exactly at expiry counts as expired
        assert!(matches!(
            codec.verify_at(&issued.token, NOW + 3600),
            Err(TokenError::Expired { expired_at }) if expired_at == NOW + 3600
        ));
        assert!(matches!(
            codec.verify_at(&issued.token, NOW + 100_000),
            Err(TokenError::Expired { .. })
        ));
    }

    #[test]
    fn test_token_from_other_secret_is_invalid() {
        let other = TokenCodec::new("another-secret", 3600).unwrap();
        let issued = other.issue_at("u1", Role::Student, NOW).unwrap();
        assert!(matches!(
            codec().verify_at(&issued.token, NOW),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec();
        for token in ["", "not-a-token", "a.b.c", "Bearer xyz"] {
            assert!(
                matches!(codec.verify_at(token, NOW), Err(TokenError::Malformed(_))),
                "expected malformed for {:?}",
                token
            );
        }
    }

    #[test]
    fn test_unknown_role_is_malformed() {
        let claims = json!({ "sub": "u1", "role": "admin", "iat": NOW, "exp": NOW + 60 });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(matches!(
            codec().verify_at(&token, NOW),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_expiry_before_issue_is_malformed() {
        let claims = json!({ "sub": "u1", "role": "student", "iat": NOW, "exp": NOW });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(matches!(
            codec().verify_at(&token, NOW - 10),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_subject_cannot_be_issued() {
        assert!(matches!(
            codec().issue_at("  ", Role::Student, NOW),
            Err(TokenError::EmptySubject)
        ));
    }

    #[test]
    fn test_missing_secret_is_a_configuration_error() {
        assert!(matches!(
            TokenCodec::new("", 3600),
            Err(ConfigurationError::MissingSecret)
        ));
        assert!(matches!(
            TokenCodec::from_config(&AuthConfig {
                jwt_secret: None,
                token_ttl_secs: 3600
            }),
            Err(ConfigurationError::MissingSecret)
        ));
        assert!(matches!(
            TokenCodec::new(SECRET, 0),
            Err(ConfigurationError::InvalidTokenTtl)
        ));
    }

    #[test]
    fn test_fresh_token_verifies_against_wall_clock() {
        let codec = codec();
        let issued = codec.issue("u1", Role::Recruiter).unwrap();
        assert_eq!(
            codec.verify(&issued.token).unwrap(),
            Identity::new("u1", Role::Recruiter)
        );
    }
}
