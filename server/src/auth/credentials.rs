// server/src/auth/credentials.rs
use actix_web::web;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use common::{AccountConfig, Identity};
use rand::{rngs::OsRng, RngCore};
use std::collections::HashMap;

/// Checks login credentials. The user store behind it lives outside this service.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Returns the identity to issue a token for, or `None` when the
    /// credentials do not match. Unknown accounts and wrong passwords look the same.
    async fn verify(&self, email: &str, password: &str) -> Option<Identity>;
}

/// Hash a password with Argon2id and a random salt, as a PHC string.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)?;

    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a password against a PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("Stored password hash is not a PHC string: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

struct Account {
    password_hash: String,
    identity: Identity,
}

/// Verifier backed by the `[[accounts]]` section of the configuration.
#[derive(Default)]
pub struct ConfiguredAccounts {
    // keyed by lowercased email
    accounts: HashMap<String, Account>,
}

impl ConfiguredAccounts {
    pub fn new(accounts: &[AccountConfig]) -> Self {
        let accounts = accounts
            .iter()
            .filter(|account| {
                if account.subject.trim().is_empty() {
                    tracing::warn!("Skipping account {} with empty subject", account.email);
                    return false;
                }
                if PasswordHash::new(account.password_hash.trim()).is_err() {
                    tracing::warn!("Skipping account {} with invalid password hash", account.email);
                    return false;
                }
                true
            })
            .map(|account| {
                (
                    account.email.trim().to_ascii_lowercase(),
                    Account {
                        password_hash: account.password_hash.trim().to_string(),
                        identity: Identity::new(account.subject.trim(), account.role),
                    },
                )
            })
            .collect();

        Self { accounts }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl CredentialVerifier for ConfiguredAccounts {
    async fn verify(&self, email: &str, password: &str) -> Option<Identity> {
        let account = self.accounts.get(&email.trim().to_ascii_lowercase())?;

        // CPU bound, so run it on the blocking pool
        let password = password.to_owned();
        let hash = account.password_hash.clone();
        let matched = web::block(move || verify_password(&password, &hash))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Password check did not complete: {}", e);
                false
            });

        matched.then(|| account.identity.clone())
    }
}
