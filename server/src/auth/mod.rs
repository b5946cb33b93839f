// server/src/auth/mod.rs
pub mod credentials;
pub mod guard;

pub use credentials::{hash_password, ConfiguredAccounts, CredentialVerifier};
pub use guard::{authenticate, extract_bearer, AuthenticatedUser, RequireAuth};
