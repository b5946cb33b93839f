// common/src/config.rs
use crate::error::ConfigurationError;
use crate::models::identity::Role;
use config::{Config as ConfigFile, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Central configuration for the notification server
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_addr: String,
    pub auth: AuthConfig,
    pub channel: ChannelConfig,
    pub rate_limit: RateLimitConfig,

    // Accounts the built-in credential verifier accepts
    pub accounts: Vec<AccountConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HS256 signing secret. No default: a missing secret is fatal.
    pub jwt_secret: Option<String>,
    pub token_ttl_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub heartbeat_interval_secs: u64,
    pub client_timeout_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_secs: u64,
    pub paths: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountConfig {
    pub email: String,
    /// Argon2 PHC string, e.g. from `elevatr-server hash-password`
    pub password_hash: String,
    pub subject: String,
    #[serde(default)]
    pub role: Role,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:4000".to_string(),
            auth: AuthConfig::default(),
            channel: ChannelConfig::default(),
            rate_limit: RateLimitConfig::default(),
            accounts: Vec::new(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: 86400, // 24 hours
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 5,
            client_timeout_secs: 30,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window_secs: 60,
            paths: vec!["/api/auth/token".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, ConfigurationError> {
        // Get the run mode, defaulting to "development"
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        Self::load_from(&config_dir, &run_mode)
    }

    pub fn load_from(config_dir: &Path, run_mode: &str) -> Result<Self, ConfigurationError> {
        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        let config = ConfigFile::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            // Local overrides, never committed
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // APP__AUTH__JWT_SECRET -> auth.jwt_secret
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load from files and environment, falling back to plain environment variables.
    pub fn from_env() -> Self {
        let mut config = match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");
                Self::from_plain_env()
            }
        };

        // JWT_SECRET is honoured even when the file layer loaded fine
        if config.auth.jwt_secret.as_deref().map_or(true, str::is_empty) {
            config.auth.jwt_secret = env::var("JWT_SECRET").ok().filter(|s| !s.is_empty());
        }

        config
    }

    fn from_plain_env() -> Self {
        let defaults = Self::default();

        let server_addr = env::var("SERVER_ADDR").unwrap_or(defaults.server_addr);

        let token_ttl_secs = parse_env("TOKEN_TTL_SECS").unwrap_or(defaults.auth.token_ttl_secs);

        let heartbeat_interval_secs = parse_env("HEARTBEAT_INTERVAL_SECS")
            .unwrap_or(defaults.channel.heartbeat_interval_secs);

        let client_timeout_secs =
            parse_env("CLIENT_TIMEOUT_SECS").unwrap_or(defaults.channel.client_timeout_secs);

        let max_requests =
            parse_env("RATE_LIMIT_MAX_REQUESTS").unwrap_or(defaults.rate_limit.max_requests);

        let window_secs =
            parse_env("RATE_LIMIT_WINDOW_SECS").unwrap_or(defaults.rate_limit.window_secs);

        Self {
            server_addr,
            auth: AuthConfig {
                jwt_secret: None,
                token_ttl_secs,
            },
            channel: ChannelConfig {
                heartbeat_interval_secs,
                client_timeout_secs,
            },
            rate_limit: RateLimitConfig {
                max_requests,
                window_secs,
                paths: defaults.rate_limit.paths,
            },
            accounts: Vec::new(),
        }
    }

    /// Reject configurations the server must not start with.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self.auth.jwt_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => {}
            _ => return Err(ConfigurationError::MissingSecret),
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigurationError::InvalidTokenTtl);
        }
        if self.channel.client_timeout_secs <= self.channel.heartbeat_interval_secs {
            tracing::warn!(
                "channel.client_timeout_secs ({}) is not above the heartbeat interval ({}); idle channels will be dropped early",
                self.channel.client_timeout_secs,
                self.channel.heartbeat_interval_secs
            );
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_config_dir() -> PathBuf {
        let dir = env::temp_dir().join(format!("elevatr-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_config_has_no_secret() {
        let config = Config::default();
        assert!(config.auth.jwt_secret.is_none());
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::MissingSecret)
        ));
    }

    #[test]
    fn test_validate_rejects_blank_secret_and_zero_ttl() {
        let mut config = Config::default();
        config.auth.jwt_secret = Some("   ".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::MissingSecret)
        ));

        config.auth.jwt_secret = Some("s3cret".into());
        config.auth.token_ttl_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidTokenTtl)
        ));

        config.auth.token_ttl_secs = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_layers_run_mode_over_default() {
        let dir = temp_config_dir();
        fs::write(
            dir.join("default.toml"),
            r#"
server_addr = "0.0.0.0:4000"

[auth]
jwt_secret = "from-default"
token_ttl_secs = 120

[[accounts]]
email = "ada@example.com"
password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
subject = "u-ada"
role = "recruiter"
"#,
        )
        .unwrap();
        fs::write(
            dir.join("test.toml"),
            r#"
[auth]
jwt_secret = "from-test"
"#,
        )
        .unwrap();

        let config = Config::load_from(&dir, "test").unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:4000");
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("from-test"));
        assert_eq!(config.auth.token_ttl_secs, 120);
        assert_eq!(config.channel.client_timeout_secs, 30);
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].role, Role::Recruiter);

        fs::remove_dir_all(dir).ok();
    }
}
