// server/src/state.rs
use actix_web::web;
use common::{Config, ConfigurationError, TokenCodec};
use std::sync::Arc;

use crate::auth::{ConfiguredAccounts, CredentialVerifier};
use crate::dispatcher::NotificationDispatcher;
use crate::registry::ConnectionRegistry;
use crate::{api, channel};

/// Everything the HTTP and channel handlers share, built once at startup.
#[derive(Clone)]
pub struct ServerState {
    pub config: web::Data<Config>,
    pub codec: web::Data<TokenCodec>,
    pub registry: web::Data<ConnectionRegistry>,
    pub dispatcher: web::Data<NotificationDispatcher>,
    pub verifier: web::Data<dyn CredentialVerifier>,
}

impl ServerState {
    /// Fails when the configuration could not sign tokens.
    pub fn from_config(config: Config) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let codec = TokenCodec::from_config(&config.auth)?;

        let accounts = ConfiguredAccounts::new(&config.accounts);
        if accounts.is_empty() {
            tracing::warn!("No accounts configured; every login will be rejected");
        } else {
            tracing::info!("Loaded {} accounts", accounts.len());
        }
        let verifier: Arc<dyn CredentialVerifier> = Arc::new(accounts);

        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));

        Ok(Self {
            config: web::Data::new(config),
            codec: web::Data::new(codec),
            registry: web::Data::from(registry),
            dispatcher: web::Data::new(dispatcher),
            verifier: web::Data::from(verifier),
        })
    }

    /// Register shared data and all routes on an app.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.config.clone())
            .app_data(self.codec.clone())
            .app_data(self.registry.clone())
            .app_data(self.dispatcher.clone())
            .app_data(self.verifier.clone());

        api::configure(cfg, self.codec.clone());
        channel::routes(cfg);
    }
}
