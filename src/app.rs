//! Wiring of the loaded key registry into the token service and identity publisher.

use crate::config::{Config, IdentityConfig, KeyStoreConfig, TokenConfig};
use crate::error::TokenError;
use crate::identity::{IdentityDocument, IdentityPublisher};
use crate::jwt::{TokenClaims, TokenService};
use crate::keystore::{KeyRegistry, KeyStoreLoader};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

/// The services built once at startup. Construction fails unless the key store loaded.
#[derive(Debug)]
pub struct CoreServices {
    registry: Arc<KeyRegistry>,
    tokens: TokenService,
    identity: IdentityPublisher,
}

impl CoreServices {
    /// Load the key store and build both services over the same registry.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key store cannot be loaded.
    pub fn init(config: &Config) -> Result<Self, TokenError> {
        Self::from_parts(&config.key_store, config.token.clone(), config.identity.clone())
    }

    /// # Errors
    ///
    /// Returns a configuration error if the key store cannot be loaded.
    pub fn from_parts(
        key_store: &KeyStoreConfig,
        token: TokenConfig,
        identity: IdentityConfig,
    ) -> Result<Self, TokenError> {
        let registry = Arc::new(KeyStoreLoader::new(key_store).load()?);
        Ok(Self::with_registry(registry, token, identity))
    }

    pub fn with_registry(registry: Arc<KeyRegistry>, token: TokenConfig, identity: IdentityConfig) -> Self {
        let tokens = TokenService::new(Arc::clone(&registry), token);
        let identity = IdentityPublisher::new(Arc::clone(&registry), identity);
        info!(
            keys = registry.len(),
            identity_url = identity.identity_url(),
            "Core services ready"
        );
        CoreServices {
            registry,
            tokens,
            identity,
        }
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn identity(&self) -> &IdentityPublisher {
        &self.identity
    }

    /// # Errors
    ///
    /// See [`TokenService::mint`].
    pub fn mint_token(&self, subject: &str, claims: Option<TokenClaims>) -> Result<String, TokenError> {
        self.tokens.mint(subject, claims)
    }

    /// # Errors
    ///
    /// See [`TokenService::validate`].
    pub fn validate_token(&self, token: &str, issuer: Option<&str>) -> Result<Map<String, Value>, TokenError> {
        self.tokens.validate(token, issuer)
    }

    /// # Errors
    ///
    /// See [`TokenService::is_valid`].
    pub fn is_valid(&self, token: &str) -> Result<bool, TokenError> {
        self.tokens.is_valid(token)
    }

    /// # Errors
    ///
    /// See [`TokenService::parse_unsecured`].
    pub fn parse_unsecured(&self, token: &str) -> Result<Map<String, Value>, TokenError> {
        self.tokens.parse_unsecured(token)
    }

    /// # Errors
    ///
    /// See [`IdentityPublisher::identity_document`].
    pub fn identity_document(
        &self,
        element: Option<&str>,
        type_filter: Option<&str>,
    ) -> Result<IdentityDocument, TokenError> {
        self.identity.identity_document(element, type_filter)
    }
}
