//! Centralized configuration for the access token service.
//!
//! All configuration is loaded from environment variables and validated
//! at startup. Builder methods cover tests and embedding callers.

use crate::error::TokenError;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default token validity window (seconds).
pub const DEFAULT_TOKEN_VALIDITY: u64 = 3600;

/// Default `typ` header value.
pub const DEFAULT_TOKEN_TYPE: &str = "JWT";

/// Key store location, passphrases and alias layout.
#[derive(Debug)]
pub struct KeyStoreConfig {
    /// Path of the PEM key store
    pub path: PathBuf,
    /// Passphrase the store seal is keyed with
    pub store_password: SecretString,
    /// Passphrase of encrypted private keys
    pub key_password: SecretString,
    /// Signing aliases, in publication order
    pub sign_aliases: Vec<String>,
    /// Encryption aliases, in publication order
    pub enc_aliases: Vec<String>,
    /// Alias used to sign every new token
    pub active_sign_alias: String,
}

impl KeyStoreConfig {
    /// Create a config whose active signing alias is the first signing alias.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, sign_aliases: Vec<String>) -> Self {
        let active_sign_alias = sign_aliases.first().cloned().unwrap_or_default();
        Self {
            path: path.into(),
            store_password: SecretString::from(String::new()),
            key_password: SecretString::from(String::new()),
            sign_aliases,
            enc_aliases: Vec::new(),
            active_sign_alias,
        }
    }

    #[must_use]
    pub fn with_enc_aliases(mut self, aliases: Vec<String>) -> Self {
        self.enc_aliases = aliases;
        self
    }

    #[must_use]
    pub fn with_store_password(mut self, password: impl Into<String>) -> Self {
        self.store_password = SecretString::from(password.into());
        self
    }

    #[must_use]
    pub fn with_key_password(mut self, password: impl Into<String>) -> Self {
        self.key_password = SecretString::from(password.into());
        self
    }

    #[must_use]
    pub fn with_active_sign_alias(mut self, alias: impl Into<String>) -> Self {
        self.active_sign_alias = alias.into();
        self
    }
}

/// Claims and header settings applied to every minted token.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// `iss` claim, also the issuer required on validation
    pub issuer: String,
    /// `typ` header
    pub token_type: String,
    /// Lifetime of a minted token
    pub validity: Duration,
}

impl TokenConfig {
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            validity: Duration::from_secs(DEFAULT_TOKEN_VALIDITY),
        }
    }

    #[must_use]
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        self.token_type = token_type.into();
        self
    }

    #[must_use]
    pub const fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }
}

/// A service endpoint advertised in the identity document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
    pub name: String,
}

impl ServiceDescriptor {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        service_type: impl Into<String>,
        service_endpoint: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            service_type: service_type.into(),
            service_endpoint: service_endpoint.into(),
            name: name.into(),
        }
    }
}

/// Identity document settings.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Public base URL of this service
    pub service_url: String,
    /// Advertised services
    pub services: Vec<ServiceDescriptor>,
    /// Advertised endpoints, listed after the services
    pub endpoints: Vec<ServiceDescriptor>,
}

impl IdentityConfig {
    #[must_use]
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            services: Vec::new(),
            endpoints: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_service(mut self, service: ServiceDescriptor) -> Self {
        self.services.push(service);
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: ServiceDescriptor) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Base identity URL: `{service_url}/identity`.
    #[must_use]
    pub fn identity_url(&self) -> String {
        format!("{}/identity", self.service_url.trim_end_matches('/'))
    }
}

/// Access token service configuration.
#[derive(Debug)]
pub struct Config {
    pub key_store: KeyStoreConfig,
    pub token: TokenConfig,
    pub identity: IdentityConfig,
    /// Emit JSON log lines
    pub json_logs: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();

        let sign_aliases = parse_list(&require_env("SIGN_ALIASES")?);
        if sign_aliases.is_empty() {
            return Err(TokenError::config("SIGN_ALIASES must name at least one alias"));
        }

        let mut key_store = KeyStoreConfig::new(require_env("KEY_STORE_FILE")?, sign_aliases)
            .with_enc_aliases(parse_list(&env::var("ENC_ALIASES").unwrap_or_default()))
            .with_store_password(env::var("KEY_STORE_PASSWORD").unwrap_or_default())
            .with_key_password(env::var("PRIVATE_KEY_PASSWORD").unwrap_or_default());
        if let Some(active) = env::var("ACTIVE_SIGN_KEY").ok().filter(|v| !v.trim().is_empty()) {
            key_store = key_store.with_active_sign_alias(active.trim());
        }

        let token = TokenConfig::new(require_env("TOKEN_ISSUER")?)
            .with_token_type(env::var("TOKEN_TYPE").unwrap_or_else(|_| DEFAULT_TOKEN_TYPE.to_string()))
            .with_validity(Duration::from_secs(parse_env("TOKEN_VALIDITY", DEFAULT_TOKEN_VALIDITY)?));

        let mut identity = IdentityConfig::new(require_env("SERVICE_URL")?);
        identity.services = parse_services("IDENTITY_SERVICES")?;
        identity.endpoints = parse_services("IDENTITY_ENDPOINTS")?;

        let json_logs = json_logs_from_env();

        Ok(Self {
            key_store,
            token,
            identity,
            json_logs,
        })
    }
}

/// `LOG_FORMAT=json` selects JSON log lines.
#[must_use]
pub fn json_logs_from_env() -> bool {
    env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"))
}

/// Read a variable that has no default.
fn require_env(name: &str) -> Result<String, TokenError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| TokenError::config(format!("Missing required configuration {name}")))
}

/// Parse environment variable with default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, TokenError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

/// Split a comma separated alias list, dropping blanks.
#[must_use]
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a JSON array of service descriptors from an environment variable.
fn parse_services(name: &str) -> Result<Vec<ServiceDescriptor>, TokenError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => parse_service_list(&raw)
            .map_err(|e| TokenError::config(format!("Invalid {name}: {e}"))),
        _ => Ok(Vec::new()),
    }
}

fn parse_service_list(raw: &str) -> Result<Vec<ServiceDescriptor>, serde_json::Error> {
    serde_json::from_str(raw)
}
