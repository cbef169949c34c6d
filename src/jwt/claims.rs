use crate::error::TokenError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Validation conditions (`vc` claim) handed to the certificate validation service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenConditions {
    /// Hash of the certificate; not applicable for token types 1 and 2.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    /// ICAO 9303 transliterated surname.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fnt: Option<String>,
    /// ICAO 9303 transliterated given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gnt: Option<String>,
    /// Date of birth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    /// Country of arrival.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coa: Option<String>,
    /// Country of departure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cod: Option<String>,
    /// Region of arrival, ISO 3166-2 without country.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roa: Option<String>,
    /// Region of departure, ISO 3166-2 without country.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rod: Option<String>,
    /// Acceptable certificate types.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub accepted_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_clock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<String>,
}

/// Payload of an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(rename = "t", skip_serializing_if = "Option::is_none")]
    pub token_type: Option<i32>,
    #[serde(rename = "v", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(rename = "vc", skip_serializing_if = "Option::is_none")]
    pub conditions: Option<AccessTokenConditions>,
}

impl AccessTokenClaims {
    pub fn new(issuer: String, subject: String, issued_at: i64, ttl_seconds: i64) -> Self {
        AccessTokenClaims {
            sub: subject,
            iss: issuer,
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_seconds),
            jti: uuid::Uuid::new_v4().to_string(),
            aud: None,
            token_type: None,
            version: None,
            nonce: None,
            conditions: None,
        }
    }

    /// Merge caller-supplied claims; every field set there wins.
    pub fn with_overrides(mut self, overrides: TokenClaims) -> Self {
        if let Some(exp) = overrides.expires_at {
            self.exp = exp;
        }
        if let Some(jti) = overrides.jti {
            self.jti = jti;
        }
        self.aud = overrides.audience.or(self.aud);
        self.token_type = overrides.token_type.or(self.token_type);
        self.version = overrides.version.or(self.version);
        self.nonce = overrides.nonce.or(self.nonce);
        self.conditions = overrides.conditions.or(self.conditions);
        self
    }

    /// Typed view of a validated claim map.
    ///
    /// # Errors
    ///
    /// Returns `InvalidClaims` if the map lacks a required field or a field has the wrong type.
    pub fn from_map(claims: &Map<String, Value>) -> Result<Self, TokenError> {
        serde_json::from_value(Value::Object(claims.clone()))
            .map_err(|e| TokenError::InvalidClaims(e.to_string()))
    }
}

/// Optional claims a caller adds to a minted token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenClaims {
    audience: Option<String>,
    token_type: Option<i32>,
    version: Option<String>,
    jti: Option<String>,
    nonce: Option<String>,
    conditions: Option<AccessTokenConditions>,
    expires_at: Option<i64>,
}

impl TokenClaims {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn token_type(mut self, token_type: i32) -> Self {
        self.token_type = Some(token_type);
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn jti(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn conditions(mut self, conditions: AccessTokenConditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Absolute expiry (epoch seconds) replacing the configured window.
    pub fn expires_at(mut self, exp: i64) -> Self {
        self.expires_at = Some(exp);
        self
    }
}
