//! Token minting and validation.

use crate::config::TokenConfig;
use crate::error::TokenError;
use crate::jwt::claims::{AccessTokenClaims, TokenClaims};
use crate::jwt::key::VerificationKey;
use crate::keystore::{KeyAlgorithm, KeyRegistry, KeyUsage};
use crate::metrics;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, DecodingKey, Header, Validation};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Prefix of an `Authorization` header value.
pub const TOKEN_PREFIX: &str = "Bearer ";

/// Signs access tokens with the active signing key and validates presented tokens.
pub struct TokenService {
    registry: Arc<KeyRegistry>,
    config: TokenConfig,
}

impl TokenService {
    pub fn new(registry: Arc<KeyRegistry>, config: TokenConfig) -> Self {
        TokenService { registry, config }
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Mint a compact JWS for `subject` signed with the active signing key.
    ///
    /// The header carries the key id and the configured `typ`. Claims supplied by the
    /// caller override the defaults, including `exp`.
    ///
    /// # Errors
    ///
    /// `InvalidClaims` for a blank subject, `Configuration` when the active alias has no
    /// private key, `JwtEncoding` when signing fails.
    pub fn mint(&self, subject: &str, claims: Option<TokenClaims>) -> Result<String, TokenError> {
        if subject.trim().is_empty() {
            return Err(TokenError::InvalidClaims("subject must not be blank".to_string()));
        }

        let alias = self.registry.active_signing_alias();
        let entry = self.registry.entry(alias)?;
        let private_key = entry
            .private_key()
            .ok_or_else(|| TokenError::config(format!("Active signing alias '{alias}' has no private key")))?;

        let ttl = i64::try_from(self.config.validity.as_secs()).unwrap_or(i64::MAX);
        let mut payload = AccessTokenClaims::new(
            self.config.issuer.clone(),
            subject.to_string(),
            chrono::Utc::now().timestamp(),
            ttl,
        );
        if let Some(overrides) = claims {
            payload = payload.with_overrides(overrides);
        }

        let algorithm = entry.algorithm();
        let mut header = Header::new(algorithm.jwt_algorithm());
        header.kid = Some(entry.key_id().to_string());
        header.typ = Some(self.config.token_type.clone());

        let token = encode(&header, &payload, private_key.encoding_key())
            .map_err(|e| TokenError::JwtEncoding(e.to_string()))?;

        metrics::record_mint(algorithm.as_str());
        debug!(kid = entry.key_id(), algorithm = %algorithm, jti = %payload.jti, "Minted access token");
        Ok(token)
    }

    /// Mint a token ready for an `Authorization` header.
    ///
    /// # Errors
    ///
    /// Same as [`TokenService::mint`].
    pub fn mint_header_token(&self, subject: &str, claims: Option<TokenClaims>) -> Result<String, TokenError> {
        Ok(format!("{TOKEN_PREFIX}{}", self.mint(subject, claims)?))
    }

    /// Verify a token against the registry key named by its `kid` header.
    ///
    /// When `issuer` is given it must match both the configured issuer and the token's
    /// `iss`. Returns the full claim map.
    ///
    /// # Errors
    ///
    /// `TokenInvalid` for anything wrong with the token itself.
    pub fn validate(&self, token: &str, issuer: Option<&str>) -> Result<Map<String, Value>, TokenError> {
        let result = self.verify(token, issuer, None);
        metrics::record_validation(result.is_ok());
        result
    }

    /// Verify a token against an explicit key instead of the registry.
    ///
    /// # Errors
    ///
    /// `TokenInvalid` for anything wrong with the token itself.
    pub fn validate_with_key(
        &self,
        token: &str,
        key: &VerificationKey,
        issuer: Option<&str>,
    ) -> Result<Map<String, Value>, TokenError> {
        let result = self.verify(token, issuer, Some(key));
        metrics::record_validation(result.is_ok());
        result
    }

    /// Boolean form of [`TokenService::validate`] against the configured issuer.
    ///
    /// # Errors
    ///
    /// Only errors other than `TokenInvalid` are returned.
    pub fn is_valid(&self, token: &str) -> Result<bool, TokenError> {
        match self.validate(token, Some(&self.config.issuer)) {
            Ok(_) => Ok(true),
            Err(e) if e.is_token_invalid() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Decode the header of a token without verifying anything.
    ///
    /// # Errors
    ///
    /// `TokenInvalid` if the header segment is not base64url JSON.
    pub fn parse_unsecured(&self, token: &str) -> Result<Map<String, Value>, TokenError> {
        let compact = strip_prefix(token);
        let mut parts = compact.split('.');
        let header = match (parts.next(), parts.next()) {
            (Some(header), Some(_)) if !header.is_empty() => header,
            _ => return Err(TokenError::invalid("malformed token")),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|_| TokenError::invalid("malformed token header"))?;
        serde_json::from_slice(&bytes).map_err(|_| TokenError::invalid("malformed token header"))
    }

    fn verify(
        &self,
        token: &str,
        issuer: Option<&str>,
        explicit: Option<&VerificationKey>,
    ) -> Result<Map<String, Value>, TokenError> {
        let compact = strip_prefix(token);
        let header = decode_header(compact).map_err(|_| TokenError::invalid("malformed token"))?;
        let kid = header
            .kid
            .as_deref()
            .filter(|kid| !kid.is_empty())
            .ok_or_else(|| TokenError::invalid("missing key id"))?;

        let (key, algorithm) = match explicit {
            Some(key) => (key.decoding_key(), key.algorithm()),
            None => self.resolve(kid)?,
        };

        let mut validation = Validation::new(algorithm.jwt_algorithm());
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);
        if let Some(expected) = issuer {
            if expected != self.config.issuer {
                debug!(kid, "Requested issuer differs from configured issuer");
                return Err(TokenError::invalid("issuer mismatch"));
            }
            validation.set_issuer(&[expected]);
        }

        let data = decode::<Map<String, Value>>(compact, key, &validation).map_err(|e| {
            debug!(kid, error = ?e.kind(), "Token rejected");
            map_decode_error(e.kind())
        })?;

        match data.claims.get("sub") {
            Some(Value::String(sub)) if !sub.trim().is_empty() => Ok(data.claims),
            _ => Err(TokenError::invalid("missing subject")),
        }
    }

    fn resolve(&self, kid: &str) -> Result<(&DecodingKey, KeyAlgorithm), TokenError> {
        let alias = self
            .registry
            .alias_for_key_id(kid)
            .map_err(|_| TokenError::invalid(format!("unknown key id '{kid}'")))?;
        let entry = self.registry.entry(alias)?;
        if entry.usage() != KeyUsage::Signing {
            return Err(TokenError::invalid(format!("key id '{kid}' is not a signing key")));
        }
        Ok((self.registry.decoding_key(alias)?, entry.algorithm()))
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.config.issuer)
            .field("active_signing_alias", &self.registry.active_signing_alias())
            .finish_non_exhaustive()
    }
}

fn strip_prefix(token: &str) -> &str {
    let token = token.trim();
    token.strip_prefix(TOKEN_PREFIX).unwrap_or(token).trim_start()
}

fn map_decode_error(kind: &ErrorKind) -> TokenError {
    let reason = match kind {
        ErrorKind::ExpiredSignature => "token expired".to_string(),
        ErrorKind::ImmatureSignature => "token not yet valid".to_string(),
        ErrorKind::InvalidSignature => "signature mismatch".to_string(),
        ErrorKind::InvalidIssuer => "issuer mismatch".to_string(),
        ErrorKind::InvalidAlgorithm => "algorithm does not match key".to_string(),
        ErrorKind::MissingRequiredClaim(claim) => format!("missing claim '{claim}'"),
        _ => "malformed token".to_string(),
    };
    TokenError::invalid(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("Bearer abc.def.ghi"), "abc.def.ghi");
        assert_eq!(strip_prefix("  Bearer   abc.def.ghi "), "abc.def.ghi");
        assert_eq!(strip_prefix("abc.def.ghi"), "abc.def.ghi");
    }

    #[test]
    fn test_decode_errors_are_token_invalid() {
        for kind in [
            ErrorKind::ExpiredSignature,
            ErrorKind::InvalidSignature,
            ErrorKind::InvalidIssuer,
            ErrorKind::InvalidToken,
            ErrorKind::MissingRequiredClaim("exp".to_string()),
        ] {
            assert!(map_decode_error(&kind).is_token_invalid());
        }
    }

    #[test]
    fn test_missing_claim_reason() {
        let err = map_decode_error(&ErrorKind::MissingRequiredClaim("exp".to_string()));
        assert!(err.to_string().contains("exp"));
    }
}
