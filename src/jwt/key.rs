//! Explicit verification keys.

use crate::error::TokenError;
use crate::keystore::{Certificate, KeyAlgorithm};
use jsonwebtoken::DecodingKey;

/// A public key supplied by the caller instead of being resolved through the registry,
/// e.g. one taken from another party's identity document.
#[derive(Clone)]
pub struct VerificationKey {
    key: DecodingKey,
    algorithm: KeyAlgorithm,
    key_id: String,
}

impl VerificationKey {
    /// Build from a parsed certificate.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the certificate's algorithm is unsupported.
    pub fn from_certificate(certificate: &Certificate) -> Result<Self, TokenError> {
        let (key, algorithm) = certificate.decoding_key()?;
        Ok(Self {
            key,
            algorithm,
            key_id: certificate.key_id(),
        })
    }

    /// Build from a DER-encoded certificate.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the certificate cannot be parsed or classified.
    pub fn from_certificate_der(der: &[u8]) -> Result<Self, TokenError> {
        Self::from_certificate(&Certificate::from_der(der)?)
    }

    #[must_use]
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Key id of the certificate the key came from.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationKey")
            .field("algorithm", &self.algorithm)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}
