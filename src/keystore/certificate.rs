//! X.509 certificate handling: key-id derivation and algorithm classification.

use crate::error::TokenError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::{Algorithm, DecodingKey};
use sha2::{Digest, Sha256};
use x509_parser::prelude::*;

/// Number of SHA-256 bytes kept for a key id.
pub const KEY_ID_LENGTH: usize = 8;

const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
const OID_SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
const OID_RSASSA_PSS: &str = "1.2.840.113549.1.1.10";
const OID_ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";

/// Signature OID to token algorithm. Anything not listed is rejected at load time.
const SIGNATURE_ALGORITHMS: &[(&str, KeyAlgorithm)] = &[
    (OID_RSA_ENCRYPTION, KeyAlgorithm::RS256),
    (OID_SHA256_WITH_RSA, KeyAlgorithm::RS256),
    (OID_RSASSA_PSS, KeyAlgorithm::PS256),
    (OID_ECDSA_WITH_SHA256, KeyAlgorithm::ES256),
];

/// Token signing algorithm of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    /// RSA with SHA-256
    RS256,
    /// RSA-PSS with SHA-256
    PS256,
    /// ECDSA with P-256 and SHA-256
    ES256,
}

impl KeyAlgorithm {
    /// Resolve the algorithm for a certificate signature OID.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for any OID outside the mapping table.
    pub fn from_signature_oid(oid: &str) -> Result<Self, TokenError> {
        SIGNATURE_ALGORITHMS
            .iter()
            .find(|(known, _)| *known == oid)
            .map(|(_, alg)| *alg)
            .ok_or_else(|| TokenError::config(format!("Unsupported signature algorithm OID '{oid}'")))
    }

    /// Get algorithm name for JWT header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::PS256 => "PS256",
            Self::ES256 => "ES256",
        }
    }

    /// The matching `jsonwebtoken` algorithm.
    #[must_use]
    pub const fn jwt_algorithm(&self) -> Algorithm {
        match self {
            Self::RS256 => Algorithm::RS256,
            Self::PS256 => Algorithm::PS256,
            Self::ES256 => Algorithm::ES256,
        }
    }

    const fn is_rsa(&self) -> bool {
        matches!(self, Self::RS256 | Self::PS256)
    }
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the key id of a DER-encoded certificate.
///
/// Standard base64 of the first [`KEY_ID_LENGTH`] bytes of SHA-256 over the DER.
#[must_use]
pub fn derive_key_id(der: &[u8]) -> String {
    let hash = Sha256::digest(der);
    STANDARD.encode(&hash[..KEY_ID_LENGTH])
}

/// A parsed X.509 certificate kept in DER form.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    signature_oid: String,
    public_key_oid: String,
    public_key: Vec<u8>,
}

impl Certificate {
    /// Parse a DER-encoded certificate.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the bytes are not a certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, TokenError> {
        let (rest, cert) = X509Certificate::from_der(der)
            .map_err(|e| TokenError::config(format!("Failed to parse certificate: {e}")))?;
        if !rest.is_empty() {
            return Err(TokenError::config("Trailing data after certificate"));
        }

        let spki = cert.public_key();
        Ok(Self {
            der: der.to_vec(),
            subject: cert.subject().to_string(),
            signature_oid: cert.signature_algorithm.algorithm.to_id_string(),
            public_key_oid: spki.algorithm.algorithm.to_id_string(),
            public_key: spki.subject_public_key.data.to_vec(),
        })
    }

    /// Parse a standard base64 DER certificate, as published in `x5c`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if decoding or parsing fails.
    pub fn from_base64(encoded: &str) -> Result<Self, TokenError> {
        let der = STANDARD
            .decode(encoded)
            .map_err(|e| TokenError::config(format!("Invalid certificate encoding: {e}")))?;
        Self::from_der(&der)
    }

    /// DER encoding.
    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// Standard base64 of the DER encoding.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.der)
    }




    /// Key id derived from this certificate.
    #[must_use]
    pub fn key_id(&self) -> String {
        derive_key_id(&self.der)
    }

    /// Classify the certificate's algorithm and check the key family agrees.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unknown OIDs or a key that cannot
    /// produce signatures of the classified algorithm.
    pub fn algorithm(&self) -> Result<KeyAlgorithm, TokenError> {
        let alg = KeyAlgorithm::from_signature_oid(&self.signature_oid)?;
        let family_matches = if alg.is_rsa() {
            self.public_key_oid == OID_RSA_ENCRYPTION || self.public_key_oid == OID_RSASSA_PSS
        } else {
            self.public_key_oid == OID_EC_PUBLIC_KEY
        };
        if !family_matches {
            return Err(TokenError::config(format!(
                "Certificate '{}' signed with {} carries a {} public key",
                self.subject, alg, self.public_key_oid
            )));
        }
        Ok(alg)
    }

    /// Build the verification key for tokens signed by this certificate's key.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the algorithm cannot be classified.
    pub fn decoding_key(&self) -> Result<(DecodingKey, KeyAlgorithm), TokenError> {
        let alg = self.algorithm()?;
        let key = if alg.is_rsa() {
            DecodingKey::from_rsa_der(&self.public_key)
        } else {
            DecodingKey::from_ec_der(&self.public_key)
        };
        Ok((key, alg))
    }
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject)
            .field("signature_oid", &self.signature_oid)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_mapping_table() {
        assert_eq!(KeyAlgorithm::from_signature_oid("1.2.840.113549.1.1.1").unwrap(), KeyAlgorithm::RS256);
        assert_eq!(KeyAlgorithm::from_signature_oid("1.2.840.113549.1.1.11").unwrap(), KeyAlgorithm::RS256);
        assert_eq!(KeyAlgorithm::from_signature_oid("1.2.840.113549.1.1.10").unwrap(), KeyAlgorithm::PS256);
        assert_eq!(KeyAlgorithm::from_signature_oid("1.2.840.10045.4.3.2").unwrap(), KeyAlgorithm::ES256);
    }

    #[test]
    fn test_unknown_oid_is_configuration_error() {
        // Ed25519
        let err = KeyAlgorithm::from_signature_oid("1.3.101.112").unwrap_err();
        assert!(err.is_fatal());
        // ecdsa-with-SHA384 is a prefix match trap for naive comparisons
        assert!(KeyAlgorithm::from_signature_oid("1.2.840.10045.4.3.3").is_err());
    }

    #[test]
    fn test_key_id_is_deterministic_and_short() {
        let der = b"not really a certificate";
        let a = derive_key_id(der);
        let b = derive_key_id(der);
        assert_eq!(a, b);
        // 8 bytes in standard base64
        assert_eq!(a.len(), 12);
        assert_ne!(a, derive_key_id(b"another input"));
    }

    #[test]
    fn test_garbage_is_not_a_certificate() {
        assert!(Certificate::from_der(&[0x30, 0x03, 0x02, 0x01, 0x00]).is_err());
        assert!(Certificate::from_base64("***").is_err());
    }

    #[test]
    fn test_algorithm_display() {
        assert_eq!(KeyAlgorithm::PS256.to_string(), "PS256");
        assert_eq!(KeyAlgorithm::ES256.jwt_algorithm(), Algorithm::ES256);
    }
}
