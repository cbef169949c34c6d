//! Read-only key registry.
//!
//! Built once by the loader, then shared behind an `Arc` by the token
//! service and the identity publisher. Nothing mutates it after construction.

use crate::error::TokenError;
use crate::keystore::certificate::{Certificate, KeyAlgorithm};
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::collections::HashMap;
use tracing::info;
use zeroize::Zeroizing;

/// Whether a key is designated for signing or for encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyUsage {
    Signing,
    Encryption,
}

impl KeyUsage {
    /// Lowercase JWK `use` value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Signing => "sig",
            Self::Encryption => "enc",
        }
    }
}

/// Selector for [`KeyRegistry::aliases_by_role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    Signing,
    Encryption,
    All,
}

impl KeyRole {
    fn admits(self, usage: KeyUsage) -> bool {
        match self {
            Self::All => true,
            Self::Signing => usage == KeyUsage::Signing,
            Self::Encryption => usage == KeyUsage::Encryption,
        }
    }
}

/// Private half of a key pair, ready for signing.
pub struct PrivateKey {
    pkcs8_der: Zeroizing<Vec<u8>>,
    encoding_key: EncodingKey,
}

impl PrivateKey {
    /// Wrap a PKCS#8 DER private key for the given algorithm.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key does not fit the algorithm.
    pub fn from_pkcs8_der(der: Zeroizing<Vec<u8>>, algorithm: KeyAlgorithm) -> Result<Self, TokenError> {
        let pem = Zeroizing::new(pem::encode(&pem::Pem::new("PRIVATE KEY", der.to_vec())));
        let encoding_key = match algorithm {
            KeyAlgorithm::ES256 => EncodingKey::from_ec_pem(pem.as_bytes()),
            KeyAlgorithm::RS256 | KeyAlgorithm::PS256 => EncodingKey::from_rsa_pem(pem.as_bytes()),
        }
        .map_err(|e| TokenError::config(format!("Private key unusable for {algorithm}: {e}")))?;

        Ok(Self {
            pkcs8_der: der,
            encoding_key,
        })
    }

    /// PKCS#8 DER encoding.
    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.pkcs8_der
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

/// Everything known about one alias.
#[derive(Debug)]
pub struct KeyEntry {
    alias: String,
    private_key: Option<PrivateKey>,
    certificate_chain: Vec<Certificate>,
    key_id: String,
    algorithm: KeyAlgorithm,
    usage: KeyUsage,
}

impl KeyEntry {
    /// Build an entry from a leaf certificate; the key id and algorithm are derived from it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the leaf's algorithm is not supported.
    pub fn new(
        alias: impl Into<String>,
        leaf: Certificate,
        private_key: Option<PrivateKey>,
        usage: KeyUsage,
    ) -> Result<Self, TokenError> {
        let algorithm = leaf.algorithm()?;
        Ok(Self {
            alias: alias.into(),
            private_key,
            key_id: leaf.key_id(),
            certificate_chain: vec![leaf],
            algorithm,
            usage,
        })
    }

    /// Append an additional certificate to the chain.
    pub fn push_certificate(&mut self, certificate: Certificate) {
        self.certificate_chain.push(certificate);
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    #[must_use]
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn usage(&self) -> KeyUsage {
        self.usage
    }

    #[must_use]
    pub fn certificate_chain(&self) -> &[Certificate] {
        &self.certificate_chain
    }

    #[must_use]
    pub fn private_key(&self) -> Option<&PrivateKey> {
        self.private_key.as_ref()
    }

    /// Leaf certificate; the chain is never empty.
    #[must_use]
    pub fn leaf(&self) -> &Certificate {
        &self.certificate_chain[0]
    }
}

/// Lookup surface over the loaded key entries.
pub struct KeyRegistry {
    entries: HashMap<String, KeyEntry>,
    order: Vec<String>,
    alias_by_kid: HashMap<String, String>,
    decoding_keys: HashMap<String, DecodingKey>,
    active_signing_alias: String,
}

impl KeyRegistry {
    /// Build the registry from entries in configured order.
    ///
    /// # Errors
    ///
    /// Returns a configuration error on duplicate aliases, two signing keys
    /// sharing a key id, or an active signing alias that is not a loaded
    /// signing key.
    pub fn new(entries: Vec<KeyEntry>, active_signing_alias: impl Into<String>) -> Result<Self, TokenError> {
        let active_signing_alias = active_signing_alias.into();
        let mut map: HashMap<String, KeyEntry> = HashMap::with_capacity(entries.len());
        let mut order = Vec::with_capacity(entries.len());
        let mut alias_by_kid: HashMap<String, String> = HashMap::new();
        let mut decoding_keys: HashMap<String, DecodingKey> = HashMap::with_capacity(entries.len());

        for entry in entries {
            if map.contains_key(entry.alias()) {
                return Err(TokenError::config(format!("Duplicate key alias '{}'", entry.alias())));
            }

            match alias_by_kid.get(entry.key_id()).cloned() {
                Some(existing) => {
                    let existing_is_signing = map
                        .get(&existing)
                        .is_some_and(|e| e.usage() == KeyUsage::Signing);
                    if existing_is_signing && entry.usage() == KeyUsage::Signing {
                        return Err(TokenError::config(format!(
                            "Aliases '{}' and '{}' share key id '{}'",
                            existing,
                            entry.alias(),
                            entry.key_id()
                        )));
                    }
                    if entry.usage() == KeyUsage::Signing {
                        alias_by_kid.insert(entry.key_id().to_string(), entry.alias().to_string());
                    }
                }
                None => {
                    alias_by_kid.insert(entry.key_id().to_string(), entry.alias().to_string());
                }
            }

            let (decoding_key, _) = entry.leaf().decoding_key()?;
            decoding_keys.insert(entry.alias().to_string(), decoding_key);
            order.push(entry.alias().to_string());
            map.insert(entry.alias().to_string(), entry);
        }

        match map.get(&active_signing_alias) {
            Some(entry) if entry.usage() == KeyUsage::Signing => {}
            Some(_) => {
                return Err(TokenError::config(format!(
                    "Active signing alias '{active_signing_alias}' is configured as an encryption key"
                )))
            }
            None => {
                return Err(TokenError::config(format!(
                    "Active signing alias '{active_signing_alias}' not found in key store"
                )))
            }
        }

        info!(
            keys = order.len(),
            active_signing_alias = %active_signing_alias,
            "Key registry initialized"
        );

        Ok(Self {
            entries: map,
            order,
            alias_by_kid,
            decoding_keys,
            active_signing_alias,
        })
    }

    /// Full entry for an alias.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the alias is unknown.
    pub fn entry(&self, alias: &str) -> Result<&KeyEntry, TokenError> {
        self.entries
            .get(alias)
            .ok_or_else(|| TokenError::not_found(format!("key alias '{alias}'")))
    }

    /// Certificate chain, leaf first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the alias is unknown.
    pub fn certificate_chain(&self, alias: &str) -> Result<&[Certificate], TokenError> {
        Ok(self.entry(alias)?.certificate_chain())
    }

    /// Private key of an alias.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the alias is unknown or holds only a certificate.
    pub fn private_key(&self, alias: &str) -> Result<&PrivateKey, TokenError> {
        self.entry(alias)?
            .private_key()
            .ok_or_else(|| TokenError::not_found(format!("private key for alias '{alias}'")))
    }

    /// Key id of an alias.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the alias is unknown.
    pub fn key_id(&self, alias: &str) -> Result<&str, TokenError> {
        Ok(self.entry(alias)?.key_id())
    }

    /// Algorithm of an alias.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the alias is unknown.
    pub fn algorithm(&self, alias: &str) -> Result<KeyAlgorithm, TokenError> {
        Ok(self.entry(alias)?.algorithm())
    }

    /// Usage of an alias.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the alias is unknown.
    pub fn usage(&self, alias: &str) -> Result<KeyUsage, TokenError> {
        Ok(self.entry(alias)?.usage())
    }

    /// Inverse of [`Self::key_id`].
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no alias carries this key id.
    pub fn alias_for_key_id(&self, kid: &str) -> Result<&str, TokenError> {
        self.alias_by_kid
            .get(kid)
            .map(String::as_str)
            .ok_or_else(|| TokenError::not_found(format!("key id '{kid}'")))
    }

    /// Aliases in configured order, filtered by role.
    #[must_use]
    pub fn aliases_by_role(&self, role: KeyRole) -> Vec<&str> {
        self.order
            .iter()
            .filter(|alias| self.entries.get(alias.as_str()).is_some_and(|e| role.admits(e.usage())))
            .map(String::as_str)
            .collect()
    }

    /// Alias used for every newly minted token.
    #[must_use]
    pub fn active_signing_alias(&self) -> &str {
        &self.active_signing_alias
    }

    /// Number of loaded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn decoding_key(&self, alias: &str) -> Result<&DecodingKey, TokenError> {
        self.decoding_keys
            .get(alias)
            .ok_or_else(|| TokenError::not_found(format!("key alias '{alias}'")))
    }
}

impl std::fmt::Debug for KeyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRegistry")
            .field("aliases", &self.order)
            .field("active_signing_alias", &self.active_signing_alias)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_usage_strings() {
        assert_eq!(KeyUsage::Signing.as_str(), "sig");
        assert_eq!(KeyUsage::Encryption.as_str(), "enc");
    }

    #[test]
    fn test_role_filter() {
        assert!(KeyRole::All.admits(KeyUsage::Encryption));
        assert!(KeyRole::Signing.admits(KeyUsage::Signing));
        assert!(!KeyRole::Signing.admits(KeyUsage::Encryption));
        assert!(!KeyRole::Encryption.admits(KeyUsage::Signing));
    }

    #[test]
    fn test_empty_registry_rejects_active_alias() {
        let err = KeyRegistry::new(Vec::new(), "sign1").unwrap_err();
        assert!(err.is_fatal());
    }
}
