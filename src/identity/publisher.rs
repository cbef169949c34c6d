use crate::config::{IdentityConfig, ServiceDescriptor};
use crate::error::TokenError;
use crate::identity::document::{
    IdentityDocument, PublicKeyJwk, ServiceEntry, VerificationMethod, VERIFICATION_TYPE,
};
use crate::keystore::{KeyRegistry, KeyRole};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// One side of the identity document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityElement {
    VerificationMethod,
    Service,
}

impl FromStr for IdentityElement {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("verificationMethod") {
            Ok(IdentityElement::VerificationMethod)
        } else if s.eq_ignore_ascii_case("service") {
            Ok(IdentityElement::Service)
        } else {
            Err(TokenError::not_found(format!("identity element '{s}'")))
        }
    }
}

/// Renders the key registry and configured services as an identity document.
pub struct IdentityPublisher {
    registry: Arc<KeyRegistry>,
    config: IdentityConfig,
    identity_url: String,
}

impl IdentityPublisher {
    pub fn new(registry: Arc<KeyRegistry>, config: IdentityConfig) -> Self {
        let identity_url = config.identity_url();
        IdentityPublisher {
            registry,
            config,
            identity_url,
        }
    }

    pub fn identity_url(&self) -> &str {
        &self.identity_url
    }

    /// Build the document, optionally restricted to one element and to an exact type.
    ///
    /// The type filter matches a service's type or the verification method type.
    /// Verification methods follow the registry's configured alias order (encryption
    /// keys, then signing keys); services are the configured services followed by the
    /// configured endpoints.
    ///
    /// # Errors
    ///
    /// `NotFound` for an element other than `verificationMethod` or `service`.
    pub fn identity_document(
        &self,
        element: Option<&str>,
        type_filter: Option<&str>,
    ) -> Result<IdentityDocument, TokenError> {
        let element = element
            .filter(|e| !e.trim().is_empty())
            .map(|e| e.trim().parse::<IdentityElement>())
            .transpose()?;
        let type_filter = type_filter.map(str::trim).filter(|t| !t.is_empty());

        let include = |wanted: IdentityElement| element.map_or(true, |e| e == wanted);

        let verification_method = if include(IdentityElement::VerificationMethod)
            && type_filter.map_or(true, |t| t == VERIFICATION_TYPE)
        {
            self.verification_methods()?
        } else {
            Vec::new()
        };

        let service = if include(IdentityElement::Service) {
            self.services()
                .filter(|s| type_filter.map_or(true, |t| t == s.service_type))
                .map(ServiceEntry::from)
                .collect()
        } else {
            Vec::new()
        };

        debug!(
            verification_methods = verification_method.len(),
            services = service.len(),
            "Identity document built"
        );

        Ok(IdentityDocument {
            id: self.identity_url.clone(),
            verification_method,
            service,
        })
    }

    /// Configured services followed by configured endpoints.
    pub fn services(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.config.services.iter().chain(self.config.endpoints.iter())
    }

    /// # Errors
    ///
    /// `NotFound` when no service or endpoint carries `id`.
    pub fn service_by_id(&self, id: &str) -> Result<&ServiceDescriptor, TokenError> {
        self.services()
            .find(|s| s.id == id)
            .ok_or_else(|| TokenError::not_found(format!("service '{id}'")))
    }

    fn verification_methods(&self) -> Result<Vec<VerificationMethod>, TokenError> {
        self.registry
            .aliases_by_role(KeyRole::All)
            .into_iter()
            .map(|alias| -> Result<VerificationMethod, TokenError> {
                let entry = self.registry.entry(alias)?;
                Ok(VerificationMethod {
                    id: format!("{}/verificationMethod/{VERIFICATION_TYPE}/{alias}", self.identity_url),
                    method_type: VERIFICATION_TYPE.to_string(),
                    controller: self.identity_url.clone(),
                    public_key_jwk: PublicKeyJwk {
                        x5c: entry.certificate_chain().iter().map(|c| c.to_base64()).collect(),
                        kid: entry.key_id().to_string(),
                        alg: entry.algorithm().as_str().to_string(),
                        key_use: entry.usage().as_str().to_string(),
                    },
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for IdentityPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityPublisher")
            .field("identity_url", &self.identity_url)
            .finish_non_exhaustive()
    }
}
