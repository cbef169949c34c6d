//! Discovery document wire types.

use crate::config::ServiceDescriptor;
use serde::{Deserialize, Serialize};

/// Verification method type of every published key.
pub const VERIFICATION_TYPE: &str = "JsonWebKey2020";

/// Public key material of one key alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyJwk {
    /// Certificate chain, leaf first, standard base64 DER
    pub x5c: Vec<String>,
    pub kid: String,
    pub alg: String,
    #[serde(rename = "use")]
    pub key_use: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub controller: String,
    pub public_key_jwk: PublicKeyJwk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
    pub name: String,
}

impl From<&ServiceDescriptor> for ServiceEntry {
    fn from(descriptor: &ServiceDescriptor) -> Self {
        ServiceEntry {
            id: descriptor.id.clone(),
            service_type: descriptor.service_type.clone(),
            service_endpoint: descriptor.service_endpoint.clone(),
            name: descriptor.name.clone(),
        }
    }
}

/// Identity document published at `{service_url}/identity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDocument {
    pub id: String,
    pub verification_method: Vec<VerificationMethod>,
    pub service: Vec<ServiceEntry>,
}

impl IdentityDocument {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let document = IdentityDocument {
            id: "https://decorator.example/identity".to_string(),
            verification_method: vec![VerificationMethod {
                id: "https://decorator.example/identity/verificationMethod/JsonWebKey2020/sign1".to_string(),
                method_type: VERIFICATION_TYPE.to_string(),
                controller: "https://decorator.example/identity".to_string(),
                public_key_jwk: PublicKeyJwk {
                    x5c: vec!["MIIB".to_string()],
                    kid: "ZjuY7Xt+ENg=".to_string(),
                    alg: "ES256".to_string(),
                    key_use: "sig".to_string(),
                },
            }],
            service: vec![ServiceEntry::from(&ServiceDescriptor::new(
                "https://decorator.example/#ValidationService",
                "ValidationService",
                "https://decorator.example/validate",
                "Validation",
            ))],
        };

        let json: serde_json::Value = serde_json::from_str(&document.to_json()).unwrap();
        assert_eq!(json["verificationMethod"][0]["type"], "JsonWebKey2020");
        assert_eq!(json["verificationMethod"][0]["publicKeyJwk"]["use"], "sig");
        assert_eq!(json["verificationMethod"][0]["publicKeyJwk"]["x5c"][0], "MIIB");
        assert_eq!(json["service"][0]["serviceEndpoint"], "https://decorator.example/validate");
        assert_eq!(json["service"][0]["type"], "ValidationService");
    }
}
