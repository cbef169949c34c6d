//! Identity document rendering and filtering.

use access_token_service::config::{IdentityConfig, KeyStoreConfig, ServiceDescriptor, TokenConfig};
use access_token_service::identity::VERIFICATION_TYPE;
use access_token_service::jwt::VerificationKey;
use access_token_service::keystore::Certificate;
use access_token_service::{CoreServices, TokenError};
use once_cell::sync::Lazy;
use proptest::prelude::*;
use std::path::PathBuf;

const SERVICE_URL: &str = "https://decorator.example";
const IDENTITY_URL: &str = "https://decorator.example/identity";

static CORE: Lazy<CoreServices> = Lazy::new(|| {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/keystore.pem");
    let sign = ["sign1", "sign1_2", "sign2", "sign3"].iter().map(|a| a.to_string()).collect();
    let key_store = KeyStoreConfig::new(path, sign)
        .with_enc_aliases(vec!["enc1".to_string()])
        .with_store_password("store-secret")
        .with_key_password("key-secret");

    let identity = IdentityConfig::new(SERVICE_URL)
        .with_service(ServiceDescriptor::new(
            "https://decorator.example/#AccessTokenService",
            "AccessTokenService",
            "https://decorator.example/token",
            "Access Token Service",
        ))
        .with_service(ServiceDescriptor::new(
            "https://decorator.example/#ValidationService",
            "ValidationService",
            "https://validation.example/validate",
            "Validation Service",
        ))
        .with_endpoint(ServiceDescriptor::new(
            "https://decorator.example/#ServiceProvider",
            "ServiceProvider",
            "https://decorator.example",
            "Service Provider",
        ));

    CoreServices::from_parts(&key_store, TokenConfig::new("https://issuer.example"), identity).unwrap()
});

#[test]
fn test_unfiltered_document() {
    let document = CORE.identity_document(None, None).unwrap();

    assert_eq!(document.id, IDENTITY_URL);
    let aliases: Vec<&str> = document
        .verification_method
        .iter()
        .map(|m| m.id.rsplit('/').next().unwrap())
        .collect();
    assert_eq!(aliases, vec!["enc1", "sign1", "sign2", "sign3"]);

    let services: Vec<&str> = document.service.iter().map(|s| s.service_type.as_str()).collect();
    assert_eq!(services, vec!["AccessTokenService", "ValidationService", "ServiceProvider"]);
}

#[test]
fn test_verification_method_shape() {
    let document = CORE.identity_document(Some("verificationMethod"), None).unwrap();
    let sign1 = &document.verification_method[1];

    assert_eq!(sign1.id, format!("{IDENTITY_URL}/verificationMethod/JsonWebKey2020/sign1"));
    assert_eq!(sign1.method_type, VERIFICATION_TYPE);
    assert_eq!(sign1.controller, IDENTITY_URL);
    assert_eq!(sign1.public_key_jwk.kid, "ZjuY7Xt+ENg=");
    assert_eq!(sign1.public_key_jwk.alg, "ES256");
    assert_eq!(sign1.public_key_jwk.key_use, "sig");
    assert_eq!(sign1.public_key_jwk.x5c.len(), 2);

    let enc1 = &document.verification_method[0];
    assert_eq!(enc1.public_key_jwk.key_use, "enc");
    assert_eq!(enc1.public_key_jwk.kid, "3Kd5tKDI8yw=");
}

#[test]
fn test_element_filter() {
    let methods = CORE.identity_document(Some("verificationMethod"), None).unwrap();
    assert_eq!(methods.verification_method.len(), 4);
    assert!(methods.service.is_empty());

    let services = CORE.identity_document(Some("service"), None).unwrap();
    assert!(services.verification_method.is_empty());
    assert_eq!(services.service.len(), 3);
}

#[test]
fn test_type_filter() {
    let document = CORE.identity_document(None, Some("ValidationService")).unwrap();
    assert!(document.verification_method.is_empty());
    assert_eq!(document.service.len(), 1);
    assert_eq!(document.service[0].service_endpoint, "https://validation.example/validate");

    let document = CORE.identity_document(None, Some(VERIFICATION_TYPE)).unwrap();
    assert_eq!(document.verification_method.len(), 4);
    assert!(document.service.is_empty());
}

#[test]
fn test_unknown_element() {
    let err = CORE.identity_document(Some("keys"), None).unwrap_err();
    assert!(matches!(err, TokenError::NotFound(_)));
}

#[test]
fn test_document_is_deterministic() {
    let first = CORE.identity_document(None, None).unwrap().to_json();
    let second = CORE.identity_document(None, None).unwrap().to_json();
    assert_eq!(first, second);
}

#[test]
fn test_service_by_id() {
    let publisher = CORE.identity();
    let service = publisher.service_by_id("https://decorator.example/#ServiceProvider").unwrap();
    assert_eq!(service.name, "Service Provider");

    assert!(matches!(publisher.service_by_id("unknown"), Err(TokenError::NotFound(_))));
}

#[test]
fn test_published_certificate_verifies_minted_token() {
    let token = CORE.mint_token("user-42", None).unwrap();
    let document = CORE.identity_document(Some("verificationMethod"), None).unwrap();
    let kid = CORE.parse_unsecured(&token).unwrap()["kid"].as_str().unwrap().to_string();

    let method = document
        .verification_method
        .iter()
        .find(|m| m.public_key_jwk.kid == kid)
        .unwrap();
    let leaf = Certificate::from_base64(&method.public_key_jwk.x5c[0]).unwrap();
    assert_eq!(leaf.key_id(), kid);

    let key = VerificationKey::from_certificate(&leaf).unwrap();
    let claims = CORE
        .tokens()
        .validate_with_key(&token, &key, Some("https://issuer.example"))
        .unwrap();
    assert_eq!(claims["sub"], "user-42");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Type filtering only ever selects, never alters entries.
    #[test]
    fn prop_type_filter_selects(type_filter in prop_oneof![
        Just("ValidationService".to_string()),
        Just("ServiceProvider".to_string()),
        Just(VERIFICATION_TYPE.to_string()),
        "[A-Za-z]{1,24}",
    ]) {
        let full = CORE.identity_document(None, None).unwrap();
        let filtered = CORE.identity_document(None, Some(&type_filter)).unwrap();

        for service in &filtered.service {
            prop_assert_eq!(&service.service_type, &type_filter);
            prop_assert!(full.service.contains(service));
        }
        let expected_methods = if type_filter == VERIFICATION_TYPE { full.verification_method.len() } else { 0 };
        prop_assert_eq!(filtered.verification_method.len(), expected_methods);
    }
}
