//! Prometheus metrics for the access token service.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_int_gauge_vec, CounterVec, IntGaugeVec};

/// Keys loaded from the key store.
pub static KEYS_LOADED: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "access_token_service_keys_loaded",
        "Number of keys loaded from the key store",
        &["usage"]
    )
    .expect("Failed to register keys_loaded metric")
});

/// Tokens minted counter.
pub static TOKENS_MINTED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "access_token_service_tokens_minted_total",
        "Total number of tokens minted",
        &["algorithm"]
    )
    .expect("Failed to register tokens_minted metric")
});

/// Token validations counter.
pub static TOKEN_VALIDATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "access_token_service_token_validations_total",
        "Total number of token validations",
        &["outcome"]
    )
    .expect("Failed to register token_validations metric")
});

/// Record a minted token.
pub fn record_mint(algorithm: &str) {
    TOKENS_MINTED.with_label_values(&[algorithm]).inc();
}

/// Record a validation outcome.
pub fn record_validation(valid: bool) {
    let outcome = if valid { "valid" } else { "invalid" };
    TOKEN_VALIDATIONS.with_label_values(&[outcome]).inc();
}

/// Encode all registered metrics in the Prometheus text format.
#[must_use]
pub fn gather() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&prometheus::gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_mint_increments() {
        let before = TOKENS_MINTED.with_label_values(&["ES256"]).get();
        record_mint("ES256");
        let after = TOKENS_MINTED.with_label_values(&["ES256"]).get();
        assert!(after >= before + 1.0);
    }

    #[test]
    fn test_gather_contains_registered_metrics() {
        record_validation(true);
        let text = gather();
        assert!(text.contains("access_token_service_token_validations_total"));
    }
}
