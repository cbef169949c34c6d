//! Access token service library.
//!
//! Loads signing and encryption keys from a sealed PEM key store, mints and
//! validates signed access tokens, and publishes the public key material as
//! an identity document.

#![forbid(unsafe_code)]

pub mod app;
pub mod config;
pub mod error;
pub mod identity;
pub mod jwt;
pub mod keystore;
pub mod metrics;

// Re-exports for convenience
pub use app::CoreServices;
pub use config::Config;
pub use error::TokenError;
pub use identity::{IdentityDocument, IdentityPublisher};
pub use jwt::{TokenClaims, TokenService};
pub use keystore::{KeyRegistry, KeyRole, KeyStoreLoader, KeyUsage};
