pub mod claims;
pub mod key;
pub mod nonce;
pub mod service;

pub use claims::{AccessTokenClaims, AccessTokenConditions, TokenClaims};
pub use key::VerificationKey;
pub use nonce::generate_nonce;
pub use service::{TokenService, TOKEN_PREFIX};
