pub mod document;
pub mod publisher;

pub use document::{IdentityDocument, PublicKeyJwk, ServiceEntry, VerificationMethod, VERIFICATION_TYPE};
pub use publisher::{IdentityElement, IdentityPublisher};
