pub mod certificate;
pub mod loader;
pub mod registry;

pub use certificate::{derive_key_id, Certificate, KeyAlgorithm};
pub use loader::KeyStoreLoader;
pub use registry::{KeyEntry, KeyRegistry, KeyRole, KeyUsage, PrivateKey};
