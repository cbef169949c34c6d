use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;

/// Random bytes per nonce.
pub const NONCE_LENGTH: usize = 16;

/// Fresh nonce for an initialization request: 16 CSPRNG bytes, standard base64.
pub fn generate_nonce() -> String {
    let mut rng = rand::thread_rng();
    let random_bytes: [u8; NONCE_LENGTH] = rng.gen();
    STANDARD.encode(random_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_nonce_decodes_to_sixteen_bytes() {
        let nonce = generate_nonce();
        assert_eq!(STANDARD.decode(&nonce).unwrap().len(), NONCE_LENGTH);
    }

    #[test]
    fn test_nonce_uniqueness() {
        let nonces: HashSet<String> = (0..1000).map(|_| generate_nonce()).collect();
        assert_eq!(nonces.len(), 1000);
    }
}
