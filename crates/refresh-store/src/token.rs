use rand::RngCore;
use sha2::{Digest, Sha256};

/// Minimum entropy spec.md §4.B requires for an opaque refresh token: 256
/// bits.
const TOKEN_BYTES: usize = 32;

/// Generates a fresh opaque refresh token value, URL-safe base64 encoded.
pub fn generate_opaque_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64_url_encode(&bytes)
}

/// Hashes a presented token for storage/lookup. Only the hash is ever
/// persisted — the raw value exists solely in the response to the client.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn base64_url_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique_and_long_enough() {
        let a = generate_opaque_token();
        let b = generate_opaque_token();
        assert_ne!(a, b);
        // base64 (no padding) of 32 bytes is 43 chars.
        assert_eq!(a.len(), 43);
    }

    #[test]
    fn hash_is_deterministic() {
        let token = generate_opaque_token();
        assert_eq!(hash_token(&token), hash_token(&token));
    }
}
