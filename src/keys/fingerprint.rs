use base64::Engine;
use sha2::{Digest, Sha256};

use super::PrivateKey;

/// First 8 characters of the URL-safe base64 SHA-256 of the public key.
pub fn short_fingerprint(key: &PrivateKey) -> String {
    let digest = Sha256::digest(key.public_key_bytes());
    let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest);
    encoded[..8].to_string()
}
