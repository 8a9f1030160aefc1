pub mod fingerprint;
pub mod store;

use std::fmt;

use rand::Rng;
use zeroize::Zeroizing;

/// Length of an Ed25519 seed in bytes.
pub const SEED_LEN: usize = 32;

/// The private key carried inside every container: an Ed25519 signing key.
#[derive(Clone)]
pub struct PrivateKey {
    signing_key: ed25519_dalek::SigningKey,
}

impl PrivateKey {
    pub fn generate() -> Self {
        let seed = Zeroizing::new(rand::thread_rng().gen::<[u8; SEED_LEN]>());
        Self::from_seed(&seed)
    }

    pub fn from_seed(seed: &[u8; SEED_LEN]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Build a key from a decrypted payload, which must be exactly one seed.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let seed: &[u8; SEED_LEN] = bytes.try_into().ok()?;
        Some(Self::from_seed(seed))
    }

    pub fn seed(&self) -> Zeroizing<[u8; SEED_LEN]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        *self.seed() == *other.seed()
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({})", fingerprint::short_fingerprint(self))
    }
}
