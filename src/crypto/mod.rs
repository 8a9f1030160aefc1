//! Crypto module: passphrase-derived age identities.
//!
//! A passphrase (arbitrary bytes, possibly empty, possibly containing zero
//! bytes) is stretched with Argon2id over a random salt, expanded with
//! HKDF-SHA256, and the 32-byte result is used as an X25519 secret scalar for
//! an age identity. The container is encrypted to that identity's recipient,
//! so only the exact same passphrase bytes reproduce the identity that opens it.

use argon2::{Algorithm, Argon2, Params, Version};
use bech32::{ToBase32, Variant};
use hkdf::Hkdf;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::io::Write;
use zeroize::Zeroizing;

/// HKDF info string for key-encryption-key derivation.
const KEK_HKDF_INFO: &[u8] = b"keyphrase-kek-v1";

/// Length of the random KDF salt stored in both encodings.
pub const SALT_LEN: usize = 32;

/// Default Argon2id memory cost (64 MB).
pub const KDF_M_COST: u32 = 65536;

/// Default Argon2id iteration count.
pub const KDF_T_COST: u32 = 3;

/// Default Argon2id parallelism.
pub const KDF_P_COST: u32 = 1;

/// Largest accepted Argon2id memory cost: 1 GiB in KiB. Stored parameters
/// are read back from key files, so this caps the allocation a file can demand.
pub const MAX_M_COST: u32 = 1 << 20;

/// Largest accepted Argon2id iteration count.
pub const MAX_T_COST: u32 = 64;

/// Argon2id cost parameters. Written into every container so decryption
/// never depends on the defaults in effect at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KdfParams {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: KDF_M_COST,
            t_cost: KDF_T_COST,
            p_cost: KDF_P_COST,
        }
    }
}

impl KdfParams {
    pub fn new(m_cost: u32, t_cost: u32, p_cost: u32) -> Self {
        Self {
            m_cost,
            t_cost,
            p_cost,
        }
    }

    /// Check the parameters against Argon2's limits and the work caps.
    ///
    /// The same rule applies when writing and when reading, so anything this
    /// accepts for encryption can be decrypted again.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.m_cost > MAX_M_COST || self.t_cost > MAX_T_COST {
            anyhow::bail!(
                "KDF parameters out of range (m_cost={} max {}, t_cost={} max {})",
                self.m_cost,
                MAX_M_COST,
                self.t_cost,
                MAX_T_COST
            );
        }
        self.argon2_params().map(|_| ())
    }

    fn argon2_params(&self) -> anyhow::Result<Params> {
        Params::new(self.m_cost, self.t_cost, self.p_cost, Some(32))
            .map_err(|e| anyhow::anyhow!("argon2 params error: {}", e))
    }
}

/// Generate a fresh random salt.
pub fn random_salt() -> [u8; SALT_LEN] {
    rand::thread_rng().gen()
}

/// Derive a 32-byte key-encryption key from passphrase bytes and a salt using
/// Argon2id + HKDF-SHA256.
///
/// Deterministic: the same bytes, salt, and parameters always produce the same key.
pub fn derive_kek(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> anyhow::Result<Zeroizing<[u8; 32]>> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.argon2_params()?);

    let mut argon2_output = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase, salt, argon2_output.as_mut())
        .map_err(|e| anyhow::anyhow!("argon2 hash error: {}", e))?;

    let hkdf = Hkdf::<Sha256>::new(None, &*argon2_output);
    let mut okm = Zeroizing::new([0u8; 32]);
    hkdf.expand(KEK_HKDF_INFO, okm.as_mut())
        .map_err(|e| anyhow::anyhow!("hkdf expand error: {}", e))?;

    Ok(okm)
}

/// Construct an age X25519 Identity from a 32-byte secret scalar.
///
/// Bech32-encodes the scalar with the "age-secret-key-" HRP as required by
/// the age x25519 format, then parses the string into an Identity.
pub fn age_identity(x25519_secret: &[u8; 32]) -> anyhow::Result<age::x25519::Identity> {
    let encoded = Zeroizing::new(
        bech32::encode(
            "age-secret-key-",
            x25519_secret.to_base32(),
            Variant::Bech32,
        )
        .map_err(|e| anyhow::anyhow!("bech32 encode error: {}", e))?,
    );
    // age parses the identity case-insensitively; uppercase is the canonical form
    encoded
        .to_ascii_uppercase()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid age identity: {}", e))
}

/// Encrypt plaintext with an age X25519 Recipient.
///
/// Returns the full age ciphertext including the header.
pub fn age_encrypt(
    plaintext: &[u8],
    recipient: &age::x25519::Recipient,
) -> anyhow::Result<Vec<u8>> {
    let encryptor =
        age::Encryptor::with_recipients(std::iter::once(recipient as &dyn age::Recipient))
            .map_err(|e| anyhow::anyhow!("age encryptor error: {}", e))?;
    let mut ciphertext = vec![];
    let mut writer = encryptor.wrap_output(&mut ciphertext)?;
    writer.write_all(plaintext)?;
    writer.finish()?;
    Ok(ciphertext)
}

/// Decrypt age ciphertext with an age X25519 Identity.
///
/// Returns an error if the identity does not match or the ciphertext is malformed.
pub fn age_decrypt(
    ciphertext: &[u8],
    identity: &age::x25519::Identity,
) -> anyhow::Result<Zeroizing<Vec<u8>>> {
    let decryptor = age::Decryptor::new(ciphertext)
        .map_err(|e| anyhow::anyhow!("age decryptor error: {}", e))?;
    let mut reader = decryptor
        .decrypt(std::iter::once(identity as &dyn age::Identity))
        .map_err(|e| anyhow::anyhow!("age decrypt error: {}", e))?;
    let mut plaintext = Zeroizing::new(vec![]);
    std::io::Read::read_to_end(&mut reader, &mut plaintext)?;
    Ok(plaintext)
}

/// Encrypt `plaintext` under a key derived from `passphrase`, `salt`, and `params`.
pub fn seal(
    plaintext: &[u8],
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> anyhow::Result<Vec<u8>> {
    let kek = derive_kek(passphrase, salt, params)?;
    let identity = age_identity(&kek)?;
    age_encrypt(plaintext, &identity.to_public())
}

/// Error returned by [`open`], split so callers can tell a wrong passphrase
/// from a broken parameter set.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("key derivation failed: {0}")]
    Kdf(anyhow::Error),

    #[error("wrong passphrase or corrupted ciphertext")]
    Unlock,
}

/// Decrypt ciphertext produced by [`seal`].
pub fn open(
    ciphertext: &[u8],
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<Zeroizing<Vec<u8>>, OpenError> {
    let kek = derive_kek(passphrase, salt, params).map_err(OpenError::Kdf)?;
    let identity = age_identity(&kek).map_err(OpenError::Kdf)?;
    // age error details would only distinguish header damage from a non-matching identity
    age_decrypt(ciphertext, &identity).map_err(|_| OpenError::Unlock)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams::new(64, 1, 1)
    }

    #[test]
    fn test_derive_kek_deterministic() {
        let salt = [5u8; SALT_LEN];
        let key1 = derive_kek(b"my-passphrase", &salt, &fast()).expect("first derivation");
        let key2 = derive_kek(b"my-passphrase", &salt, &fast()).expect("second derivation");
        assert_eq!(*key1, *key2, "same inputs must produce same key");
        assert_ne!(*key1, [0u8; 32], "derived key must not be all zeros");
    }

    #[test]
    fn test_derive_kek_accepts_empty_passphrase() {
        let salt = [1u8; SALT_LEN];
        let empty = derive_kek(b"", &salt, &fast()).expect("empty passphrase must derive");
        let zero = derive_kek(b"\0", &salt, &fast()).expect("single zero byte must derive");
        assert_ne!(*empty, *zero, "empty and single-zero passphrases must differ");
    }

    #[test]
    fn test_derive_kek_discriminates_after_embedded_zero() {
        let salt = [2u8; SALT_LEN];
        let a = derive_kek(b"aaaaaaaa\0aaaaaaaa", &salt, &fast()).expect("a0a");
        let b = derive_kek(b"aaaaaaaa\0bbbbbbbb", &salt, &fast()).expect("a0b");
        let prefix = derive_kek(b"aaaaaaaa", &salt, &fast()).expect("prefix");
        assert_ne!(*a, *b);
        assert_ne!(*a, *prefix);
    }

    #[test]
    fn test_derive_kek_different_salts() {
        let a = derive_kek(b"pw", &[1u8; SALT_LEN], &fast()).expect("salt a");
        let b = derive_kek(b"pw", &[2u8; SALT_LEN], &fast()).expect("salt b");
        assert_ne!(*a, *b, "different salts must produce different keys");
    }

    #[test]
    fn test_kdf_params_validate() {
        assert!(KdfParams::default().validate().is_ok());
        assert!(fast().validate().is_ok());
        assert!(KdfParams::new(64, 0, 1).validate().is_err(), "t_cost 0 is invalid");
        assert!(KdfParams::new(1, 1, 1).validate().is_err(), "m_cost below 8*p is invalid");
    }

    #[test]
    fn test_kdf_params_validate_work_caps() {
        assert!(KdfParams::new(64, MAX_T_COST, 1).validate().is_ok());
        assert!(KdfParams::new(64, MAX_T_COST + 1, 1).validate().is_err());
        assert!(KdfParams::new(MAX_M_COST, 1, 1).validate().is_ok());
        assert!(KdfParams::new(MAX_M_COST + 1, 1, 1).validate().is_err());
    }

    #[test]
    fn test_seal_open_round_trip() {
        let salt = random_salt();
        let ct = seal(b"secret seed", b"weak_password", &salt, &fast()).expect("seal");
        let pt = open(&ct, b"weak_password", &salt, &fast()).expect("open");
        assert_eq!(pt.as_slice(), b"secret seed");
    }

    #[test]
    fn test_open_wrong_passphrase_is_unlock_error() {
        let salt = random_salt();
        let ct = seal(b"secret seed", b"right", &salt, &fast()).expect("seal");
        let err = open(&ct, b"wrong", &salt, &fast()).expect_err("wrong passphrase must fail");
        assert!(matches!(err, OpenError::Unlock), "got {:?}", err);
    }

    #[test]
    fn test_open_bad_params_is_kdf_error() {
        let salt = random_salt();
        let ct = seal(b"x", b"pw", &salt, &fast()).expect("seal");
        let err = open(&ct, b"pw", &salt, &KdfParams::new(64, 0, 1)).expect_err("bad params");
        assert!(matches!(err, OpenError::Kdf(_)), "got {:?}", err);
    }

    #[test]
    fn test_age_encrypt_produces_different_ciphertext() {
        let salt = [3u8; SALT_LEN];
        let ct1 = seal(b"same", b"pw", &salt, &fast()).expect("first seal");
        let ct2 = seal(b"same", b"pw", &salt, &fast()).expect("second seal");
        assert_ne!(ct1, ct2, "age uses a fresh ephemeral key per encryption");
    }
}
