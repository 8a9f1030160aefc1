//! Binary envelope encoding.
//!
//! ```text
//! Offset  Size  Field
//! 0       8     Magic: b"KPHRENCK"
//! 8       1     Version: 0x01
//! 9       4     m_cost (Argon2, u32 big-endian)
//! 13      4     t_cost (Argon2, u32 big-endian)
//! 17      4     p_cost (Argon2, u32 big-endian)
//! 21      32    Salt (random bytes)
//! 53      N     Age ciphertext (variable length)
//! ```

use super::{CodecError, Sealed};
use crate::crypto::{KdfParams, SALT_LEN};

/// Magic header bytes identifying the envelope format.
pub const ENVELOPE_MAGIC: &[u8; 8] = b"KPHRENCK";

/// Current version byte for the envelope format.
pub const ENVELOPE_VERSION: u8 = 0x01;

/// Fixed header length: 8 magic + 1 version + 4 m_cost + 4 t_cost + 4 p_cost + 32 salt = 53 bytes.
pub const ENVELOPE_HEADER_LEN: usize = 53;

pub fn encode(sealed: &Sealed) -> Vec<u8> {
    let mut envelope = Vec::with_capacity(ENVELOPE_HEADER_LEN + sealed.ciphertext.len());
    envelope.extend_from_slice(ENVELOPE_MAGIC);
    envelope.push(ENVELOPE_VERSION);
    envelope.extend_from_slice(&sealed.params.m_cost.to_be_bytes());
    envelope.extend_from_slice(&sealed.params.t_cost.to_be_bytes());
    envelope.extend_from_slice(&sealed.params.p_cost.to_be_bytes());
    envelope.extend_from_slice(&sealed.salt);
    envelope.extend_from_slice(&sealed.ciphertext);
    envelope
}

/// Split an envelope into its header fields and ciphertext.
///
/// KDF parameters come from the header, not from the current defaults.
pub fn decode(envelope: &[u8]) -> Result<Sealed, CodecError> {
    if envelope.len() <= ENVELOPE_HEADER_LEN {
        return Err(CodecError::Malformed(format!(
            "envelope too short ({} bytes, need more than {})",
            envelope.len(),
            ENVELOPE_HEADER_LEN
        )));
    }
    let (header, ciphertext) = envelope.split_at(ENVELOPE_HEADER_LEN);

    if &header[..8] != ENVELOPE_MAGIC {
        return Err(CodecError::Malformed("wrong magic bytes".to_string()));
    }
    if header[8] != ENVELOPE_VERSION {
        return Err(CodecError::UnsupportedVersion(header[8]));
    }

    let params = KdfParams::new(
        read_u32(&header[9..13]),
        read_u32(&header[13..17]),
        read_u32(&header[17..21]),
    );
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&header[21..ENVELOPE_HEADER_LEN]);

    Ok(Sealed {
        params,
        salt,
        ciphertext: ciphertext.to_vec(),
    })
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(bytes);
    u32::from_be_bytes(word)
}
