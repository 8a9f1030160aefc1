//! Passphrase-protected private key codec.
//!
//! Two encodings share one passphrase protocol:
//!
//! - [`EncodingKind::Traditional`]: ASCII armour with `Proc-Type`/`DEK-Info`
//!   headers and a base64 body ([`traditional`])
//! - [`EncodingKind::Container`]: a self-describing binary envelope ([`container`])
//!
//! Both [`encrypt`] and [`decrypt`] enter the caller's callback exactly once,
//! through [`request_passphrase`]. That is the only place where a callback's
//! returned length is turned into passphrase bytes.

pub mod container;
pub mod traditional;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use zeroize::Zeroizing;

use crate::callback::{
    Direction, Passphrase, PassphraseBuf, PassphraseCallback, PASSPHRASE_CAPACITY,
};
use crate::crypto::{self, KdfParams, OpenError, SALT_LEN};
use crate::keys::PrivateKey;

/// Which serialization wraps the encrypted key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EncodingKind {
    Traditional,
    Container,
}

impl EncodingKind {
    pub const ALL: [EncodingKind; 2] = [EncodingKind::Traditional, EncodingKind::Container];

    pub fn label(self) -> &'static str {
        match self {
            EncodingKind::Traditional => "traditional",
            EncodingKind::Container => "container",
        }
    }
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EncodingKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "traditional" => Ok(EncodingKind::Traditional),
            "container" => Ok(EncodingKind::Container),
            other => Err(CodecError::Malformed(format!("unknown encoding '{}'", other))),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("passphrase callback declined")]
    Declined,

    #[error("passphrase callback claimed {claimed} bytes but the buffer holds {capacity}")]
    CapacityViolation { claimed: usize, capacity: usize },

    #[error("wrong passphrase or corrupted key")]
    WrongPassphrase,

    #[error("malformed encoded key: {0}")]
    Malformed(String),

    #[error("unsupported encoded key version: {0}")]
    UnsupportedVersion(u8),

    #[error("key derivation failed: {0}")]
    Kdf(anyhow::Error),

    #[error("encryption failed: {0}")]
    Encrypt(anyhow::Error),
}

/// The pieces every encoding carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub params: KdfParams,
    pub salt: [u8; SALT_LEN],
    pub ciphertext: Vec<u8>,
}

impl Sealed {
    /// Reject stored parameters that are invalid or would make decryption
    /// allocate or iterate without bound.
    pub(crate) fn check_params(&self) -> Result<(), CodecError> {
        self.params
            .validate()
            .map_err(|e| CodecError::Malformed(e.to_string()))
    }
}

/// Ask `callback` once for a passphrase and interpret its returned length.
///
/// The callback writes into a zeroized buffer of [`PASSPHRASE_CAPACITY`]
/// bytes owned here. A negative return declines. A return above the
/// capacity is rejected outright; no bytes beyond the buffer are ever read.
pub fn request_passphrase<U, C>(
    callback: &mut C,
    direction: Direction,
    user_data: &U,
) -> Result<Passphrase, CodecError>
where
    U: ?Sized,
    C: PassphraseCallback<U> + ?Sized,
{
    let mut storage = Zeroizing::new([0u8; PASSPHRASE_CAPACITY]);
    let capacity = storage.len();
    let ret = {
        let mut buf = PassphraseBuf::new(&mut storage[..]);
        callback.request(&mut buf, direction, user_data)
    };

    let Ok(claimed) = usize::try_from(ret) else {
        tracing::debug!(%direction, ret, "passphrase callback declined");
        return Err(CodecError::Declined);
    };
    if claimed > capacity {
        tracing::warn!(%direction, claimed, capacity, "passphrase callback over-claimed");
        return Err(CodecError::CapacityViolation { claimed, capacity });
    }
    Ok(Passphrase::new(&storage[..claimed]))
}

/// Encrypt `key` under a passphrase obtained from `callback`.
pub fn encrypt<U, C>(
    kind: EncodingKind,
    key: &PrivateKey,
    callback: &mut C,
    user_data: &U,
    params: &KdfParams,
) -> Result<Vec<u8>, CodecError>
where
    U: ?Sized,
    C: PassphraseCallback<U> + ?Sized,
{
    params.validate().map_err(CodecError::Kdf)?;
    let passphrase = request_passphrase(callback, Direction::Writing, user_data)?;
    let salt = crypto::random_salt();
    let seed = key.seed();
    let ciphertext = crypto::seal(&seed[..], passphrase.as_bytes(), &salt, params)
        .map_err(CodecError::Encrypt)?;

    let sealed = Sealed {
        params: *params,
        salt,
        ciphertext,
    };
    let encoded = match kind {
        EncodingKind::Traditional => traditional::encode(&sealed),
        EncodingKind::Container => container::encode(&sealed),
    };
    tracing::debug!(encoding = %kind, len = encoded.len(), "key encrypted");
    Ok(encoded)
}

/// Decrypt an encoded key with a passphrase obtained from `callback`.
///
/// The framing is parsed before the callback is entered; the cipher is only
/// attempted once a passphrase has been accepted.
pub fn decrypt<U, C>(
    kind: EncodingKind,
    encoded: &[u8],
    callback: &mut C,
    user_data: &U,
) -> Result<PrivateKey, CodecError>
where
    U: ?Sized,
    C: PassphraseCallback<U> + ?Sized,
{
    let sealed = match kind {
        EncodingKind::Traditional => traditional::decode(encoded)?,
        EncodingKind::Container => container::decode(encoded)?,
    };
    sealed.check_params()?;

    let passphrase = request_passphrase(callback, Direction::Reading, user_data)?;
    let plaintext = crypto::open(
        &sealed.ciphertext,
        passphrase.as_bytes(),
        &sealed.salt,
        &sealed.params,
    )
    .map_err(|e| match e {
        OpenError::Kdf(e) => CodecError::Kdf(e),
        OpenError::Unlock => CodecError::WrongPassphrase,
    })?;

    PrivateKey::from_slice(&plaintext).ok_or_else(|| {
        CodecError::Malformed(format!(
            "decrypted key has wrong size: {} bytes",
            plaintext.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{CallbackContext, CallbackTest, PolicyCallback};

    fn fast() -> KdfParams {
        KdfParams::new(64, 1, 1)
    }

    fn key() -> PrivateKey {
        PrivateKey::from_seed(&[42u8; 32])
    }

    /// Counts entries and checks that the user data arrives unchanged.
    struct Recorder<'a> {
        passphrase: &'a [u8],
        seen: Vec<(Direction, String)>,
    }

    impl PassphraseCallback<str> for Recorder<'_> {
        fn request(
            &mut self,
            buf: &mut PassphraseBuf<'_>,
            direction: Direction,
            user_data: &str,
        ) -> i32 {
            self.seen.push((direction, user_data.to_string()));
            buf.write_prefix(self.passphrase).map_or(-1, |n| n as i32)
        }
    }

    fn round_trip(
        kind: EncodingKind,
        write: CallbackTest,
        read: CallbackTest,
    ) -> Result<PrivateKey, CodecError> {
        let ctx = CallbackContext::random();
        let mut w = PolicyCallback::new(write, Direction::Writing, ctx);
        let encoded = encrypt(kind, &key(), &mut w, &ctx, &fast()).expect("encrypt");
        assert_eq!(w.invocations(), 1);
        let mut r = PolicyCallback::new(read, Direction::Reading, ctx);
        let result = decrypt(kind, &encoded, &mut r, &ctx);
        assert_eq!(r.invocations(), 1);
        assert_eq!(r.violation(), None);
        result
    }

    #[test]
    fn test_request_passphrase_takes_exact_length() {
        let mut cb = Recorder {
            passphrase: b"aaaaaaaa\0aaaaaaaa",
            seen: vec![],
        };
        let p = request_passphrase(&mut cb, Direction::Reading, "ctx").expect("passphrase");
        assert_eq!(p.as_bytes(), b"aaaaaaaa\0aaaaaaaa");
        assert_eq!(cb.seen, vec![(Direction::Reading, "ctx".to_string())]);
    }

    #[test]
    fn test_request_passphrase_zero_is_empty() {
        let mut cb = Recorder {
            passphrase: b"",
            seen: vec![],
        };
        let p = request_passphrase(&mut cb, Direction::Writing, "ctx").expect("passphrase");
        assert!(p.is_empty());
    }

    #[test]
    fn test_request_passphrase_negative_declines() {
        let ctx = CallbackContext::random();
        let mut cb = PolicyCallback::new(CallbackTest::Negative, Direction::Reading, ctx);
        let err = request_passphrase(&mut cb, Direction::Reading, &ctx).expect_err("declined");
        assert!(matches!(err, CodecError::Declined), "got {:?}", err);
    }

    #[test]
    fn test_request_passphrase_rejects_overclaim() {
        let ctx = CallbackContext::random();
        let mut cb = PolicyCallback::new(CallbackTest::ExceedCapacity, Direction::Reading, ctx);
        let err = request_passphrase(&mut cb, Direction::Reading, &ctx).expect_err("overclaim");
        match err {
            CodecError::CapacityViolation { claimed, capacity } => {
                assert_eq!(claimed, 1_000_000);
                assert_eq!(capacity, PASSPHRASE_CAPACITY);
            }
            other => panic!("expected CapacityViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_request_passphrase_accepts_exact_capacity() {
        let ctx = CallbackContext::random();
        let mut cb = PolicyCallback::new(CallbackTest::MatchCapacity, Direction::Reading, ctx);
        let p = request_passphrase(&mut cb, Direction::Reading, &ctx).expect("match capacity");
        assert_eq!(p.len(), PASSPHRASE_CAPACITY);
    }

    #[test]
    fn test_round_trip_both_encodings() {
        for kind in EncodingKind::ALL {
            let recovered = round_trip(kind, CallbackTest::Weak, CallbackTest::Weak)
                .unwrap_or_else(|e| panic!("{} round trip failed: {}", kind, e));
            assert_eq!(recovered, key());
        }
    }

    #[test]
    fn test_wrong_passphrase_is_reported() {
        for kind in EncodingKind::ALL {
            let err = round_trip(kind, CallbackTest::EmbeddedZeroA, CallbackTest::EmbeddedZeroB)
                .expect_err("a0a/a0b must fail");
            assert!(matches!(err, CodecError::WrongPassphrase), "{}: got {:?}", kind, err);
        }
    }

    #[test]
    fn test_encrypt_declined_produces_nothing() {
        let ctx = CallbackContext::random();
        let mut cb = PolicyCallback::new(CallbackTest::Negative, Direction::Writing, ctx);
        let err = encrypt(EncodingKind::Container, &key(), &mut cb, &ctx, &fast())
            .expect_err("declined encrypt");
        assert!(matches!(err, CodecError::Declined));
        assert_eq!(cb.invocations(), 1);
    }

    #[test]
    fn test_decrypt_malformed_never_enters_callback() {
        let ctx = CallbackContext::random();
        let mut cb = PolicyCallback::new(CallbackTest::Weak, Direction::Reading, ctx);
        for kind in EncodingKind::ALL {
            let err = decrypt(kind, b"not a key", &mut cb, &ctx).expect_err("garbage");
            assert!(matches!(err, CodecError::Malformed(_)), "{}: got {:?}", kind, err);
        }
        assert_eq!(cb.invocations(), 0);
    }

    #[test]
    fn test_encodings_are_not_interchangeable() {
        let ctx = CallbackContext::random();
        let mut w = PolicyCallback::new(CallbackTest::Weak, Direction::Writing, ctx);
        let encoded = encrypt(EncodingKind::Traditional, &key(), &mut w, &ctx, &fast())
            .expect("encrypt");
        let mut r = PolicyCallback::new(CallbackTest::Weak, Direction::Reading, ctx);
        assert!(decrypt(EncodingKind::Container, &encoded, &mut r, &ctx).is_err());
    }

    #[test]
    fn test_encrypt_rejects_params_decrypt_would_refuse() {
        let ctx = CallbackContext::random();
        let mut w = PolicyCallback::new(CallbackTest::Weak, Direction::Writing, ctx);
        let err = encrypt(
            EncodingKind::Container,
            &key(),
            &mut w,
            &ctx,
            &KdfParams::new(64, 65, 1),
        )
        .expect_err("t_cost 65 exceeds the cap");
        assert!(matches!(err, CodecError::Kdf(_)), "got {:?}", err);
        assert_eq!(w.invocations(), 0, "params are checked before the callback");
    }

    #[test]
    fn test_unbounded_stored_params_rejected() {
        let sealed = Sealed {
            params: KdfParams::new(u32::MAX, 1, 1),
            salt: [0u8; SALT_LEN],
            ciphertext: vec![1, 2, 3],
        };
        assert!(matches!(sealed.check_params(), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_encoding_kind_from_str() {
        assert_eq!(
            "traditional".parse::<EncodingKind>().ok(),
            Some(EncodingKind::Traditional)
        );
        assert_eq!(
            "container".parse::<EncodingKind>().ok(),
            Some(EncodingKind::Container)
        );
        assert!("pkcs12".parse::<EncodingKind>().is_err());
    }
}
