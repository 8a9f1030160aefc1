//! Canned callback behaviours used to probe a codec's passphrase handling.
//!
//! [`CallbackTest`] selects what the callback writes and what length it
//! claims. [`PolicyCallback`] wraps one behaviour with the entry checks a
//! correctly integrated codec must satisfy (context token, non-empty buffer,
//! direction) and counts its invocations.

use std::fmt;

use serde::Serialize;

use crate::callback::{Direction, PassphraseBuf, PassphraseCallback};

/// Fixed ASCII passphrase used by [`CallbackTest::Weak`].
pub const WEAK_PASSWORD: &[u8] = b"weak_password";

/// Passphrase with an embedded zero byte, variant A.
pub const A0A_PASSWORD: &[u8] = b"aaaaaaaa\0aaaaaaaa";

/// Same prefix as [`A0A_PASSWORD`] through the zero byte, different suffix.
pub const A0B_PASSWORD: &[u8] = b"aaaaaaaa\0bbbbbbbb";

/// Filler byte for the capacity probes.
pub const FILLER: u8 = b'e';

/// Length claimed by [`CallbackTest::ExceedCapacity`].
pub const OVERCLAIMED_LEN: i32 = 1_000_000;

/// What the callback supplies when invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackTest {
    /// Decline: write nothing, return a negative value.
    Negative,
    /// Explicit empty passphrase.
    ZeroLength,
    /// [`WEAK_PASSWORD`].
    Weak,
    /// Sixteen zero bytes.
    SixteenZero,
    /// [`A0A_PASSWORD`].
    EmbeddedZeroA,
    /// [`A0B_PASSWORD`].
    EmbeddedZeroB,
    /// Fill the whole buffer with [`FILLER`] and claim exactly its capacity.
    MatchCapacity,
    /// Fill the whole buffer with [`FILLER`] but claim [`OVERCLAIMED_LEN`].
    ExceedCapacity,
}

impl CallbackTest {
    pub const ALL: [CallbackTest; 8] = [
        CallbackTest::Negative,
        CallbackTest::ZeroLength,
        CallbackTest::Weak,
        CallbackTest::SixteenZero,
        CallbackTest::EmbeddedZeroA,
        CallbackTest::EmbeddedZeroB,
        CallbackTest::MatchCapacity,
        CallbackTest::ExceedCapacity,
    ];

    /// Write this behaviour's bytes into `buf` and return the claimed length.
    ///
    /// A fixed passphrase that does not fit the offered capacity is declined.
    pub fn supply(self, buf: &mut PassphraseBuf<'_>) -> i32 {
        match self {
            CallbackTest::Negative => -1,
            CallbackTest::ZeroLength => 0,
            CallbackTest::Weak => write_fixed(buf, WEAK_PASSWORD),
            CallbackTest::SixteenZero => write_fixed(buf, &[0u8; 16]),
            CallbackTest::EmbeddedZeroA => write_fixed(buf, A0A_PASSWORD),
            CallbackTest::EmbeddedZeroB => write_fixed(buf, A0B_PASSWORD),
            CallbackTest::MatchCapacity => {
                buf.fill(FILLER);
                i32::try_from(buf.capacity()).unwrap_or(-1)
            }
            CallbackTest::ExceedCapacity => {
                buf.fill(FILLER);
                OVERCLAIMED_LEN
            }
        }
    }

    /// Short identifier used in scenario names.
    pub fn label(self) -> &'static str {
        match self {
            CallbackTest::Negative => "negative",
            CallbackTest::ZeroLength => "zero_length",
            CallbackTest::Weak => "weak",
            CallbackTest::SixteenZero => "16zero",
            CallbackTest::EmbeddedZeroA => "a0a",
            CallbackTest::EmbeddedZeroB => "a0b",
            CallbackTest::MatchCapacity => "match_size",
            CallbackTest::ExceedCapacity => "exceed_size",
        }
    }
}

impl fmt::Display for CallbackTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn write_fixed(buf: &mut PassphraseBuf<'_>, passphrase: &[u8]) -> i32 {
    match buf.write_prefix(passphrase) {
        Some(n) => i32::try_from(n).unwrap_or(-1),
        None => -1,
    }
}

/// Opaque user data threaded from the driver through the codec to the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackContext {
    token: u64,
}

impl CallbackContext {
    /// A context with a fresh random token.
    pub fn random() -> Self {
        Self {
            token: rand::random(),
        }
    }

    pub fn with_token(token: u64) -> Self {
        Self { token }
    }

    pub fn token(&self) -> u64 {
        self.token
    }
}

/// An entry check that failed inside [`PolicyCallback`].
///
/// Any of these means the codec integration is broken, not the passphrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CallbackViolation {
    #[error("user data reached the callback altered (expected token {expected:#x}, got {actual:#x})")]
    ContextMismatch { expected: u64, actual: u64 },

    #[error("callback was offered a zero-capacity buffer")]
    EmptyBuffer,

    #[error("callback was invoked for {actual} while installed for {expected}")]
    WrongDirection {
        expected: Direction,
        actual: Direction,
    },
}

/// A [`CallbackTest`] installed for one phase of a round trip.
#[derive(Debug)]
pub struct PolicyCallback {
    test: CallbackTest,
    direction: Direction,
    expected: CallbackContext,
    invocations: usize,
    violation: Option<CallbackViolation>,
}

impl PolicyCallback {
    pub fn new(test: CallbackTest, direction: Direction, expected: CallbackContext) -> Self {
        Self {
            test,
            direction,
            expected,
            invocations: 0,
            violation: None,
        }
    }

    pub fn test(&self) -> CallbackTest {
        self.test
    }

    /// How many times the codec entered the callback.
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// The first entry check that failed, if any.
    pub fn violation(&self) -> Option<CallbackViolation> {
        self.violation
    }

    fn check_entry(
        &self,
        buf: &PassphraseBuf<'_>,
        direction: Direction,
        ctx: &CallbackContext,
    ) -> Result<(), CallbackViolation> {
        if ctx.token != self.expected.token {
            return Err(CallbackViolation::ContextMismatch {
                expected: self.expected.token,
                actual: ctx.token,
            });
        }
        if buf.capacity() == 0 {
            return Err(CallbackViolation::EmptyBuffer);
        }
        if direction != self.direction {
            return Err(CallbackViolation::WrongDirection {
                expected: self.direction,
                actual: direction,
            });
        }
        Ok(())
    }
}

impl PassphraseCallback<CallbackContext> for PolicyCallback {
    fn request(
        &mut self,
        buf: &mut PassphraseBuf<'_>,
        direction: Direction,
        user_data: &CallbackContext,
    ) -> i32 {
        self.invocations += 1;
        if let Err(violation) = self.check_entry(buf, direction, user_data) {
            tracing::error!(%violation, "callback entry check failed");
            self.violation.get_or_insert(violation);
            return -1;
        }
        let ret = self.test.supply(buf);
        tracing::trace!(test = %self.test, %direction, ret, "callback supplied passphrase");
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::PASSPHRASE_CAPACITY;

    fn run(test: CallbackTest) -> (i32, Vec<u8>) {
        let mut storage = vec![0x5au8; PASSPHRASE_CAPACITY];
        let ret = {
            let mut buf = PassphraseBuf::new(&mut storage);
            test.supply(&mut buf)
        };
        (ret, storage)
    }

    #[test]
    fn test_negative_writes_nothing() {
        let (ret, storage) = run(CallbackTest::Negative);
        assert!(ret < 0);
        assert!(storage.iter().all(|&b| b == 0x5a), "declining must not write");
    }

    #[test]
    fn test_zero_length_writes_nothing() {
        let (ret, storage) = run(CallbackTest::ZeroLength);
        assert_eq!(ret, 0);
        assert!(storage.iter().all(|&b| b == 0x5a));
    }

    #[test]
    fn test_fixed_passphrases() {
        let (ret, storage) = run(CallbackTest::Weak);
        assert_eq!(ret, 13);
        assert_eq!(&storage[..13], b"weak_password");

        let (ret, storage) = run(CallbackTest::SixteenZero);
        assert_eq!(ret, 16);
        assert_eq!(&storage[..16], &[0u8; 16]);

        let (ret, storage) = run(CallbackTest::EmbeddedZeroA);
        assert_eq!(ret, 17);
        assert_eq!(&storage[..17], b"aaaaaaaa\0aaaaaaaa");

        let (ret, storage) = run(CallbackTest::EmbeddedZeroB);
        assert_eq!(ret, 17);
        assert_eq!(&storage[..17], b"aaaaaaaa\0bbbbbbbb");
    }

    #[test]
    fn test_embedded_zero_variants_share_prefix() {
        assert_eq!(A0A_PASSWORD[..9], A0B_PASSWORD[..9]);
        assert_ne!(A0A_PASSWORD, A0B_PASSWORD);
        assert_eq!(A0A_PASSWORD[8], 0);
    }

    #[test]
    fn test_match_capacity_fills_and_claims_capacity() {
        let (ret, storage) = run(CallbackTest::MatchCapacity);
        assert_eq!(ret as usize, PASSPHRASE_CAPACITY);
        assert!(storage.iter().all(|&b| b == FILLER));
    }

    #[test]
    fn test_exceed_capacity_fills_but_overclaims() {
        let (ret, storage) = run(CallbackTest::ExceedCapacity);
        assert_eq!(ret, OVERCLAIMED_LEN);
        assert!(ret as usize > PASSPHRASE_CAPACITY);
        assert!(storage.iter().all(|&b| b == FILLER));
    }

    #[test]
    fn test_fixed_passphrase_declined_when_buffer_too_small() {
        let mut storage = [0u8; 8];
        let mut buf = PassphraseBuf::new(&mut storage);
        assert_eq!(CallbackTest::Weak.supply(&mut buf), -1);
    }

    #[test]
    fn test_policy_callback_counts_and_supplies() {
        let ctx = CallbackContext::with_token(42);
        let mut cb = PolicyCallback::new(CallbackTest::Weak, Direction::Writing, ctx);
        let mut storage = [0u8; PASSPHRASE_CAPACITY];
        let mut buf = PassphraseBuf::new(&mut storage);
        assert_eq!(cb.request(&mut buf, Direction::Writing, &ctx), 13);
        assert_eq!(cb.invocations(), 1);
        assert_eq!(cb.violation(), None);
    }

    #[test]
    fn test_policy_callback_rejects_foreign_context() {
        let expected = CallbackContext::with_token(1);
        let foreign = CallbackContext::with_token(2);
        let mut cb = PolicyCallback::new(CallbackTest::Weak, Direction::Reading, expected);
        let mut storage = [0x11u8; 32];
        let mut buf = PassphraseBuf::new(&mut storage);
        assert_eq!(cb.request(&mut buf, Direction::Reading, &foreign), -1);
        assert_eq!(
            cb.violation(),
            Some(CallbackViolation::ContextMismatch {
                expected: 1,
                actual: 2
            })
        );
        assert_eq!(cb.invocations(), 1, "failed entries are still counted");
        assert_eq!(storage, [0x11u8; 32], "no bytes written on a failed entry check");
    }

    #[test]
    fn test_policy_callback_rejects_wrong_direction() {
        let ctx = CallbackContext::with_token(9);
        let mut cb = PolicyCallback::new(CallbackTest::Weak, Direction::Reading, ctx);
        let mut storage = [0u8; 32];
        let mut buf = PassphraseBuf::new(&mut storage);
        assert_eq!(cb.request(&mut buf, Direction::Writing, &ctx), -1);
        assert_eq!(
            cb.violation(),
            Some(CallbackViolation::WrongDirection {
                expected: Direction::Reading,
                actual: Direction::Writing
            })
        );
    }

    #[test]
    fn test_policy_callback_rejects_empty_buffer() {
        let ctx = CallbackContext::with_token(9);
        let mut cb = PolicyCallback::new(CallbackTest::ZeroLength, Direction::Reading, ctx);
        let mut storage: [u8; 0] = [];
        let mut buf = PassphraseBuf::new(&mut storage);
        assert_eq!(cb.request(&mut buf, Direction::Reading, &ctx), -1);
        assert_eq!(cb.violation(), Some(CallbackViolation::EmptyBuffer));
    }

    #[test]
    fn test_first_violation_is_kept() {
        let ctx = CallbackContext::with_token(3);
        let mut cb = PolicyCallback::new(CallbackTest::Weak, Direction::Reading, ctx);
        let mut storage = [0u8; 32];
        let mut buf = PassphraseBuf::new(&mut storage);
        cb.request(&mut buf, Direction::Writing, &ctx);
        cb.request(&mut buf, Direction::Reading, &CallbackContext::with_token(4));
        assert!(matches!(
            cb.violation(),
            Some(CallbackViolation::WrongDirection { .. })
        ));
        assert_eq!(cb.invocations(), 2);
    }

    #[test]
    fn test_labels_are_unique() {
        let mut labels: Vec<_> = CallbackTest::ALL.iter().map(|t| t.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), CallbackTest::ALL.len());
    }
}
