//! Passphrase-callback conformance harness for encrypted private key encodings.
//!
//! A [`callback::PassphraseCallback`] fills a bounded buffer on request. The
//! [`codec`] module encrypts and decrypts an Ed25519 key in two encodings,
//! asking the callback for the passphrase. The [`driver`] runs the
//! [`catalog`] of write/read callback pairings and scores each round trip.
pub mod callback;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod driver;
pub mod error;
pub mod keys;
pub mod logging;
pub mod policy;
pub mod util;
