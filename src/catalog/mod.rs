//! The fixed matrix of round-trip scenarios.

use std::fmt;

use serde::Serialize;

use crate::codec::EncodingKind;
use crate::policy::CallbackTest;

use CallbackTest::*;
use EncodingKind::{Container, Traditional};
use Expected::{Failure, Success};

/// Whether decryption in the read phase is expected to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expected {
    Failure,
    Success,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure => f.write_str("failure"),
            Success => f.write_str("success"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scenario {
    pub name: &'static str,
    pub encoding: EncodingKind,
    pub write: CallbackTest,
    pub read: CallbackTest,
    pub expected: Expected,
}

const fn scenario(
    name: &'static str,
    encoding: EncodingKind,
    write: CallbackTest,
    read: CallbackTest,
    expected: Expected,
) -> Scenario {
    Scenario {
        name,
        encoding,
        write,
        read,
        expected,
    }
}

/// Every scenario, in execution order.
pub const SCENARIOS: [Scenario; 16] = [
    scenario("traditional_negative", Traditional, Weak, Negative, Failure),
    scenario("traditional_zero_length", Traditional, ZeroLength, ZeroLength, Success),
    scenario("traditional_weak", Traditional, Weak, Weak, Success),
    scenario("traditional_16zero", Traditional, SixteenZero, SixteenZero, Success),
    scenario("traditional_a0a", Traditional, EmbeddedZeroA, EmbeddedZeroA, Success),
    scenario("traditional_a0a_a0b", Traditional, EmbeddedZeroA, EmbeddedZeroB, Failure),
    scenario("traditional_match_size", Traditional, MatchCapacity, MatchCapacity, Success),
    scenario("traditional_exceed_size", Traditional, MatchCapacity, ExceedCapacity, Failure),
    scenario("container_negative", Container, Weak, Negative, Failure),
    scenario("container_zero_length", Container, ZeroLength, ZeroLength, Success),
    scenario("container_weak", Container, Weak, Weak, Success),
    scenario("container_16zero", Container, SixteenZero, SixteenZero, Success),
    scenario("container_a0a", Container, EmbeddedZeroA, EmbeddedZeroA, Success),
    scenario("container_a0a_a0b", Container, EmbeddedZeroA, EmbeddedZeroB, Failure),
    scenario("container_match_size", Container, MatchCapacity, MatchCapacity, Success),
    scenario("container_exceed_size", Container, MatchCapacity, ExceedCapacity, Failure),
];

/// Look a scenario up by its exact name.
pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name == name)
}

/// Scenarios whose name contains `filter` (if any) and whose encoding matches
/// `encoding` (if any), in catalog order.
pub fn select(filter: Option<&str>, encoding: Option<EncodingKind>) -> Vec<Scenario> {
    SCENARIOS
        .iter()
        .filter(|s| filter.map_or(true, |f| s.name.contains(f)))
        .filter(|s| encoding.map_or(true, |e| s.encoding == e))
        .copied()
        .collect()
}
