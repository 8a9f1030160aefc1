//! Round-trip driver: encrypt with one callback policy, decrypt with another,
//! and compare the outcome with what the scenario expects.
//!
//! Each call to [`run_scenario`] owns all of its working state (callbacks,
//! counters, the encoded key) and drops it on every return path, so scenarios
//! can run on separate threads against one shared reference key.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use zeroize::Zeroizing;

use crate::callback::Direction;
use crate::catalog::{Expected, Scenario};
use crate::codec::{self, CodecError, EncodingKind};
use crate::crypto::KdfParams;
use crate::keys::PrivateKey;
use crate::policy::{CallbackContext, CallbackViolation, PolicyCallback};

/// Where a scenario is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Writing,
    Reading,
    Passed,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Writing => "writing",
            Phase::Reading => "reading",
            Phase::Passed => "passed",
            Phase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The callback entry checks failed: the codec did not hand the callback what
/// it was given. This aborts the scenario instead of being scored as a failure.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("scenario {scenario}: integration defect while {direction}: {violation}")]
    Integration {
        scenario: &'static str,
        direction: Direction,
        violation: CallbackViolation,
    },
}

/// The result of one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: &'static str,
    pub encoding: EncodingKind,
    pub expected: Expected,
    /// `Passed`, or `Failed` with `reason` set.
    pub phase: Phase,
    /// Why the scenario failed, if it did.
    pub reason: Option<String>,
    /// How the read phase ended, if it was reached.
    pub read_result: Option<String>,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.phase == Phase::Passed
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Tracks phase transitions and produces the final report.
struct RoundTrip<'a> {
    scenario: &'a Scenario,
    phase: Phase,
    read_result: Option<String>,
    started: Instant,
}

impl<'a> RoundTrip<'a> {
    fn new(scenario: &'a Scenario) -> Self {
        Self {
            scenario,
            phase: Phase::Writing,
            read_result: None,
            started: Instant::now(),
        }
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(from = %self.phase, to = %phase, "phase transition");
        self.phase = phase;
    }

    fn finish(mut self, failure: Option<String>) -> ScenarioReport {
        let phase = if failure.is_some() {
            Phase::Failed
        } else {
            Phase::Passed
        };
        if let Some(reason) = &failure {
            tracing::info!(during = %self.phase, %reason, "scenario failed");
        }
        self.enter(phase);
        ScenarioReport {
            name: self.scenario.name,
            encoding: self.scenario.encoding,
            expected: self.scenario.expected,
            phase: self.phase,
            reason: failure,
            read_result: self.read_result,
            elapsed: self.started.elapsed(),
        }
    }
}

/// Escalate a callback entry-check failure.
fn check_callback(
    scenario: &Scenario,
    direction: Direction,
    callback: &PolicyCallback,
) -> Result<(), DriverError> {
    match callback.violation() {
        Some(violation) => Err(DriverError::Integration {
            scenario: scenario.name,
            direction,
            violation,
        }),
        None => Ok(()),
    }
}

fn invocation_failure(direction: Direction, count: usize) -> Option<String> {
    (count != 1).then(|| {
        format!(
            "callback entered {} times while {}, expected exactly once",
            count, direction
        )
    })
}

/// Run one scenario against `reference`.
///
/// Returns `Ok` with a passed or failed report for every ordinary outcome.
/// Returns `Err` only when the callback's entry checks caught an integration
/// defect, which must not be mistaken for a passphrase result.
pub fn run_scenario(
    scenario: &Scenario,
    reference: &PrivateKey,
    kdf: &KdfParams,
) -> Result<ScenarioReport, DriverError> {
    let ctx = CallbackContext::random();
    run_with_context(scenario, reference, kdf, ctx, ctx)
}

/// Callbacks expect `expected`; the codec is handed `supplied` as user data.
fn run_with_context(
    scenario: &Scenario,
    reference: &PrivateKey,
    kdf: &KdfParams,
    expected: CallbackContext,
    supplied: CallbackContext,
) -> Result<ScenarioReport, DriverError> {
    let span = tracing::info_span!(
        "scenario",
        name = scenario.name,
        encoding = %scenario.encoding
    );
    let _entered = span.enter();
    let mut round_trip = RoundTrip::new(scenario);

    // Writing
    let mut write_cb = PolicyCallback::new(scenario.write, Direction::Writing, expected);
    let encrypted = codec::encrypt(scenario.encoding, reference, &mut write_cb, &supplied, kdf);
    check_callback(scenario, Direction::Writing, &write_cb)?;
    if let Some(reason) = invocation_failure(Direction::Writing, write_cb.invocations()) {
        return Ok(round_trip.finish(Some(reason)));
    }
    let encoded = match encrypted {
        Ok(bytes) => Zeroizing::new(bytes),
        Err(e) => {
            return Ok(round_trip.finish(Some(format!("encryption failed: {}", e))));
        }
    };
    tracing::debug!(policy = %scenario.write, len = encoded.len(), "write phase complete");

    // Reading
    round_trip.enter(Phase::Reading);
    let mut read_cb = PolicyCallback::new(scenario.read, Direction::Reading, expected);
    let decrypted = codec::decrypt(scenario.encoding, &encoded, &mut read_cb, &supplied);
    check_callback(scenario, Direction::Reading, &read_cb)?;
    round_trip.read_result = Some(match &decrypted {
        Ok(_) => "ok".to_string(),
        Err(e) => e.to_string(),
    });
    if let Some(reason) = invocation_failure(Direction::Reading, read_cb.invocations()) {
        return Ok(round_trip.finish(Some(reason)));
    }
    tracing::debug!(
        policy = %scenario.read,
        result = ?round_trip.read_result,
        "read phase complete"
    );

    let failure = judge(scenario.expected, decrypted, reference);
    Ok(round_trip.finish(failure))
}

/// Run `scenarios` in order, or on one scoped thread each when `parallel`.
/// Results are returned in the order of `scenarios` either way.
pub fn run_all(
    scenarios: &[Scenario],
    reference: &PrivateKey,
    kdf: &KdfParams,
    parallel: bool,
) -> Vec<Result<ScenarioReport, DriverError>> {
    if !parallel {
        return scenarios
            .iter()
            .map(|s| run_scenario(s, reference, kdf))
            .collect();
    }
    std::thread::scope(|scope| {
        let handles: Vec<_> = scenarios
            .iter()
            .map(|s| scope.spawn(move || run_scenario(s, reference, kdf)))
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}

/// Compare the read-phase result with the expectation. `None` means pass.
fn judge(
    expected: Expected,
    decrypted: Result<PrivateKey, CodecError>,
    reference: &PrivateKey,
) -> Option<String> {
    match (expected, decrypted) {
        (Expected::Success, Ok(key)) if key == *reference => None,
        (Expected::Success, Ok(_)) => {
            Some("decryption succeeded but recovered a different key".to_string())
        }
        (Expected::Success, Err(e)) => {
            Some(format!("expected success, decryption failed: {}", e))
        }
        (Expected::Failure, Ok(_)) => {
            Some("expected failure, decryption succeeded".to_string())
        }
        (Expected::Failure, Err(_)) => None,
    }
}
