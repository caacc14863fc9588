// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Declare a desired state, then poll a remote object until it converges.
//!
//! Every check in this crate is built from the same three pieces: an
//! [`ObservedState`] projected from a freshly fetched object, a
//! [`DesiredState`] built by the caller, and [`verify_converged`], which keeps
//! fetching until the two agree or the deadline passes. All mismatches of an
//! attempt are collected so the caller sees every field that is off, not only
//! the first one.

use crate::error::{Result, ValidationError};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// A single observed field value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(i64),
    Flag(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "\"{}\"", s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

/// What a desired field must look like.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expectation {
    Equals(FieldValue),
    /// Met by a text value containing the substring.
    Contains(String),
}

impl Expectation {
    /// A missing field never meets an expectation, not even `Contains("")`.
    pub fn is_met_by(&self, actual: Option<&FieldValue>) -> bool {
        match (self, actual) {
            (Expectation::Equals(expected), Some(actual)) => expected == actual,
            (Expectation::Contains(needle), Some(FieldValue::Text(text))) => text.contains(needle),
            _ => false,
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Equals(value) => write!(f, "{}", value),
            Expectation::Contains(needle) => write!(f, "text containing \"{}\"", needle),
        }
    }
}

/// A field whose observed value does not meet its expectation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub field: String,
    pub expected: Expectation,
    pub actual: Option<FieldValue>,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.actual {
            Some(actual) => write!(
                f,
                "{}: expected {}, actual {}",
                self.field, self.expected, actual
            ),
            None => write!(f, "{}: expected {}, actual <missing>", self.field, self.expected),
        }
    }
}

/// One mismatch per line.
pub fn render_mismatches(mismatches: &[Mismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Field expectations supplied by the caller before verification starts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DesiredState {
    fields: BTreeMap<String, Expectation>,
}

impl DesiredState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields
            .insert(field.into(), Expectation::Equals(value.into()));
        self
    }

    pub fn contains(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.fields
            .insert(field.into(), Expectation::Contains(needle.into()));
        self
    }

    /// Every desired field the observation does not satisfy, in field order.
    pub fn diff(&self, observed: &ObservedState) -> Vec<Mismatch> {
        self.fields
            .iter()
            .filter_map(|(field, expected)| {
                let actual = observed.get(field);
                if expected.is_met_by(actual) {
                    None
                } else {
                    Some(Mismatch {
                        field: field.clone(),
                        expected: expected.clone(),
                        actual: actual.cloned(),
                    })
                }
            })
            .collect()
    }
}

/// A snapshot of remote fields, rebuilt on every attempt.
///
/// The default (empty) snapshot stands for an object that does not exist yet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObservedState {
    fields: BTreeMap<String, FieldValue>,
}

impl ObservedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Set the field only when a value was observed.
    pub fn set_opt<V: Into<FieldValue>>(&mut self, field: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.set(field, value);
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

/// Poll interval and overall deadline of a verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSettings {
    interval: Duration,
    timeout: Duration,
}

impl PollSettings {
    pub fn new(interval: Duration, timeout: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(ValidationError::InvalidPollSettings(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if timeout < interval {
            return Err(ValidationError::InvalidPollSettings(format!(
                "timeout {:?} is shorter than the poll interval {:?}",
                timeout, interval
            )));
        }
        Ok(Self { interval, timeout })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(crate::constants::poll::INTERVAL_MS),
            timeout: Duration::from_secs(crate::constants::poll::TIMEOUT_SECS),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConvergeError<E> {
    /// The fetch itself failed; no further attempt was made.
    #[error("fetch failed on attempt {attempt}: {source}")]
    Fetch {
        attempt: u32,
        #[source]
        source: E,
    },

    #[error(
        "state did not converge after {attempts} attempts in {elapsed:?}:\n{}",
        render_mismatches(.mismatches)
    )]
    TimeoutExceeded {
        attempts: u32,
        elapsed: Duration,
        mismatches: Vec<Mismatch>,
    },
}

impl<E> ConvergeError<E> {
    /// The last observed mismatches, if the verification timed out.
    pub fn mismatches(&self) -> Option<&[Mismatch]> {
        match self {
            ConvergeError::TimeoutExceeded { mismatches, .. } => Some(mismatches),
            ConvergeError::Fetch { .. } => None,
        }
    }
}

/// Poll `fetch` until `expect` reports no mismatches or `settings.timeout` elapses.
///
/// A fetch error aborts immediately and is returned unchanged inside
/// [`ConvergeError::Fetch`]. On timeout the mismatches of the last attempt are
/// returned. The loop overshoots the deadline by at most one interval plus the
/// duration of the fetch in flight.
pub async fn verify_converged<S, E, F, Fut, X>(
    mut fetch: F,
    expect: X,
    settings: &PollSettings,
) -> std::result::Result<(), ConvergeError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<S, E>>,
    X: Fn(&S) -> Vec<Mismatch>,
{
    let started = Instant::now();
    let deadline = started + settings.timeout;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let observed = fetch()
            .await
            .map_err(|source| ConvergeError::Fetch { attempt, source })?;

        let mismatches = expect(&observed);
        if mismatches.is_empty() {
            debug!(attempt, "State converged");
            return Ok(());
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(
                attempt,
                "State did not converge within {:?}: {} field(s) still differ",
                settings.timeout,
                mismatches.len()
            );
            return Err(ConvergeError::TimeoutExceeded {
                attempts: attempt,
                elapsed: now - started,
                mismatches,
            });
        }

        debug!(
            attempt,
            "{} field(s) not converged yet, retrying in {:?}",
            mismatches.len(),
            settings.interval
        );
        sleep(settings.interval).await;
    }
}

/// Single-shot comparison: the mismatches become a [`ValidationError::Mismatch`].
pub fn ensure_converged(desired: &DesiredState, observed: &ObservedState) -> Result<()> {
    let mismatches = desired.diff(observed);
    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Mismatch(mismatches))
    }
}
