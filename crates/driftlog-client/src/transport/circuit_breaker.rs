// Copyright 2025-Present Driftlog contributors
// SPDX-License-Identifier: Apache-2.0

//! Circuit breaker guarding a failing collector endpoint.
//!
//! # State Transitions
//!
//! ```text
//! ┌────────┐  failure_threshold  ┌────────┐
//! │ Closed │ ──────────────────► │  Open  │ ◄──┐
//! └────────┘                     └────────┘    │
//!     ▲                              │         │ trial
//!     │ trial success                │ reset   │ failure
//!     │                              ▼         │
//!     │                         ┌──────────┐   │
//!     └──────────────────────── │ HalfOpen │ ──┘
//!                               └──────────┘
//! ```
//!
//! The breaker is purely local and in-memory; each batching transport
//! owns its own instance, so log and span delivery trip independently.
//! At most one half-open trial is outstanding at a time.

use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rejection raised when the breaker is open; never surfaces outside the
/// transport layer.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("circuit breaker is open")]
pub struct CircuitOpenError;

/// Outcome of [`CircuitBreaker::call`].
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E: std::error::Error> {
    /// The call was rejected without invoking the inner operation.
    #[error("circuit breaker is open")]
    Open,
    /// The inner operation ran and failed.
    #[error(transparent)]
    Inner(E),
}

/// Breaker state visible to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    probe_in_flight: bool,
    opened_at: Option<Instant>,
}

/// Three-state guard around a fallible async operation.
///
/// State sits behind a `std::sync::Mutex` that is never held across an
/// await point; the guarded operation itself runs outside the lock.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    reset_timeout: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> CircuitBreaker {
        CircuitBreaker {
            failure_threshold,
            reset_timeout,
            state: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                probe_in_flight: false,
                opened_at: None,
            }),
        }
    }

    /// Asks the breaker whether a call may proceed.
    ///
    /// In the open state this rejects until `reset_timeout` has elapsed
    /// since the breaker opened, then admits the caller as the single
    /// half-open trial. In the half-open state only that one trial is
    /// admitted; concurrent callers are rejected until the trial settles.
    ///
    /// # Errors
    ///
    /// [`CircuitOpenError`] when the call must be skipped.
    pub fn preflight(&self) -> Result<(), CircuitOpenError> {
        let mut state = self.state.lock().expect("breaker state poisoned");
        match state.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let elapsed = state
                    .opened_at
                    .map(|at| at.elapsed())
                    .unwrap_or(Duration::ZERO);
                if elapsed >= self.reset_timeout {
                    state.state = CircuitState::HalfOpen;
                    state.probe_in_flight = true;
                    Ok(())
                } else {
                    Err(CircuitOpenError)
                }
            }
            CircuitState::HalfOpen => {
                if state.probe_in_flight {
                    Err(CircuitOpenError)
                } else {
                    state.probe_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    /// Records a successful call: closes the breaker and resets the
    /// failure counter.
    pub fn record_success(&self) {
        let mut state = self.state.lock().expect("breaker state poisoned");
        state.state = CircuitState::Closed;
        state.consecutive_failures = 0;
        state.probe_in_flight = false;
        state.opened_at = None;
    }

    /// Records a failed call. Reaching the failure threshold, or any
    /// failure of a half-open trial, opens the breaker and (re)starts the
    /// reset timer.
    pub fn record_failure(&self) {
        let mut state = self.state.lock().expect("breaker state poisoned");
        match state.state {
            CircuitState::Closed => {
                state.consecutive_failures += 1;
                if state.consecutive_failures >= self.failure_threshold {
                    state.state = CircuitState::Open;
                    state.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                state.state = CircuitState::Open;
                state.probe_in_flight = false;
                state.opened_at = Some(Instant::now());
            }
            CircuitState::Open => {
                state.opened_at = Some(Instant::now());
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.state.lock().expect("breaker state poisoned").state
    }

    /// Runs `op` through the breaker: a preflight rejection returns
    /// [`CircuitBreakerError::Open`] without invoking `op`; otherwise the
    /// outcome is recorded and passed through.
    ///
    /// # Errors
    ///
    /// [`CircuitBreakerError::Open`] on rejection,
    /// [`CircuitBreakerError::Inner`] with the operation's error.
    pub async fn call<T, E, F, Fut>(&self, op: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::error::Error,
    {
        if self.preflight().is_err() {
            return Err(CircuitBreakerError::Open);
        }
        match op().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(CircuitBreakerError::Inner(e))
            }
        }
    }
}
