//! Per-adapter circuit breaker.
//!
//! After `failure_threshold` consecutive retryable failures the circuit opens
//! and upstream calls are refused for `open_timeout`. The first call after the
//! timeout is a probe: success closes the circuit, failure reopens it.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::ProviderId;

/// Externally visible circuit position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed,
    Open { since: Instant },
    Probing,
}

#[derive(Debug)]
struct Circuit {
    phase: Phase,
    failures: u32,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    provider: ProviderId,
    config: CircuitBreakerConfig,
    circuit: Mutex<Circuit>,
}

impl CircuitBreaker {
    pub fn new(provider: ProviderId, config: CircuitBreakerConfig) -> Self {
        Self {
            provider,
            config,
            circuit: Mutex::new(Circuit {
                phase: Phase::Closed,
                failures: 0,
            }),
        }
    }

    pub fn for_provider(provider: ProviderId) -> Self {
        Self::new(provider, CircuitBreakerConfig::default())
    }

    /// Whether an upstream call may go out now. Moves an expired open circuit to probing.
    pub fn allow_request(&self) -> bool {
        let mut circuit = self.circuit();
        match circuit.phase {
            Phase::Closed | Phase::Probing => true,
            Phase::Open { since } if since.elapsed() >= self.config.open_timeout => {
                circuit.phase = Phase::Probing;
                true
            }
            Phase::Open { .. } => false,
        }
    }

    pub fn record_success(&self) {
        let mut circuit = self.circuit();
        if !matches!(circuit.phase, Phase::Closed) {
            info!(provider = %self.provider, "circuit breaker closed");
        }
        circuit.phase = Phase::Closed;
        circuit.failures = 0;
    }

    pub fn record_failure(&self) {
        let mut circuit = self.circuit();
        circuit.failures = circuit.failures.saturating_add(1);

        let reopen = match circuit.phase {
            Phase::Probing => true,
            Phase::Closed => circuit.failures >= self.config.failure_threshold,
            Phase::Open { .. } => false,
        };
        if reopen {
            warn!(
                provider = %self.provider,
                failures = circuit.failures,
                cooldown_secs = self.config.open_timeout.as_secs(),
                "circuit breaker opened"
            );
            circuit.phase = Phase::Open {
                since: Instant::now(),
            };
        }
    }

    pub fn state(&self) -> CircuitState {
        match self.circuit().phase {
            Phase::Closed => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::Probing => CircuitState::HalfOpen,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.circuit().failures
    }

    /// Time left before an open circuit lets a probe through.
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        match self.circuit().phase {
            Phase::Open { since } => Some(self.config.open_timeout.saturating_sub(since.elapsed())),
            Phase::Closed | Phase::Probing => None,
        }
    }

    fn circuit(&self) -> MutexGuard<'_, Circuit> {
        self.circuit.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
