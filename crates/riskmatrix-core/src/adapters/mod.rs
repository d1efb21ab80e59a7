//! Provider adapters.
//!
//! | Adapter | Provider | Real endpoint |
//! |---------|----------|---------------|
//! | [`FredAdapter`] | FRED | `series/observations` |
//! | [`YahooAdapter`] | Yahoo Finance | `v8/finance/chart` |
//!
//! Both adapters switch to deterministic synthetic series when built with a
//! mock transport, so offline runs exercise the same pipeline.

mod fred;
mod yahoo;

pub use fred::FredAdapter;
pub use yahoo::YahooAdapter;

use crate::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::data_source::{HealthStatus, SeriesRequest, SourceError};
use crate::http_client::{HttpClient, HttpRequest};
use crate::{Frequency, Observation, ObservationDate, ProviderId, SeriesSymbol, TimeSeries};

/// Executes one upstream call behind the adapter's circuit breaker and returns the body.
pub(crate) async fn fetch_body(
    provider: ProviderId,
    http_client: &dyn HttpClient,
    circuit_breaker: &CircuitBreaker,
    request: HttpRequest,
) -> Result<String, SourceError> {
    if !circuit_breaker.allow_request() {
        let wait = circuit_breaker.cooldown_remaining().unwrap_or_default();
        return Err(SourceError::unavailable(format!(
            "{provider} circuit breaker is open; next probe in {}s",
            wait.as_secs()
        )));
    }

    let response = http_client.execute(request).await.map_err(|error| {
        if error.retryable() {
            circuit_breaker.record_failure();
            SourceError::unavailable(format!("{provider} transport error: {}", error.message()))
        } else {
            SourceError::internal(format!("{provider} transport error: {}", error.message()))
        }
    })?;

    if !response.is_success() {
        let error = status_error(provider, response.status);
        if error.retryable() {
            circuit_breaker.record_failure();
        }
        return Err(error);
    }

    circuit_breaker.record_success();
    Ok(response.body)
}

/// Maps an upstream HTTP status to a source error; only throttling and server faults retry.
pub(crate) fn status_error(provider: ProviderId, status: u16) -> SourceError {
    match status {
        429 => SourceError::rate_limited(format!("{provider} returned status 429")),
        408 | 500..=599 => {
            SourceError::unavailable(format!("{provider} upstream returned status {status}"))
        }
        _ => SourceError::invalid_request(format!(
            "{provider} rejected request with status {status}"
        )),
    }
}

pub(crate) fn health_from_circuit(state: CircuitState) -> HealthStatus {
    match state {
        CircuitState::Closed => HealthStatus::healthy(),
        CircuitState::HalfOpen => HealthStatus::degraded(),
        CircuitState::Open => HealthStatus::unhealthy(),
    }
}

/// Deterministic stand-in series: the same request always yields the same values.
///
/// Daily series skip weekends, weekly series land on Fridays and monthly series
/// on the first of each month, matching how the real providers date them.
pub fn synthetic_series(request: &SeriesRequest) -> TimeSeries {
    let seed = symbol_seed(&request.symbol);
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut level = 5.0 + (seed % 200) as f64 / 4.0;

    let mut observations = Vec::new();
    let mut date = request.start;
    while date <= request.end {
        if is_publication_date(date, request.frequency) {
            level *= 1.0 + (rng.f64() - 0.5) * 0.02;
            let value = (level * 10_000.0).round() / 10_000.0;
            observations.push(Observation::new(date, Some(value)));
        }
        date = date.add_days(1);
    }

    TimeSeries::from_unsorted(observations)
}

fn is_publication_date(date: ObservationDate, frequency: Frequency) -> bool {
    match frequency {
        Frequency::Daily => !date.is_weekend(),
        Frequency::Weekly => date.weekday() == time::Weekday::Friday,
        Frequency::Monthly => date.into_inner().day() == 1,
    }
}

fn symbol_seed(symbol: &SeriesSymbol) -> u64 {
    symbol.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(u64::from(byte))
    })
}
