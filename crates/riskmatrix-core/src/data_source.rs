//! Data source trait and request types.
//!
//! Every provider implements [`DataSource`]. The set of providers is closed
//! ([`ProviderId`]); the concrete implementation for each one is chosen once
//! when the [`SourceRegistry`](crate::SourceRegistry) is built.
//!
//! # Example
//!
//! ```rust,ignore
//! use riskmatrix_core::{DataSource, FredAdapter, Frequency, SeriesRequest, SeriesSymbol};
//!
//! async fn fetch_vix(adapter: &FredAdapter) -> Result<(), riskmatrix_core::SourceError> {
//!     let request = SeriesRequest::trailing_days(
//!         SeriesSymbol::parse("VIXCLS")?,
//!         Frequency::Daily,
//!         end,
//!         365,
//!     )?;
//!     let series = adapter.fetch_series(request).await?;
//!     println!("{} observations", series.len());
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{Frequency, ObservationDate, ProviderId, SeriesSymbol, TimeSeries, ValidationError};

/// Health state reported by the `sources` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Runtime source health snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub state: HealthState,
    pub rate_available: bool,
}

impl HealthStatus {
    pub const fn new(state: HealthState, rate_available: bool) -> Self {
        Self {
            state,
            rate_available,
        }
    }

    pub const fn healthy() -> Self {
        Self::new(HealthState::Healthy, true)
    }

    pub const fn degraded() -> Self {
        Self::new(HealthState::Degraded, true)
    }

    pub const fn unhealthy() -> Self {
        Self::new(HealthState::Unhealthy, false)
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    AdapterNotRegistered,
    Internal,
}

/// Structured source error; `retryable` drives the downloader's retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    /// Unavailable for a reason retrying cannot fix, such as a missing API key.
    pub fn not_configured(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn adapter_not_registered(provider: ProviderId) -> Self {
        Self {
            kind: SourceErrorKind::AdapterNotRegistered,
            message: format!("source adapter '{provider}' is not registered"),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::AdapterNotRegistered => "source.adapter_not_registered",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<ValidationError> for SourceError {
    fn from(value: ValidationError) -> Self {
        Self::invalid_request(value.to_string())
    }
}

/// Request for one series over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub symbol: SeriesSymbol,
    pub frequency: Frequency,
    pub start: ObservationDate,
    pub end: ObservationDate,
}

impl SeriesRequest {
    pub fn new(
        symbol: SeriesSymbol,
        frequency: Frequency,
        start: ObservationDate,
        end: ObservationDate,
    ) -> Result<Self, SourceError> {
        if start > end {
            return Err(SourceError::invalid_request(format!(
                "series request start {start} is after end {end}"
            )));
        }
        Ok(Self {
            symbol,
            frequency,
            start,
            end,
        })
    }

    /// Range of `lookback_days` calendar days ending at `end`.
    pub fn trailing_days(
        symbol: SeriesSymbol,
        frequency: Frequency,
        end: ObservationDate,
        lookback_days: u32,
    ) -> Result<Self, SourceError> {
        Self::new(
            symbol,
            frequency,
            end.add_days(-i64::from(lookback_days)),
            end,
        )
    }
}

/// Source adapter contract.
///
/// Implementations must be `Send + Sync`; the downloader shares them across tasks.
pub trait DataSource: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Fetches the observations of one series within the request range.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the provider is unreachable, rate limited,
    /// not configured, or returns a payload that cannot be parsed.
    fn fetch_series<'a>(
        &'a self,
        req: SeriesRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TimeSeries, SourceError>> + Send + 'a>>;

    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>>;
}
