use std::time::Duration;

use serde::Serialize;

use crate::retry::{Backoff, RetryConfig};
use crate::ProviderId;

/// Per-provider download limits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    /// Simultaneous in-flight requests.
    pub max_concurrency: usize,
    #[serde(with = "duration_secs")]
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub retry_backoff: BackoffPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackoffPolicy {
    #[serde(with = "duration_secs")]
    pub initial_delay: Duration,
    #[serde(with = "duration_secs")]
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_retries: u32,
}

impl ProviderPolicy {
    /// FRED allows 120 requests per minute per key.
    pub fn fred_default() -> Self {
        Self {
            provider_id: ProviderId::Fred,
            max_concurrency: 4,
            quota_window: Duration::from_secs(60),
            quota_limit: 120,
            retry_backoff: BackoffPolicy {
                initial_delay: Duration::from_millis(500),
                max_delay: Duration::from_secs(30),
                multiplier: 2.0,
                max_retries: 3,
            },
        }
    }

    /// The unofficial chart endpoint throttles aggressively; keep requests spaced.
    pub fn yahoo_default() -> Self {
        Self {
            provider_id: ProviderId::Yahoo,
            max_concurrency: 2,
            quota_window: Duration::from_secs(60),
            quota_limit: 30,
            retry_backoff: BackoffPolicy {
                initial_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(60),
                multiplier: 2.0,
                max_retries: 3,
            },
        }
    }

    pub fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::Fred => Self::fred_default(),
            ProviderId::Yahoo => Self::yahoo_default(),
        }
    }

    /// Retry schedule for failed fetches, derived from the same backoff numbers.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.retry_backoff.max_retries,
            backoff: Backoff::Exponential {
                base: self.retry_backoff.initial_delay,
                factor: self.retry_backoff.multiplier,
                max: self.retry_backoff.max_delay,
                jitter: true,
            },
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.as_secs_f64())
    }
}
