//! Retry schedule for failed series fetches.

use std::time::Duration;

/// Wait between two attempts of the same fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed { delay: Duration },
    /// `base * factor^attempt`, capped at `max`. With `jitter` the nominal
    /// delay is scaled by a random factor in `[0.5, 1.5)` before capping.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(200),
            factor: 2.0,
            max: Duration::from_secs(3),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let mut seconds = base.as_secs_f64() * factor.powi(exponent);
                if jitter {
                    seconds *= 0.5 + fastrand::f64();
                }

                if !seconds.is_finite() || seconds >= max.as_secs_f64() {
                    return max;
                }
                Duration::from_secs_f64(seconds.max(0.0))
            }
        }
    }
}

/// How many times a retryable fetch is repeated and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::default(),
        }
    }
}

impl RetryConfig {
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::default(),
        }
    }

    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed { delay },
        }
    }

    /// Single attempt, no retries.
    pub fn no_retry() -> Self {
        Self::fixed(Duration::ZERO, 0)
    }

    /// Whether another attempt is allowed after `attempts_made` failed ones.
    pub fn allows_retry(&self, attempts_made: u32) -> bool {
        attempts_made <= self.max_retries
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doubling(jitter: bool) -> Backoff {
        Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter,
        }
    }

    #[test]
    fn fixed_delay_ignores_attempt_number() {
        let backoff = Backoff::Fixed {
            delay: Duration::from_millis(250),
        };
        assert_eq!(backoff.delay(0), Duration::from_millis(250));
        assert_eq!(backoff.delay(7), Duration::from_millis(250));
    }

    #[test]
    fn exponential_delay_doubles_until_the_cap() {
        let backoff = doubling(false);
        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(400));
        assert_eq!(backoff.delay(4), Duration::from_secs(1));
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn jittered_delay_never_exceeds_the_cap() {
        let backoff = doubling(true);
        for _ in 0..20 {
            for attempt in 0..6 {
                let nominal = (100.0 * 2_f64.powi(attempt as i32)).min(1000.0);
                let millis = backoff.delay(attempt).as_secs_f64() * 1000.0;
                let floor = (nominal * 0.5).min(1000.0) - 1e-6;
                assert!(millis >= floor, "attempt {attempt}: {millis}");
                assert!(millis <= 1000.0 + 1e-6, "attempt {attempt}: {millis}");
            }
        }
    }

    #[test]
    fn retry_budget_counts_failed_attempts() {
        let config = RetryConfig::fixed(Duration::from_millis(5), 2);
        assert!(config.allows_retry(1));
        assert!(config.allows_retry(2));
        assert!(!config.allows_retry(3));
        assert!(!RetryConfig::no_retry().allows_retry(1));
    }
}
