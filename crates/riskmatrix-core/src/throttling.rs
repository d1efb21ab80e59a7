use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use tracing::debug;

use crate::provider_policy::ProviderPolicy;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-provider request quota shared by every download task of that provider.
///
/// The quota is `quota_limit` requests per `quota_window`, with the whole
/// limit available as an initial burst.
#[derive(Clone)]
pub struct ThrottlingQueue {
    limiter: Arc<DirectRateLimiter>,
    clock: DefaultClock,
    waiting: Arc<AtomicUsize>,
}

impl ThrottlingQueue {
    pub fn new(quota_window: Duration, quota_limit: u32) -> Self {
        let clock = DefaultClock::default();
        let quota = quota_from_window(quota_window, quota_limit);
        let limiter = RateLimiter::direct_with_clock(quota, &clock);
        Self {
            limiter: Arc::new(limiter),
            clock,
            waiting: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_policy(policy: &ProviderPolicy) -> Self {
        Self::new(policy.quota_window, policy.quota_limit)
    }

    /// Takes one request from the budget, or returns how long until one frees up.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        self.limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    /// Waits until the budget admits one request; returns how many times it slept.
    pub async fn acquire_slot(&self) -> u32 {
        let mut waits = 0;
        loop {
            let wait = match self.try_acquire() {
                Ok(()) => return waits,
                Err(wait) => wait,
            };

            waits += 1;
            let queued = self.waiting.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(wait_ms = wait.as_millis() as u64, queued, "request quota exhausted, waiting");
            tokio::time::sleep(wait).await;
            self.waiting.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Requests currently sleeping on the quota.
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let burst = NonZeroU32::new(quota_limit.max(1)).unwrap_or(NonZeroU32::MIN);
    let per_request = (quota_window.as_secs_f64() / f64::from(burst.get())).max(0.001);

    Quota::with_period(Duration::from_secs_f64(per_request))
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_is_the_whole_quota() {
        let queue = ThrottlingQueue::new(Duration::from_secs(60), 2);

        assert!(queue.try_acquire().is_ok());
        assert!(queue.try_acquire().is_ok());

        let wait = queue.try_acquire().expect_err("third request exceeds the quota");
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn acquire_slot_returns_immediately_with_budget() {
        let queue = ThrottlingQueue::new(Duration::from_secs(60), 5);
        assert_eq!(queue.acquire_slot().await, 0);
        assert_eq!(queue.waiting(), 0);
    }

    #[tokio::test]
    async fn acquire_slot_sleeps_until_the_quota_refills() {
        let queue = ThrottlingQueue::new(Duration::from_millis(20), 1);
        assert_eq!(queue.acquire_slot().await, 0);

        let waits = queue.acquire_slot().await;

        assert!(waits >= 1);
        assert_eq!(queue.waiting(), 0);
    }
}
