//! Concurrent download of every remote catalog series into a [`SeriesStore`].
//!
//! Each provider gets its own lane: a semaphore bounding in-flight requests to
//! the policy's `max_concurrency`, a rate gate sized to the policy quota, and a
//! retry schedule. A symbol whose fetch fails for good is recorded as a
//! [`FetchFailure`] and stored as an empty series; the run carries on.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::data_source::{DataSource, SeriesRequest, SourceError};
use crate::provider_policy::ProviderPolicy;
use crate::retry::RetryConfig;
use crate::routing::SourceRegistry;
use crate::throttling::ThrottlingQueue;
use crate::{
    Frequency, ObservationDate, ProviderId, SeriesCatalog, SeriesStore, SeriesSymbol, TimeSeries,
};

pub const DEFAULT_LOOKBACK_DAYS: u32 = 1100;

/// A symbol that could not be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub symbol: SeriesSymbol,
    pub provider: ProviderId,
    pub code: &'static str,
    pub message: String,
    pub attempts: u32,
}

/// Outcome of one download run.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub store: SeriesStore,
    pub failures: Vec<FetchFailure>,
}

impl DownloadReport {
    pub fn succeeded(&self) -> usize {
        self.store.len().saturating_sub(self.failures.len())
    }
}

#[derive(Clone)]
struct ProviderLane {
    permits: Arc<Semaphore>,
    throttle: ThrottlingQueue,
    retry: RetryConfig,
}

impl ProviderLane {
    fn from_policy(policy: &ProviderPolicy) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(policy.max_concurrency.max(1))),
            throttle: ThrottlingQueue::from_policy(policy),
            retry: policy.retry_config(),
        }
    }
}

/// Downloads catalog series through the registry's adapters.
pub struct SeriesDownloader {
    registry: Arc<SourceRegistry>,
    lanes: BTreeMap<ProviderId, ProviderLane>,
    lookback_days: u32,
}

impl SeriesDownloader {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        let lanes = ProviderId::ALL
            .into_iter()
            .map(|provider| {
                let policy = ProviderPolicy::default_for(provider);
                (provider, ProviderLane::from_policy(&policy))
            })
            .collect();
        Self {
            registry,
            lanes,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }

    pub fn with_policy(mut self, policy: &ProviderPolicy) -> Self {
        self.lanes
            .insert(policy.provider_id, ProviderLane::from_policy(policy));
        self
    }

    /// Replaces the retry schedule of one provider, keeping its pool and quota.
    pub fn with_retry(mut self, provider: ProviderId, retry: RetryConfig) -> Self {
        let policy = ProviderPolicy::default_for(provider);
        self.lanes
            .entry(provider)
            .or_insert_with(|| ProviderLane::from_policy(&policy))
            .retry = retry;
        self
    }

    pub fn with_lookback_days(mut self, lookback_days: u32) -> Self {
        self.lookback_days = lookback_days;
        self
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    /// Fetches every remote catalog series over the lookback window ending at `end`.
    ///
    /// Derived series are not downloaded; the report builder computes them from
    /// their legs.
    pub async fn download(&self, catalog: &SeriesCatalog, end: ObservationDate) -> DownloadReport {
        let mut report = DownloadReport::default();
        let mut tasks = JoinSet::new();
        let remote = catalog.remote_series();
        info!(series = remote.len(), %end, lookback_days = self.lookback_days, "starting download");

        for (symbol, provider, frequency) in remote {
            let source = match self.registry.get(provider) {
                Ok(source) => source,
                Err(source_error) => {
                    report.record_failure(symbol, provider, &source_error, 0);
                    continue;
                }
            };
            let lane = self.lanes.get(&provider).cloned().unwrap_or_else(|| {
                ProviderLane::from_policy(&ProviderPolicy::default_for(provider))
            });
            let lookback_days = self.lookback_days;

            tasks.spawn(async move {
                let result =
                    fetch_with_retry(source, lane, &symbol, frequency, end, lookback_days).await;
                (symbol, provider, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((symbol, provider, Ok(series))) => {
                    debug!(%symbol, %provider, observations = series.len(), "series downloaded");
                    report.store.insert(symbol, series);
                }
                Ok((symbol, provider, Err((source_error, attempts)))) => {
                    report.record_failure(symbol, provider, &source_error, attempts);
                }
                Err(join_error) => error!(error = %join_error, "download task aborted"),
            }
        }

        // A panicked task leaves its symbol without an entry; keep the store complete.
        for (symbol, provider, _) in catalog.remote_series() {
            if !report.store.contains(&symbol) {
                let source_error = SourceError::internal("download task aborted");
                report.record_failure(symbol, provider, &source_error, 0);
            }
        }

        info!(
            downloaded = report.succeeded(),
            failed = report.failures.len(),
            "download finished"
        );
        report
    }
}

impl DownloadReport {
    fn record_failure(
        &mut self,
        symbol: SeriesSymbol,
        provider: ProviderId,
        source_error: &SourceError,
        attempts: u32,
    ) {
        warn!(
            %symbol,
            %provider,
            code = source_error.code(),
            attempts,
            "series download failed: {}",
            source_error.message()
        );
        self.store.insert(symbol.clone(), TimeSeries::empty());
        self.failures.push(FetchFailure {
            symbol,
            provider,
            code: source_error.code(),
            message: source_error.message().to_owned(),
            attempts,
        });
    }
}

async fn fetch_with_retry(
    source: Arc<dyn DataSource>,
    lane: ProviderLane,
    symbol: &SeriesSymbol,
    frequency: Frequency,
    end: ObservationDate,
    lookback_days: u32,
) -> Result<TimeSeries, (SourceError, u32)> {
    let request = SeriesRequest::trailing_days(symbol.clone(), frequency, end, lookback_days)
        .map_err(|source_error| (source_error, 0))?;

    let _permit = lane
        .permits
        .acquire_owned()
        .await
        .map_err(|_| (SourceError::internal("download pool closed"), 0))?;

    let mut attempts = 0_u32;
    loop {
        lane.throttle.acquire_slot().await;
        attempts += 1;

        match source.fetch_series(request.clone()).await {
            Ok(series) => return Ok(series),
            Err(source_error)
                if source_error.retryable() && lane.retry.allows_retry(attempts) =>
            {
                let delay = lane.retry.delay_for_attempt(attempts - 1);
                debug!(
                    %symbol,
                    attempts,
                    delay_ms = delay.as_millis() as u64,
                    code = source_error.code(),
                    "retrying series download"
                );
                tokio::time::sleep(delay).await;
            }
            Err(source_error) => return Err((source_error, attempts)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::adapters::{synthetic_series, FredAdapter};
    use crate::data_source::HealthStatus;
    use crate::CatalogEntry;

    /// Yahoo stand-in that fails a fixed number of times before delegating to mock data.
    struct FlakySource {
        failures_left: AtomicU32,
        calls: AtomicU32,
        retryable: bool,
    }

    impl FlakySource {
        fn new(failures: u32, retryable: bool) -> Self {
            Self {
                failures_left: AtomicU32::new(failures),
                calls: AtomicU32::new(0),
                retryable,
            }
        }
    }

    impl DataSource for FlakySource {
        fn id(&self) -> ProviderId {
            ProviderId::Yahoo
        }

        fn fetch_series<'a>(
            &'a self,
            req: SeriesRequest,
        ) -> Pin<Box<dyn Future<Output = Result<TimeSeries, SourceError>> + Send + 'a>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let remaining = self.failures_left.load(Ordering::SeqCst);
                if remaining > 0 {
                    self.failures_left.store(remaining - 1, Ordering::SeqCst);
                    return Err(if self.retryable {
                        SourceError::unavailable("upstream returned status 503")
                    } else {
                        SourceError::invalid_request("unknown symbol")
                    });
                }
                Ok(synthetic_series(&req))
            })
        }

        fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>> {
            Box::pin(async move { HealthStatus::healthy() })
        }
    }

    fn catalog() -> SeriesCatalog {
        let symbol = |raw: &str| SeriesSymbol::parse(raw).expect("symbol");
        let entries = [
            (
                "DGS10",
                CatalogEntry::remote("10Y Treasury", ProviderId::Fred, Frequency::Daily),
            ),
            (
                "DGS2",
                CatalogEntry::remote("2Y Treasury", ProviderId::Fred, Frequency::Daily),
            ),
            (
                "^VIX",
                CatalogEntry::remote("VIX", ProviderId::Yahoo, Frequency::Daily),
            ),
            (
                "T10Y2Y",
                CatalogEntry::spread("10Y-2Y", Frequency::Daily, symbol("DGS10"), symbol("DGS2")),
            ),
        ];
        entries
            .into_iter()
            .fold(SeriesCatalog::new(), |catalog, (raw, entry)| {
                catalog.with_entry(symbol(raw), entry).expect("valid entry")
            })
    }

    fn end() -> ObservationDate {
        ObservationDate::from_ymd(2024, 6, 28).expect("date")
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig::fixed(Duration::from_millis(1), 2)
    }

    #[tokio::test]
    async fn mock_download_fills_every_remote_series() {
        let registry = Arc::new(SourceRegistry::default());
        let downloader = SeriesDownloader::new(registry).with_lookback_days(60);

        let report = downloader.download(&catalog(), end()).await;

        assert!(report.failures.is_empty());
        assert_eq!(report.store.len(), 3);
        let symbol = SeriesSymbol::parse("T10Y2Y").expect("symbol");
        assert!(!report.store.contains(&symbol));
        assert_eq!(report.store.latest_date(), Some(end()));
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let flaky = Arc::new(FlakySource::new(2, true));
        let registry = Arc::new(SourceRegistry::new(vec![
            Arc::new(FredAdapter::default()),
            flaky.clone() as Arc<dyn DataSource>,
        ]));
        let downloader =
            SeriesDownloader::new(registry).with_retry(ProviderId::Yahoo, fast_retry());

        let report = downloader.download(&catalog(), end()).await;

        assert!(report.failures.is_empty());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
        let vix = SeriesSymbol::parse("^VIX").expect("symbol");
        assert!(!report.store.get(&vix).expect("vix stored").is_empty());
    }

    #[tokio::test]
    async fn permanent_failure_is_isolated_to_its_symbol() {
        let flaky = Arc::new(FlakySource::new(10, false));
        let registry = Arc::new(SourceRegistry::new(vec![
            Arc::new(FredAdapter::default()),
            flaky.clone() as Arc<dyn DataSource>,
        ]));
        let downloader =
            SeriesDownloader::new(registry).with_retry(ProviderId::Yahoo, fast_retry());

        let report = downloader.download(&catalog(), end()).await;

        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.symbol.as_str(), "^VIX");
        assert_eq!(failure.code, "source.invalid_request");
        assert_eq!(failure.attempts, 1);

        let vix = SeriesSymbol::parse("^VIX").expect("symbol");
        assert!(report.store.get(&vix).expect("placeholder stored").is_empty());
        let dgs10 = SeriesSymbol::parse("DGS10").expect("symbol");
        assert!(!report.store.get(&dgs10).expect("dgs10 stored").is_empty());
    }

    #[tokio::test]
    async fn retry_budget_bounds_attempts() {
        let flaky = Arc::new(FlakySource::new(10, true));
        let registry = Arc::new(SourceRegistry::new(vec![flaky.clone() as Arc<dyn DataSource>]));
        let downloader =
            SeriesDownloader::new(registry).with_retry(ProviderId::Yahoo, fast_retry());

        let report = downloader.download(&catalog(), end()).await;

        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
        let codes: Vec<&str> = report.failures.iter().map(|failure| failure.code).collect();
        // FRED is not registered at all, so its two symbols fail without an attempt.
        assert_eq!(report.failures.len(), 3);
        assert!(codes.contains(&"source.adapter_not_registered"));
        assert!(codes.contains(&"source.unavailable"));
    }
}
