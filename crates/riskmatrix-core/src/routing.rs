use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;

use serde::Serialize;

use crate::adapters::{FredAdapter, YahooAdapter};
use crate::data_source::{DataSource, HealthState, HealthStatus, SourceError};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::provider_policy::ProviderPolicy;
use crate::ProviderId;

/// Source snapshot used by the `sources` CLI command.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSnapshot {
    pub id: ProviderId,
    pub health: HealthStatus,
    pub policy: ProviderPolicy,
}

impl SourceSnapshot {
    pub fn available(&self) -> bool {
        self.health.state != HealthState::Unhealthy
    }

    pub fn status_label(&self) -> &'static str {
        if !self.health.rate_available {
            return "rate_limited";
        }

        match self.health.state {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

/// One adapter per provider, chosen when the registry is built.
pub struct SourceRegistry {
    adapters: BTreeMap<ProviderId, Arc<dyn DataSource>>,
}

impl Default for SourceRegistry {
    /// Mock adapters for every provider.
    fn default() -> Self {
        Self::new(vec![
            Arc::new(FredAdapter::default()),
            Arc::new(YahooAdapter::default()),
        ])
    }
}

impl SourceRegistry {
    /// Later adapters replace earlier ones registered for the same provider.
    pub fn new(adapters: Vec<Arc<dyn DataSource>>) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.id(), adapter))
            .collect();
        Self { adapters }
    }

    pub fn get(&self, provider: ProviderId) -> Result<Arc<dyn DataSource>, SourceError> {
        self.adapters
            .get(&provider)
            .cloned()
            .ok_or_else(|| SourceError::adapter_not_registered(provider))
    }

    pub fn providers(&self) -> impl Iterator<Item = ProviderId> + '_ {
        self.adapters.keys().copied()
    }

    pub async fn snapshot(&self, provider: ProviderId) -> Option<SourceSnapshot> {
        let adapter = self.adapters.get(&provider)?;
        Some(SourceSnapshot {
            id: provider,
            health: adapter.health().await,
            policy: ProviderPolicy::default_for(provider),
        })
    }

    pub async fn snapshots(&self) -> Vec<SourceSnapshot> {
        let mut snapshots = Vec::with_capacity(self.adapters.len());
        for provider in self.adapters.keys().copied() {
            if let Some(snapshot) = self.snapshot(provider).await {
                snapshots.push(snapshot);
            }
        }
        snapshots
    }
}

/// Builder for a [`SourceRegistry`] backed by mock or real HTTP transports.
///
/// # Environment Variables
///
/// | Provider | Primary Env Var | Fallback Env Var |
/// |----------|----------------|------------------|
/// | FRED | `RISKMATRIX_FRED_API_KEY` | `FRED_API_KEY` |
/// | Yahoo | (no key required) | - |
///
/// # Example
///
/// ```rust,ignore
/// use riskmatrix_core::SourceRegistryBuilder;
///
/// let registry = SourceRegistryBuilder::new().with_real_clients().build();
/// let offline = SourceRegistryBuilder::new().with_mock_mode().build();
/// ```
#[derive(Default)]
pub struct SourceRegistryBuilder {
    use_mock: bool,
    fred_api_key: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl SourceRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All adapters serve deterministic synthetic series.
    pub fn with_mock_mode(mut self) -> Self {
        self.use_mock = true;
        self
    }

    /// Real transports; the FRED key is read from the environment.
    pub fn with_real_clients(mut self) -> Self {
        self.use_mock = false;
        self.fred_api_key = env::var("RISKMATRIX_FRED_API_KEY")
            .or_else(|_| env::var("FRED_API_KEY"))
            .ok()
            .or(self.fred_api_key);
        self
    }

    pub fn with_fred_key(mut self, key: impl Into<String>) -> Self {
        self.fred_api_key = Some(key.into());
        self
    }

    /// Overrides the transport shared by real adapters.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn build(self) -> SourceRegistry {
        if self.use_mock {
            return SourceRegistry::default();
        }

        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        SourceRegistry::new(vec![
            Arc::new(FredAdapter::with_http_client(
                Arc::clone(&http_client),
                self.fred_api_key,
            )),
            Arc::new(YahooAdapter::with_http_client(http_client)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::NoopHttpClient;

    #[tokio::test]
    async fn mock_registry_serves_every_provider() {
        let registry = SourceRegistryBuilder::new().with_mock_mode().build();

        for provider in ProviderId::ALL {
            let adapter = registry.get(provider).expect("adapter registered");
            assert_eq!(adapter.id(), provider);
        }

        let snapshots = registry.snapshots().await;
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots.iter().all(SourceSnapshot::available));
        assert!(snapshots
            .iter()
            .all(|snapshot| snapshot.status_label() == "healthy"));
    }

    #[test]
    fn unregistered_provider_is_reported() {
        let registry = SourceRegistry::new(vec![Arc::new(YahooAdapter::default())]);
        let error = match registry.get(ProviderId::Fred) {
            Ok(_) => panic!("fred must be missing"),
            Err(error) => error,
        };
        assert_eq!(error.kind(), SourceErrorKind::AdapterNotRegistered);
        assert!(!error.retryable());
    }

    #[tokio::test]
    async fn snapshot_carries_provider_policy() {
        let registry = SourceRegistryBuilder::new()
            .with_http_client(Arc::new(NoopHttpClient))
            .build();
        let snapshot = registry
            .snapshot(ProviderId::Yahoo)
            .await
            .expect("yahoo snapshot");
        assert_eq!(snapshot.policy, ProviderPolicy::yahoo_default());
    }
}
