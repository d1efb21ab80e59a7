use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::{fetch_body, health_from_circuit, synthetic_series};
use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{DataSource, HealthStatus, SeriesRequest, SourceError};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::{Observation, ObservationDate, ProviderId, TimeSeries};

const OBSERVATIONS_URL: &str = "https://api.stlouisfed.org/fred/series/observations";

/// FRED placeholder for a date without a published value.
const MISSING_VALUE: &str = ".";

/// St. Louis Fed FRED adapter.
#[derive(Clone)]
pub struct FredAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    circuit_breaker: Arc<CircuitBreaker>,
    use_real_api: bool,
}

impl Default for FredAdapter {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
            api_key: None,
            circuit_breaker: Arc::new(CircuitBreaker::for_provider(ProviderId::Fred)),
            use_real_api: false,
        }
    }
}

impl FredAdapter {
    /// Real adapter. Without an API key every fetch reports the source as unavailable.
    pub fn with_http_client(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        let use_real_api = !http_client.is_mock();
        Self {
            http_client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            use_real_api,
            ..Self::default()
        }
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_real_series(&self, req: &SeriesRequest) -> Result<TimeSeries, SourceError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            SourceError::not_configured("FRED API key is not configured (set FRED_API_KEY)")
        })?;

        let endpoint = format!(
            "{OBSERVATIONS_URL}?series_id={}&api_key={}&file_type=json&observation_start={}&observation_end={}",
            urlencoding::encode(req.symbol.as_str()),
            urlencoding::encode(api_key),
            req.start,
            req.end,
        );
        // The URL carries the key; log the symbol only.
        debug!(symbol = %req.symbol, "requesting FRED observations");

        let request = HttpRequest::get(endpoint).with_timeout_ms(15_000);
        let body = fetch_body(
            ProviderId::Fred,
            self.http_client.as_ref(),
            &self.circuit_breaker,
            request,
        )
        .await?;
        parse_observations(&body)
    }
}

impl DataSource for FredAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Fred
    }

    fn fetch_series<'a>(
        &'a self,
        req: SeriesRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TimeSeries, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            if self.use_real_api {
                self.fetch_real_series(&req).await
            } else {
                Ok(synthetic_series(&req))
            }
        })
    }

    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>> {
        Box::pin(async move {
            if self.use_real_api && self.api_key.is_none() {
                return HealthStatus::unhealthy();
            }
            health_from_circuit(self.circuit_breaker.state())
        })
    }
}

#[derive(Debug, Deserialize)]
struct FredObservationsResponse {
    #[serde(default)]
    observations: Vec<FredObservation>,
}

#[derive(Debug, Deserialize)]
struct FredObservation {
    date: String,
    value: String,
}

/// Parses a `series/observations` payload; `"."` and unparsable values become missing.
fn parse_observations(body: &str) -> Result<TimeSeries, SourceError> {
    let payload: FredObservationsResponse = serde_json::from_str(body)
        .map_err(|error| SourceError::internal(format!("failed to parse FRED response: {error}")))?;

    let observations = payload
        .observations
        .into_iter()
        .map(|row| {
            let date = ObservationDate::parse(&row.date)?;
            let value = match row.value.trim() {
                MISSING_VALUE => None,
                raw => raw.parse::<f64>().ok().filter(|value| value.is_finite()),
            };
            Ok(Observation::new(date, value))
        })
        .collect::<Result<Vec<_>, SourceError>>()?;

    Ok(TimeSeries::from_unsorted(observations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::{HealthState, SourceErrorKind};
    use crate::http_client::{HttpError, HttpResponse};
    use crate::{Frequency, SeriesSymbol};
    use std::sync::Mutex;

    struct RecordingHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn with_body(body: &str) -> Self {
            Self {
                response: Ok(HttpResponse::ok_json(body)),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failure() -> Self {
            Self {
                response: Err(HttpError::new("upstream timeout")),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn recorded_urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .iter()
                .map(|request| request.url.clone())
                .collect()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn request() -> SeriesRequest {
        SeriesRequest::new(
            SeriesSymbol::parse("VIXCLS").expect("symbol"),
            Frequency::Daily,
            ObservationDate::from_ymd(2024, 1, 1).expect("date"),
            ObservationDate::from_ymd(2024, 1, 31).expect("date"),
        )
        .expect("request")
    }

    #[test]
    fn dot_values_are_missing() {
        let series = parse_observations(
            r#"{"observations": [
                {"date": "2024-01-02", "value": "13.20"},
                {"date": "2024-01-03", "value": "."},
                {"date": "2024-01-04", "value": "14.10"}
            ]}"#,
        )
        .expect("payload should parse");

        assert_eq!(series.len(), 3);
        assert_eq!(series.observations()[1].value, None);
        assert_eq!(series.values(), vec![13.2, 14.1]);
    }

    #[tokio::test]
    async fn real_fetch_builds_observations_url() {
        let client = Arc::new(RecordingHttpClient::with_body(
            r#"{"observations": [{"date": "2024-01-02", "value": "13.20"}]}"#,
        ));
        let adapter = FredAdapter::with_http_client(client.clone(), Some(String::from("demo-key")));

        let series = adapter.fetch_series(request()).await.expect("fetch should succeed");
        assert_eq!(series.values(), vec![13.2]);

        let urls = client.recorded_urls();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].contains("series_id=VIXCLS"));
        assert!(urls[0].contains("observation_start=2024-01-01"));
        assert!(urls[0].contains("file_type=json"));
    }

    #[tokio::test]
    async fn missing_key_is_not_retryable_and_unhealthy() {
        let client = Arc::new(RecordingHttpClient::with_body("{}"));
        let adapter = FredAdapter::with_http_client(client.clone(), None);

        let error = adapter.fetch_series(request()).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert!(!error.retryable());
        assert!(client.recorded_urls().is_empty());
        assert_eq!(adapter.health().await.state, HealthState::Unhealthy);
    }

    #[tokio::test]
    async fn circuit_breaker_opens_after_repeated_transport_failures() {
        let adapter = FredAdapter::with_http_client(
            Arc::new(RecordingHttpClient::failure()),
            Some(String::from("demo-key")),
        );

        for _ in 0..3 {
            let error = adapter.fetch_series(request()).await.expect_err("call should fail");
            assert!(error.retryable());
        }

        assert_eq!(adapter.health().await.state, HealthState::Unhealthy);
        let error = adapter.fetch_series(request()).await.expect_err("breaker should block");
        assert!(error.message().contains("circuit breaker is open"));
    }
}
