use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use super::{fetch_body, health_from_circuit, synthetic_series};
use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{DataSource, HealthStatus, SeriesRequest, SourceError};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::{Frequency, Observation, ObservationDate, ProviderId, TimeSeries, UtcDateTime};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance adapter for index and FX levels (`^VIX`, `^GSPC`, `DX-Y.NYB`).
///
/// Uses the unauthenticated chart endpoint and keeps daily closes only.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
    use_real_api: bool,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
            circuit_breaker: Arc::new(CircuitBreaker::for_provider(ProviderId::Yahoo)),
            use_real_api: false,
        }
    }
}

impl YahooAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        let use_real_api = !http_client.is_mock();
        Self {
            http_client,
            use_real_api,
            ..Self::default()
        }
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    async fn fetch_real_series(&self, req: &SeriesRequest) -> Result<TimeSeries, SourceError> {
        let endpoint = format!(
            "{CHART_URL}/{}?period1={}&period2={}&interval={}&events=history",
            urlencoding::encode(req.symbol.as_str()),
            unix_midnight(req.start),
            // period2 is exclusive.
            unix_midnight(req.end.add_days(1)),
            chart_interval(req.frequency),
        );

        let request = HttpRequest::get(endpoint)
            .with_header("referer", "https://finance.yahoo.com/")
            .with_header("accept", "application/json")
            .with_timeout_ms(10_000);
        let body = fetch_body(
            ProviderId::Yahoo,
            self.http_client.as_ref(),
            &self.circuit_breaker,
            request,
        )
        .await?;
        parse_chart(&body)
    }
}

impl DataSource for YahooAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
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
        Box::pin(async move { health_from_circuit(self.circuit_breaker.state()) })
    }
}

fn chart_interval(frequency: Frequency) -> &'static str {
    match frequency {
        Frequency::Daily => "1d",
        Frequency::Weekly => "1wk",
        Frequency::Monthly => "1mo",
    }
}

fn unix_midnight(date: ObservationDate) -> i64 {
    date.into_inner().midnight().assume_utc().unix_timestamp()
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Pairs chart timestamps with closes; null closes become missing observations.
fn parse_chart(body: &str) -> Result<TimeSeries, SourceError> {
    let chart_response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {}", e)))?;

    if let Some(error) = chart_response.chart.error {
        let message = format!("yahoo chart API error {}: {}", error.code, error.description);
        return Err(if error.code.eq_ignore_ascii_case("Not Found") {
            SourceError::invalid_request(message)
        } else {
            SourceError::unavailable(message)
        });
    }

    let result = chart_response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::internal("no chart data in response"))?;

    // A symbol with no trading days in range has no quote rows at all.
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();

    let observations = result
        .timestamp
        .iter()
        .enumerate()
        .map(|(index, &seconds)| {
            let date = UtcDateTime::from_unix_timestamp(seconds)?.date();
            let close = closes.get(index).copied().flatten();
            Ok(Observation::new(date, close.filter(|value| value.is_finite())))
        })
        .collect::<Result<Vec<_>, SourceError>>()?;

    Ok(TimeSeries::from_unsorted(observations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::{HttpError, HttpResponse};
    use crate::SeriesSymbol;
    use std::sync::Mutex;

    struct CannedHttpClient {
        status: u16,
        body: String,
        urls: Mutex<Vec<String>>,
    }

    impl CannedHttpClient {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_owned(),
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for CannedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.urls.lock().expect("url log").push(request.url);
            let response = HttpResponse {
                status: self.status,
                body: self.body.clone(),
            };
            Box::pin(async move { Ok(response) })
        }
    }

    fn vix_request() -> SeriesRequest {
        SeriesRequest::new(
            SeriesSymbol::parse("^VIX").expect("symbol"),
            Frequency::Daily,
            ObservationDate::from_ymd(2024, 1, 2).expect("date"),
            ObservationDate::from_ymd(2024, 1, 3).expect("date"),
        )
        .expect("request")
    }

    #[test]
    fn parses_closes_and_keeps_null_rows_missing() {
        // 2024-01-02T14:30Z and 2024-01-03T14:30Z
        let series = parse_chart(
            r#"{"chart":{"result":[{"timestamp":[1704205800,1704292200],
                "indicators":{"quote":[{"close":[13.2,null]}]}}],"error":null}}"#,
        )
        .expect("chart should parse");

        assert_eq!(series.len(), 2);
        assert_eq!(series.observations()[0].date.to_string(), "2024-01-02");
        assert_eq!(series.observations()[0].value, Some(13.2));
        assert_eq!(series.observations()[1].value, None);
    }

    #[test]
    fn chart_error_not_found_is_not_retryable() {
        let error = parse_chart(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        )
        .expect_err("error payload must fail");

        assert_eq!(error.kind(), SourceErrorKind::InvalidRequest);
        assert!(error.message().contains("delisted"));
    }

    #[tokio::test]
    async fn real_fetch_encodes_symbol_and_period() {
        let client = Arc::new(CannedHttpClient::new(
            200,
            r#"{"chart":{"result":[{"timestamp":[1704205800],"indicators":{"quote":[{"close":[13.2]}]}}],"error":null}}"#,
        ));
        let adapter = YahooAdapter::with_http_client(client.clone());

        let series = adapter
            .fetch_series(vix_request())
            .await
            .expect("fetch should succeed");
        assert_eq!(series.values(), vec![13.2]);

        let urls = client.urls.lock().expect("url log").clone();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].contains("/chart/%5EVIX?"));
        assert!(urls[0].contains("period1=1704153600"));
        assert!(urls[0].contains("period2=1704326400"));
        assert!(urls[0].contains("interval=1d"));
    }

    #[tokio::test]
    async fn throttled_response_is_retryable() {
        let adapter = YahooAdapter::with_http_client(Arc::new(CannedHttpClient::new(429, "")));
        let error = adapter
            .fetch_series(vix_request())
            .await
            .expect_err("429 must fail");

        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
        assert!(error.retryable());
    }
}
