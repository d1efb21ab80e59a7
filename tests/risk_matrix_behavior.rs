use riskmatrix_core::report::{IndicatorOutcome, ReportBuilder, ReportStatus};
use riskmatrix_core::{
    IndicatorRegistry, Observation, ObservationDate, RiskMatrixAssembler, SeriesCatalog,
    SeriesStore, SeriesSymbol, Severity, TimeSeries, UtcDateTime,
};
use serde_json::json;

fn symbol(raw: &str) -> SeriesSymbol {
    SeriesSymbol::parse(raw).expect("valid symbol")
}

fn date(raw: &str) -> ObservationDate {
    ObservationDate::parse(raw).expect("valid date")
}

/// Consecutive calendar days starting at `start`.
fn series_from(start: &str, values: &[Option<f64>]) -> TimeSeries {
    let start = date(start);
    TimeSeries::new(
        values
            .iter()
            .enumerate()
            .map(|(index, value)| Observation::new(start.add_days(index as i64), *value))
            .collect(),
    )
    .expect("ordered series")
}

fn generated_at() -> UtcDateTime {
    UtcDateTime::parse("2024-06-03T08:00:00Z").expect("timestamp")
}

fn assembler() -> RiskMatrixAssembler {
    RiskMatrixAssembler::new(IndicatorRegistry::standard().expect("registry"))
}

#[test]
fn vix_series_ending_at_twelve_reports_low_volatility() {
    // Given: VIXCLS climbing to 20 and then falling back to 12
    let values: Vec<Option<f64>> = [18.0, 19.0, 20.0, 17.0, 15.5, 14.0, 13.0, 12.0]
        .into_iter()
        .map(Some)
        .collect();
    let store =
        SeriesStore::new().with_series(symbol("VIXCLS"), series_from("2024-05-27", &values));
    let catalog = SeriesCatalog::standard().expect("catalog");

    // When: the matrix is assembled
    let matrix = assembler().assemble(&store, &catalog, generated_at());

    // Then: the vix entry is a full report in the low-volatility regime
    let vix = matrix.main_indicators["vix"].report().expect("vix report");
    assert_eq!(vix.regime, "低波动制度");
    assert_eq!(vix.severity, Severity::Low);
    assert_eq!(vix.current_value, 12.0);
    assert_eq!(vix.date, date("2024-06-03"));
    assert_eq!(vix.indicator, "CBOE波动率指数(VIX)");
    assert_eq!(vix.statistics.get("change_1w"), Some(&-40.0));
    assert!(vix.statistics.contains_key("percentile_1y"));
}

#[test]
fn all_missing_series_serializes_to_bare_no_data_status() {
    // Given: a VIX series where every value is missing or NaN
    let store = SeriesStore::new().with_series(
        symbol("VIXCLS"),
        series_from("2024-06-01", &[None, Some(f64::NAN), None]),
    );
    let catalog = SeriesCatalog::standard().expect("catalog");

    // When: the matrix is assembled
    let matrix = assembler().assemble(&store, &catalog, generated_at());

    // Then: the record carries nothing but the status
    let vix = serde_json::to_value(&matrix.main_indicators["vix"]).expect("json");
    assert_eq!(vix, json!({"status": "no_data"}));
}

#[test]
fn absent_series_are_unavailable_and_counted() {
    let catalog = SeriesCatalog::standard().expect("catalog");
    let store = SeriesStore::new().with_series(
        symbol("VIXCLS"),
        series_from("2024-05-31", &[Some(20.0), Some(21.0)]),
    );

    let matrix = assembler().assemble(&store, &catalog, generated_at());

    assert_eq!(
        matrix.main_indicators["fed_funds"],
        IndicatorOutcome::status(ReportStatus::Unavailable)
    );
    assert_eq!(matrix.metadata.indicator_count, matrix.main_indicators.len());
    assert_eq!(matrix.metadata.risk_summary.unavailable, matrix.main_indicators.len() - 1);
    assert_eq!(matrix.metadata.risk_summary.overall_risk, Some(Severity::Moderate));
    assert_eq!(matrix.metadata.data_date, Some(date("2024-06-01")));
}

#[test]
fn derived_spread_only_keeps_dates_present_in_both_legs() {
    // Given: a 10y series from Jan 1 and a 2y series from Jan 3, both five days long
    let store = SeriesStore::new()
        .with_series(
            symbol("DGS10"),
            series_from("2024-01-01", &[Some(4.0), Some(4.1), Some(4.2), Some(4.3), Some(4.4)]),
        )
        .with_series(
            symbol("DGS2"),
            series_from("2024-01-03", &[Some(4.5), None, Some(4.6), Some(4.7), Some(4.8)]),
        );
    let catalog = SeriesCatalog::standard().expect("catalog");

    // When: the derived 10y-2y spread is resolved
    let spread = ReportBuilder::new(&store, &catalog)
        .resolve(&symbol("T10Y2Y"))
        .expect("spread derivable");

    // Then: only Jan 3 and Jan 5 survive; Jan 4 is missing on the 2y leg
    let dates: Vec<String> = spread
        .observations()
        .iter()
        .map(|observation| observation.date.to_string())
        .collect();
    assert_eq!(dates, ["2024-01-03", "2024-01-05"]);
    let last = spread.last_valid().expect("value");
    assert!((last.1 - (-0.2)).abs() < 1e-9);
}

#[test]
fn derived_spread_with_missing_leg_is_unavailable() {
    let store = SeriesStore::new().with_series(
        symbol("DGS10"),
        series_from("2024-01-01", &[Some(4.0), Some(4.1)]),
    );
    let catalog = SeriesCatalog::standard().expect("catalog");

    let matrix = assembler().assemble(&store, &catalog, generated_at());

    assert_eq!(
        matrix.main_indicators["yield_curve_10y2y"],
        IndicatorOutcome::status(ReportStatus::Unavailable)
    );
    assert!(matrix.main_indicators["treasury_10y"].report().is_some());
}

#[test]
fn assembling_twice_gives_identical_documents() {
    // Given: one store and catalog snapshot and a fixed generation time
    let store = SeriesStore::new()
        .with_series(
            symbol("VIXCLS"),
            series_from("2024-05-01", &[Some(14.0), Some(16.0), Some(22.0), Some(31.0)]),
        )
        .with_series(
            symbol("DGS10"),
            series_from("2024-05-01", &[Some(4.2), Some(4.3), Some(4.35), Some(4.4)]),
        )
        .with_series(
            symbol("DGS2"),
            series_from("2024-05-01", &[Some(4.9), Some(4.8), Some(4.85), Some(4.7)]),
        );
    let catalog = SeriesCatalog::standard().expect("catalog");
    let assembler = assembler();

    // When: the matrix is assembled twice
    let first = assembler.assemble(&store, &catalog, generated_at());
    let second = assembler.assemble(&store, &catalog, generated_at());

    // Then: both render to the same bytes
    assert_eq!(first, second);
    assert_eq!(
        first.to_json_pretty().expect("render"),
        second.to_json_pretty().expect("render")
    );
}

#[test]
fn only_generated_at_differs_between_runs() {
    let store = SeriesStore::new().with_series(
        symbol("VIXCLS"),
        series_from("2024-05-01", &[Some(14.0), Some(16.0)]),
    );
    let catalog = SeriesCatalog::standard().expect("catalog");
    let assembler = assembler();

    let mut early = assembler.assemble(&store, &catalog, generated_at());
    let late = assembler.assemble(
        &store,
        &catalog,
        UtcDateTime::parse("2024-06-04T09:30:00Z").expect("timestamp"),
    );

    assert_ne!(early, late);
    early.metadata.generated_at = late.metadata.generated_at;
    assert_eq!(early, late);
}

#[test]
fn matrix_document_has_two_top_level_sections() {
    let catalog = SeriesCatalog::standard().expect("catalog");
    let matrix = assembler().assemble(&SeriesStore::new(), &catalog, generated_at());

    let value = serde_json::to_value(&matrix).expect("json");
    let keys: Vec<&str> = value
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, ["main_indicators", "metadata"]);
    assert_eq!(value["metadata"]["schema_version"], "v1.0.0");
    assert_eq!(value["metadata"]["generated_at"], "2024-06-03T08:00:00Z");
    assert_eq!(value["metadata"]["data_date"], serde_json::Value::Null);
}
