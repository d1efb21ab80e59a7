//! Per-indicator evaluation.
//!
//! [`ReportBuilder::evaluate`] turns one [`IndicatorSpec`] into either a full
//! [`IndicatorReport`] or a status-only record. It never fails: missing or short
//! series degrade to a status so the surrounding matrix is always produced.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::change::{
    annualized_volatility, daily_returns, historical_var, percent_change, percentile_rank, round2,
};
use crate::indicators::{IndicatorSpec, Metric};
use crate::regime::{classify, Severity};
use crate::{
    Derivation, Frequency, ObservationDate, SeriesCatalog, SeriesStore, SeriesSymbol, TimeSeries,
};

/// Classified view of one indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReport {
    pub indicator: String,
    pub symbol: SeriesSymbol,
    pub current_value: f64,
    pub date: ObservationDate,
    pub statistics: BTreeMap<String, f64>,
    pub regime: String,
    pub severity: Severity,
    /// Static bucket text, flattened next to the fields above.
    #[serde(flatten)]
    pub narrative: BTreeMap<String, String>,
}

/// Why an indicator has no report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Series absent from the store, a derived leg missing, or zero observations.
    Unavailable,
    /// Every observation was missing.
    NoData,
    /// Fewer observations than the metric needs.
    InsufficientData,
}

impl ReportStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::NoData => "no_data",
            Self::InsufficientData => "insufficient_data",
        }
    }
}

/// Entry of `main_indicators`: a report, or `{"status": ...}` and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorOutcome {
    Report(IndicatorReport),
    Status { status: ReportStatus },
}

impl IndicatorOutcome {
    pub const fn status(status: ReportStatus) -> Self {
        Self::Status { status }
    }

    pub fn report(&self) -> Option<&IndicatorReport> {
        match self {
            Self::Report(report) => Some(report),
            Self::Status { .. } => None,
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        self.report().map(|report| report.severity)
    }
}

/// Evaluates indicator specs against one immutable store and catalog.
#[derive(Debug, Clone, Copy)]
pub struct ReportBuilder<'a> {
    store: &'a SeriesStore,
    catalog: &'a SeriesCatalog,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(store: &'a SeriesStore, catalog: &'a SeriesCatalog) -> Self {
        Self { store, catalog }
    }

    /// Stored series for `symbol`, or its derived spread when the catalog defines one.
    pub fn resolve(&self, symbol: &SeriesSymbol) -> Option<Cow<'a, TimeSeries>> {
        if let Some(series) = self.store.get(symbol) {
            return Some(Cow::Borrowed(series));
        }

        match &self.catalog.get(symbol)?.derived_from {
            Some(Derivation::Spread {
                minuend,
                subtrahend,
            }) => {
                let left = self.store.get(minuend)?;
                let right = self.store.get(subtrahend)?;
                Some(Cow::Owned(left.spread(right)))
            }
            None => None,
        }
    }

    pub fn evaluate(&self, spec: &IndicatorSpec) -> IndicatorOutcome {
        let Some(series) = self.resolve(&spec.symbol).filter(|series| !series.is_empty()) else {
            warn!(indicator = %spec.key, symbol = %spec.symbol, "series unavailable");
            return IndicatorOutcome::status(ReportStatus::Unavailable);
        };

        let clean = series.drop_missing();
        let Some((date, current)) = clean.last_valid() else {
            warn!(indicator = %spec.key, symbol = %spec.symbol, "series has no valid observations");
            return IndicatorOutcome::status(ReportStatus::NoData);
        };

        let entry = self.catalog.get(&spec.symbol);
        let frequency = entry.map_or(Frequency::Daily, |entry| entry.frequency);
        let values = clean.values();
        let needed = spec.metric.min_observations(frequency);
        if values.len() < needed {
            warn!(
                indicator = %spec.key,
                symbol = %spec.symbol,
                observations = values.len(),
                needed,
                "insufficient history"
            );
            return IndicatorOutcome::status(ReportStatus::InsufficientData);
        }

        let mut statistics = BTreeMap::new();
        for window in frequency.change_windows() {
            let key = format!("change_{}{}", window.label, spec.change_mode.key_suffix());
            statistics.insert(key, round2(spec.change_mode.apply(&values, window.offset)));
        }
        if spec.percentile {
            if let Some(rank) = percentile_rank(&values, frequency.observations_per_year()) {
                statistics.insert(String::from("percentile_1y"), round2(rank));
            }
        }

        let Some(metric) = metric_value(spec.metric, &values, frequency, &mut statistics) else {
            warn!(indicator = %spec.key, symbol = %spec.symbol, "metric could not be computed");
            return IndicatorOutcome::status(ReportStatus::InsufficientData);
        };

        let verdict = classify(metric, &spec.table);
        debug!(
            indicator = %spec.key,
            value = metric,
            regime = verdict.label,
            "indicator classified"
        );

        IndicatorOutcome::Report(IndicatorReport {
            indicator: entry.map_or_else(|| spec.symbol.to_string(), |entry| entry.name.clone()),
            symbol: spec.symbol.clone(),
            current_value: round2(current),
            date,
            statistics,
            regime: verdict.label.to_owned(),
            severity: verdict.severity,
            narrative: verdict.narrative.clone(),
        })
    }
}

/// Value handed to the classifier; extra metric statistics land in `statistics`.
fn metric_value(
    metric: Metric,
    values: &[f64],
    frequency: Frequency,
    statistics: &mut BTreeMap<String, f64>,
) -> Option<f64> {
    match metric {
        Metric::Level => values.last().copied(),
        Metric::YearOverYear => {
            let offset = -(frequency.observations_per_year() as isize);
            let yoy = percent_change(values, offset);
            statistics.insert(String::from("year_over_year"), round2(yoy));
            Some(yoy)
        }
        Metric::AnnualizedVolatility { window } => {
            let returns = daily_returns(values);
            let trailing = &returns[returns.len().saturating_sub(window)..];
            let volatility = annualized_volatility(trailing)?;
            statistics.insert(String::from("annualized_volatility"), round2(volatility));
            if let Some(var) = historical_var(trailing, 5.0) {
                statistics.insert(String::from("var_95"), round2(var));
            }
            if let Some(var) = historical_var(trailing, 1.0) {
                statistics.insert(String::from("var_99"), round2(var));
            }
            Some(volatility)
        }
    }
}
