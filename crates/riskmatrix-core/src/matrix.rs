//! Risk matrix document assembly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::IndicatorRegistry;
use crate::regime::Severity;
use crate::report::{IndicatorOutcome, ReportBuilder};
use crate::{ObservationDate, SeriesCatalog, SeriesStore, UtcDateTime};

pub const SCHEMA_VERSION: &str = "v1.0.0";

/// Severity histogram over one matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub low: usize,
    pub moderate: usize,
    pub elevated: usize,
    pub severe: usize,
    /// Status-only records of any kind.
    pub unavailable: usize,
    /// Most frequent severity; ties resolve to the higher one.
    pub overall_risk: Option<Severity>,
}

impl RiskSummary {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a IndicatorOutcome>) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome.severity() {
                Some(Severity::Low) => summary.low += 1,
                Some(Severity::Moderate) => summary.moderate += 1,
                Some(Severity::Elevated) => summary.elevated += 1,
                Some(Severity::Severe) => summary.severe += 1,
                None => summary.unavailable += 1,
            }
        }

        // `Severity::ALL` is ascending, so `max_by_key` keeps the last (highest) on ties.
        summary.overall_risk = Severity::ALL
            .into_iter()
            .map(|severity| (severity, summary.count(severity)))
            .filter(|(_, count)| *count > 0)
            .max_by_key(|(_, count)| *count)
            .map(|(severity, _)| severity);
        summary
    }

    pub const fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Low => self.low,
            Severity::Moderate => self.moderate,
            Severity::Elevated => self.elevated,
            Severity::Severe => self.severe,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub schema_version: String,
    pub generated_at: UtcDateTime,
    /// Latest observation date across the whole store.
    pub data_date: Option<ObservationDate>,
    pub indicator_count: usize,
    pub risk_summary: RiskSummary,
}

/// `{"metadata": ..., "main_indicators": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMatrix {
    pub metadata: Metadata,
    pub main_indicators: BTreeMap<String, IndicatorOutcome>,
}

impl RiskMatrix {
    /// Pretty JSON with a trailing newline. Non-ASCII text is kept verbatim.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let mut rendered = serde_json::to_string_pretty(self)?;
        rendered.push('\n');
        Ok(rendered)
    }

    /// Date used to name snapshots: the data date, else the generation date.
    pub fn snapshot_date(&self) -> ObservationDate {
        self.metadata
            .data_date
            .unwrap_or_else(|| self.metadata.generated_at.date())
    }
}

/// Runs every registered indicator against one store/catalog snapshot.
#[derive(Debug, Clone)]
pub struct RiskMatrixAssembler {
    registry: IndicatorRegistry,
}

impl RiskMatrixAssembler {
    pub fn new(registry: IndicatorRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &IndicatorRegistry {
        &self.registry
    }

    pub fn assemble(
        &self,
        store: &SeriesStore,
        catalog: &SeriesCatalog,
        generated_at: UtcDateTime,
    ) -> RiskMatrix {
        let builder = ReportBuilder::new(store, catalog);
        let main_indicators: BTreeMap<String, IndicatorOutcome> = self
            .registry
            .specs()
            .iter()
            .map(|spec| (spec.key.clone(), builder.evaluate(spec)))
            .collect();

        let risk_summary = RiskSummary::from_outcomes(main_indicators.values());
        info!(
            indicators = main_indicators.len(),
            unavailable = risk_summary.unavailable,
            overall_risk = ?risk_summary.overall_risk,
            "risk matrix assembled"
        );

        RiskMatrix {
            metadata: Metadata {
                schema_version: String::from(SCHEMA_VERSION),
                generated_at,
                data_date: store.latest_date(),
                indicator_count: main_indicators.len(),
                risk_summary,
            },
            main_indicators,
        }
    }
}
