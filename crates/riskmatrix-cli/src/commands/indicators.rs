use riskmatrix_core::{IndicatorRegistry, IndicatorSpec};
use serde::Serialize;

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct IndicatorRow<'a> {
    key: &'a str,
    symbol: &'a str,
    metric: &'static str,
    change_mode: riskmatrix_core::ChangeMode,
    percentile: bool,
    orientation: &'static str,
    buckets: Vec<BucketRow<'a>>,
}

#[derive(Debug, Serialize)]
struct BucketRow<'a> {
    /// `< 15`, `> 25`, or `otherwise` for the catch-all.
    rule: String,
    label: &'a str,
    severity: riskmatrix_core::Severity,
}

pub fn run() -> Result<CommandResult, CliError> {
    let registry = IndicatorRegistry::standard()?;
    let rows: Vec<IndicatorRow<'_>> = registry.specs().iter().map(describe).collect();
    Ok(CommandResult::ok(serde_json::to_value(rows)?))
}

fn describe(spec: &IndicatorSpec) -> IndicatorRow<'_> {
    let buckets = spec
        .table
        .comparisons()
        .zip(spec.table.buckets())
        .map(|(comparison, bucket)| BucketRow {
            rule: comparison.map_or_else(|| String::from("otherwise"), |rule| rule.to_string()),
            label: bucket.label(),
            severity: bucket.severity(),
        })
        .collect();

    IndicatorRow {
        key: &spec.key,
        symbol: spec.symbol.as_str(),
        metric: spec.metric.as_str(),
        change_mode: spec.change_mode,
        percentile: spec.percentile,
        orientation: spec.table.orientation().as_str(),
        buckets,
    }
}
