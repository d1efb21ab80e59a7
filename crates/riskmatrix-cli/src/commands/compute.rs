use std::sync::Arc;

use riskmatrix_core::{
    IndicatorRegistry, RiskMatrixAssembler, RuntimeConfig, SeriesDownloader,
    SourceRegistryBuilder, SnapshotWriter, UtcDateTime,
};
use serde_json::json;
use tracing::info;

use crate::cli::ComputeArgs;
use crate::error::CliError;

use super::{load_catalog, CommandResult};

pub async fn run(args: &ComputeArgs, config: &RuntimeConfig) -> Result<CommandResult, CliError> {
    // Tables are validated here, before any network traffic.
    let assembler = RiskMatrixAssembler::new(IndicatorRegistry::standard()?);
    let catalog = load_catalog(args.catalog.as_deref(), config)?.snapshot();

    let mut builder = SourceRegistryBuilder::new();
    builder = if args.mock {
        builder.with_mock_mode()
    } else {
        match &config.fred_api_key {
            Some(key) => builder.with_fred_key(key.clone()),
            None => builder.with_real_clients(),
        }
    };
    let downloader = SeriesDownloader::new(Arc::new(builder.build()))
        .with_lookback_days(args.lookback_days.unwrap_or(config.lookback_days));

    let now = UtcDateTime::now();
    let download = downloader.download(&catalog, now.date()).await;
    let matrix = assembler.assemble(&download.store, &catalog, now);

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());
    let paths = SnapshotWriter::new(output_dir).write(&matrix)?;
    info!(dated = %paths.dated.display(), "snapshots written");

    let data = if args.print {
        serde_json::to_value(&matrix)?
    } else {
        json!({
            "data_date": matrix.metadata.data_date,
            "snapshot_date": matrix.snapshot_date(),
            "risk_summary": matrix.metadata.risk_summary,
            "files": {
                "dated": paths.dated.display().to_string(),
                "latest": paths.latest.display().to_string(),
            },
        })
    };

    let errors = download
        .failures
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    let mut result = CommandResult::ok(data).with_errors(errors);
    if args.mock {
        result = result.with_warning("mock mode: series are synthetic");
    }
    Ok(result)
}
