use std::fs::File;
use std::io::BufReader;

use riskmatrix_core::{
    IndicatorRegistry, RiskMatrixAssembler, RuntimeConfig, SeriesStore, SnapshotWriter,
    UtcDateTime,
};

use crate::cli::ClassifyArgs;
use crate::error::CliError;

use super::{load_catalog, CommandResult};

pub fn run(args: &ClassifyArgs, config: &RuntimeConfig) -> Result<CommandResult, CliError> {
    let assembler = RiskMatrixAssembler::new(IndicatorRegistry::standard()?);
    let catalog = load_catalog(args.catalog.as_deref(), config)?;

    let file = File::open(&args.input)?;
    let store = SeriesStore::from_json_reader(BufReader::new(file))?;
    let matrix = assembler.assemble(&store, &catalog, UtcDateTime::now());

    let mut result = CommandResult::ok(serde_json::to_value(&matrix)?);
    if let Some(output_dir) = &args.output_dir {
        let paths = SnapshotWriter::new(output_dir).write(&matrix)?;
        tracing::info!(latest = %paths.latest.display(), "snapshots written");
    }
    if store.is_empty() {
        result = result.with_warning("input file contains no series");
    }
    Ok(result)
}
