use std::path::PathBuf;

use riskmatrix_core::{
    CatalogEntry, Frequency, ProviderId, RuntimeConfig, SeriesCatalog, SeriesSymbol,
};
use serde_json::json;
use tracing::info;

use crate::cli::{CatalogAddArgs, CatalogArgs, CatalogCommand, FrequencyArg, SourceArg};
use crate::error::CliError;

use super::CommandResult;

const DEFAULT_CATALOG_FILE: &str = "catalog.json";

pub fn run(args: &CatalogArgs, config: &RuntimeConfig) -> Result<CommandResult, CliError> {
    let path = args
        .file
        .clone()
        .or_else(|| config.catalog_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_FILE));
    let exists = path.is_file();
    let current = if exists {
        SeriesCatalog::load(&path)?
    } else {
        SeriesCatalog::standard()?
    };

    match &args.command {
        CatalogCommand::List => {
            let mut result = CommandResult::ok(serde_json::to_value(&current)?);
            if !exists {
                result = result.with_warning(format!(
                    "catalog file '{}' not found, showing the built-in catalog",
                    path.display()
                ));
            }
            Ok(result)
        }
        CatalogCommand::Add(add) => {
            let symbol = SeriesSymbol::parse(&add.symbol)?;
            let updated = current.with_entry(symbol.clone(), entry_from_args(add)?)?;
            updated.save(&path)?;
            info!(%symbol, path = %path.display(), "catalog entry saved");
            Ok(CommandResult::ok(json!({
                "file": path.display().to_string(),
                "added": symbol,
                "entries": updated.len(),
            })))
        }
        CatalogCommand::Remove(remove) => {
            let symbol = SeriesSymbol::parse(&remove.symbol)?;
            let updated = current.without_entry(&symbol)?;
            updated.save(&path)?;
            info!(%symbol, path = %path.display(), "catalog entry removed");
            Ok(CommandResult::ok(json!({
                "file": path.display().to_string(),
                "removed": symbol,
                "entries": updated.len(),
            })))
        }
    }
}

fn entry_from_args(args: &CatalogAddArgs) -> Result<CatalogEntry, CliError> {
    let frequency = match args.frequency {
        FrequencyArg::Daily => Frequency::Daily,
        FrequencyArg::Weekly => Frequency::Weekly,
        FrequencyArg::Monthly => Frequency::Monthly,
    };

    match (&args.minuend, &args.subtrahend, args.source) {
        (Some(minuend), Some(subtrahend), None) => Ok(CatalogEntry::spread(
            args.name.clone(),
            frequency,
            SeriesSymbol::parse(minuend)?,
            SeriesSymbol::parse(subtrahend)?,
        )),
        (None, None, Some(source)) => {
            let provider = match source {
                SourceArg::Fred => ProviderId::Fred,
                SourceArg::Yahoo => ProviderId::Yahoo,
            };
            Ok(CatalogEntry::remote(args.name.clone(), provider, frequency))
        }
        _ => Err(CliError::Command(String::from(
            "catalog add needs either --source or both --minuend and --subtrahend",
        ))),
    }
}
