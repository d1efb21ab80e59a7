mod catalog;
mod classify;
mod compute;
mod indicators;
mod publish;
mod sources;

use std::path::Path;
use std::time::Instant;

use riskmatrix_core::{RuntimeConfig, SeriesCatalog};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::{Metadata, RunId};
use crate::output::Envelope;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<Value>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<Value>) -> Self {
        self.errors.extend(errors);
        self
    }
}

pub async fn run(cli: &Cli, run_id: RunId) -> Result<Envelope, CliError> {
    let started = Instant::now();
    let config = RuntimeConfig::from_env()?;

    let (command, result) = match &cli.command {
        Command::Compute(args) => ("compute", compute::run(args, &config).await?),
        Command::Classify(args) => ("classify", classify::run(args, &config)?),
        Command::Catalog(args) => ("catalog", catalog::run(args, &config)?),
        Command::Indicators => ("indicators", indicators::run()?),
        Command::Sources(args) => ("sources", sources::run(args, &config).await?),
        Command::Publish(args) => ("publish", publish::run(args, &config).await?),
    };

    let CommandResult {
        data,
        warnings,
        errors,
    } = result;

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut meta = Metadata::new(run_id, command, elapsed_ms);
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Envelope { meta, data, errors })
}

/// Catalog from an explicit file, else the configured one, else the built-in catalog.
fn load_catalog(
    explicit: Option<&Path>,
    config: &RuntimeConfig,
) -> Result<SeriesCatalog, CliError> {
    match explicit.or(config.catalog_path.as_deref()) {
        Some(path) => Ok(SeriesCatalog::load(path)?),
        None => Ok(SeriesCatalog::standard()?),
    }
}
