use riskmatrix_core::{RuntimeConfig, SourceRegistryBuilder};
use serde::Serialize;

use crate::cli::SourcesArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SourceRow {
    id: riskmatrix_core::ProviderId,
    status: &'static str,
    available: bool,
    max_concurrency: usize,
    quota_limit: u32,
    quota_window_secs: u64,
    max_retries: u32,
}

pub async fn run(args: &SourcesArgs, config: &RuntimeConfig) -> Result<CommandResult, CliError> {
    let builder = SourceRegistryBuilder::new();
    let registry = if args.mock {
        builder.with_mock_mode().build()
    } else {
        let builder = builder.with_real_clients();
        match &config.fred_api_key {
            Some(key) => builder.with_fred_key(key.clone()).build(),
            None => builder.build(),
        }
    };

    let rows: Vec<SourceRow> = registry
        .snapshots()
        .await
        .into_iter()
        .map(|snapshot| SourceRow {
            id: snapshot.id,
            status: snapshot.status_label(),
            available: snapshot.available(),
            max_concurrency: snapshot.policy.max_concurrency,
            quota_limit: snapshot.policy.quota_limit,
            quota_window_secs: snapshot.policy.quota_window.as_secs(),
            max_retries: snapshot.policy.retry_backoff.max_retries,
        })
        .collect();

    let mut result = CommandResult::ok(serde_json::to_value(&rows)?);
    if let Some(row) = rows.iter().find(|row| !row.available) {
        result = result.with_warning(format!("source '{}' is {}", row.id, row.status));
    }
    Ok(result)
}
