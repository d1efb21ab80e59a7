use std::sync::Arc;

use riskmatrix_core::{
    publish_all, DirectoryPublisher, HttpPublisher, ObservationDate, PublishOutcome, PublishPlan,
    Publisher, ReqwestHttpClient, RuntimeConfig, SnapshotWriter,
};
use serde_json::json;

use crate::cli::PublishArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &PublishArgs, config: &RuntimeConfig) -> Result<CommandResult, CliError> {
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());
    let writer = SnapshotWriter::new(&output_dir);

    let date = match &args.date {
        Some(raw) => ObservationDate::parse(raw)?,
        None => writer.read_latest()?.snapshot_date(),
    };

    let publisher = select_publisher(args, config)?;
    let plan = PublishPlan::for_snapshot(&output_dir, date);
    let report = publish_all(publisher.as_ref(), &plan).await;

    let errors = report
        .outcomes
        .iter()
        .filter(|outcome| matches!(outcome, PublishOutcome::Failed { .. }))
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    let urls: Vec<&str> = report.published().map(|(_, url)| url).collect();

    let mut result = CommandResult::ok(json!({
        "date": date,
        "urls": urls,
        "outcomes": report.outcomes,
    }))
    .with_errors(errors);
    for outcome in &report.outcomes {
        if let PublishOutcome::Skipped { local, .. } = outcome {
            result = result.with_warning(format!("file not found: {}", local.display()));
        }
    }
    Ok(result)
}

fn select_publisher(
    args: &PublishArgs,
    config: &RuntimeConfig,
) -> Result<Box<dyn Publisher>, CliError> {
    if let Some(target_dir) = &args.target_dir {
        let mut publisher = DirectoryPublisher::new(target_dir);
        if let Some(base) = config
            .publish
            .as_ref()
            .and_then(|publish| publish.public_base_url.as_ref())
        {
            publisher = publisher.with_public_base_url(base);
        }
        return Ok(Box::new(publisher));
    }

    let publish = config.publish.as_ref().ok_or_else(|| {
        CliError::Command(String::from(
            "no publish target: pass --target-dir or set RISKMATRIX_PUBLISH_ENDPOINT",
        ))
    })?;
    let mut publisher = HttpPublisher::new(Arc::new(ReqwestHttpClient::new()), &publish.endpoint);
    if let Some(base) = &publish.public_base_url {
        publisher = publisher.with_public_base_url(base);
    }
    if let Some((name, value)) = &publish.acl_header {
        publisher = publisher.with_acl_header(name, value);
    }
    Ok(Box::new(publisher))
}
