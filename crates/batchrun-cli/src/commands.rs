//! Command implementations: build the items, pick the task, run the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use batchrun_core::{RunReport, WorkItem};
use batchrun_engine::{Aggregator, Dispatcher, TaskFn};
use reqwest::{Client, Url};
use tracing::info;

use crate::error::CliError;
use crate::source::{list_files, load_rows, Row};
use crate::tasks::{
    is_success_status, ConnectionMode, HttpDetail, PostRowTask, ProbeTask, SendFileTask,
};

/// Parse the target URL. Only http and https are accepted.
pub fn parse_url(url: &str) -> Result<Url, CliError> {
    let parsed = Url::parse(url).map_err(|e| CliError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(CliError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}

fn http_aggregator() -> Aggregator<HttpDetail> {
    Aggregator::new().with_classifier(is_success_status)
}

/// POST every row of a JSON rows file.
pub async fn post_rows(
    dispatcher: &Dispatcher,
    client: Client,
    url: &str,
    file: &Path,
) -> Result<RunReport<HttpDetail>, CliError> {
    let url = parse_url(url)?;
    let rows = load_rows(file)?;
    info!(rows = rows.len(), file = %file.display(), "Loaded rows");

    let task: Arc<dyn TaskFn<Row, HttpDetail>> = Arc::new(PostRowTask::new(client, url));
    let report = dispatcher
        .run(WorkItem::enumerate(rows), task, &http_aggregator())
        .await?;
    Ok(report)
}

/// POST the contents of every entry in a directory.
///
/// Returns the listed paths alongside the report so failures can be named
/// by file.
pub async fn send_dir(
    dispatcher: &Dispatcher,
    client: Client,
    url: &str,
    dir: &Path,
    content_type: &str,
) -> Result<(Vec<PathBuf>, RunReport<HttpDetail>), CliError> {
    let url = parse_url(url)?;
    let files = list_files(dir)?;
    info!(files = files.len(), dir = %dir.display(), "Listed directory");

    let task: Arc<dyn TaskFn<PathBuf, HttpDetail>> =
        Arc::new(SendFileTask::new(client, url, content_type));
    let report = dispatcher
        .run(WorkItem::enumerate(files.clone()), task, &http_aggregator())
        .await?;
    Ok((files, report))
}

/// Issue `requests` GET requests, keeping every outcome.
pub async fn probe(
    dispatcher: &Dispatcher,
    client: Client,
    url: &str,
    requests: usize,
    mode: ConnectionMode,
) -> Result<RunReport<HttpDetail>, CliError> {
    let url = parse_url(url)?;
    info!(requests, ?mode, "Probing endpoint");
    let task: Arc<dyn TaskFn<(), HttpDetail>> = Arc::new(ProbeTask::new(client, url, mode));
    let aggregator = http_aggregator().retain_successes(true);

    let report = dispatcher
        .run(WorkItem::enumerate(vec![(); requests]), task, &aggregator)
        .await?;
    Ok(report)
}
