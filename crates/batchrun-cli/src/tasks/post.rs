//! POST one JSON row per item.

use async_trait::async_trait;
use batchrun_core::{TaskError, TaskOutcome, WorkItem};
use batchrun_engine::{CancellationToken, TaskFn};
use reqwest::{Client, Url};
use tracing::debug;

use super::{send, HttpDetail};
use crate::source::Row;

/// Posts each row as a JSON object.
pub struct PostRowTask {
    client: Client,
    url: Url,
}

impl PostRowTask {
    /// Create a new task posting to `url`.
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl TaskFn<Row, HttpDetail> for PostRowTask {
    async fn call(
        &self,
        item: &WorkItem<Row>,
        cancel: CancellationToken,
    ) -> Result<TaskOutcome<HttpDetail>, TaskError> {
        debug!(index = item.index(), url = %self.url, "Posting row");
        let request = self.client.post(self.url.clone()).json(item.payload());
        send(item.index(), request, &cancel).await
    }
}
