//! POST the contents of one file per item.

use std::path::PathBuf;

use async_trait::async_trait;
use batchrun_core::{TaskError, TaskOutcome, WorkItem};
use batchrun_engine::{CancellationToken, TaskFn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::debug;

use super::{send, HttpDetail};

/// Reads each file and posts its contents as the request body.
pub struct SendFileTask {
    client: Client,
    url: Url,
    content_type: String,
}

impl SendFileTask {
    /// Create a new task posting to `url` with the given content type.
    pub fn new(client: Client, url: Url, content_type: impl Into<String>) -> Self {
        Self {
            client,
            url,
            content_type: content_type.into(),
        }
    }
}

#[async_trait]
impl TaskFn<PathBuf, HttpDetail> for SendFileTask {
    async fn call(
        &self,
        item: &WorkItem<PathBuf>,
        cancel: CancellationToken,
    ) -> Result<TaskOutcome<HttpDetail>, TaskError> {
        let path = item.payload();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            TaskError::InvalidItem(format!("failed to read {}: {e}", path.display()))
        })?;

        debug!(index = item.index(), path = %path.display(), bytes = content.len(), "Sending file");
        let request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, self.content_type.as_str())
            .body(content);
        send(item.index(), request, &cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{routing::post, Router};

    use crate::source::tests::scratch_dir;
    use crate::tasks::tests::serve;

    async fn echo(body: String) -> String {
        body
    }

    #[tokio::test]
    async fn test_send_file_posts_contents() {
        let dir = scratch_dir("send-file");
        let path = dir.join("event.json");
        std::fs::write(&path, r#"{"event": "created"}"#).unwrap();

        let base = serve(Router::new().route("/events", post(echo))).await;
        let url = Url::parse(&format!("{base}/events")).unwrap();
        let task = SendFileTask::new(Client::new(), url, "application/json");

        let outcome = task
            .call(&WorkItem::new(0, path), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.detail.status, 200);
        assert_eq!(outcome.detail.body, r#"{"event": "created"}"#);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_invalid_item() {
        let dir = scratch_dir("send-file-missing");
        let url = Url::parse("http://127.0.0.1:1/events").unwrap();
        let task = SendFileTask::new(Client::new(), url, "application/json");

        let result = task
            .call(&WorkItem::new(0, dir.join("missing.json")), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(TaskError::InvalidItem(_))));
    }
}
