//! Repeated GET requests against one URL.

use async_trait::async_trait;
use batchrun_core::{TaskError, TaskOutcome, WorkItem};
use batchrun_engine::{CancellationToken, TaskFn};
use reqwest::{Client, Url};

use super::{send, HttpDetail};

/// How requests get their connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Every request builds its own client, so connection setup is part of
    /// the measured time.
    #[default]
    PerRequest,
    /// All requests share one pooled client.
    Shared,
}

/// Issues one GET per item; the payload is unused.
pub struct ProbeTask {
    client: Client,
    url: Url,
    mode: ConnectionMode,
}

impl ProbeTask {
    /// Create a new task probing `url`. `client` is only used in
    /// [`ConnectionMode::Shared`].
    pub fn new(client: Client, url: Url, mode: ConnectionMode) -> Self {
        Self { client, url, mode }
    }

    fn client(&self) -> Result<Client, TaskError> {
        match self.mode {
            ConnectionMode::Shared => Ok(self.client.clone()),
            ConnectionMode::PerRequest => Client::builder()
                .pool_max_idle_per_host(0)
                .build()
                .map_err(|e| TaskError::Transport(format!("failed to build client: {e}"))),
        }
    }
}

#[async_trait]
impl TaskFn<(), HttpDetail> for ProbeTask {
    async fn call(
        &self,
        item: &WorkItem<()>,
        cancel: CancellationToken,
    ) -> Result<TaskOutcome<HttpDetail>, TaskError> {
        let request = self.client()?.get(self.url.clone());
        send(item.index(), request, &cancel).await
    }
}
