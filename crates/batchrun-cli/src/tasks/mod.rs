//! HTTP task functions, one per command.

mod post;
mod probe;
mod send_file;

pub use post::PostRowTask;
pub use probe::{ConnectionMode, ProbeTask};
pub use send_file::SendFileTask;

use batchrun_core::{FailureKind, OutcomeError, TaskError, TaskOutcome};
use batchrun_engine::CancellationToken;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};

/// What the endpoint answered.
///
/// An item that never got a response keeps the default: status 0, no body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpDetail {
    pub status: u16,
    pub body: String,
}

impl HttpDetail {
    /// Returns true for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Success predicate shared by the HTTP commands.
pub fn is_success_status(outcome: &TaskOutcome<HttpDetail>) -> bool {
    outcome.detail.is_success()
}

/// Send a request and capture status and body.
///
/// A body that cannot be read still reports the status, with the read error
/// attached.
async fn send(
    index: usize,
    request: RequestBuilder,
    cancel: &CancellationToken,
) -> Result<TaskOutcome<HttpDetail>, TaskError> {
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            return Err(TaskError::Transport("request cancelled".to_string()));
        }
        response = request.send() => {
            response.map_err(|e| TaskError::Transport(e.to_string()))?
        }
    };

    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) => Ok(TaskOutcome::success(index, HttpDetail { status, body })),
        Err(e) => Ok(TaskOutcome::failure(
            index,
            HttpDetail {
                status,
                body: String::new(),
            },
            Some(OutcomeError::new(
                FailureKind::Task,
                format!("failed to read response body: {e}"),
            )),
        )),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use axum::Router;
    use tokio::net::TcpListener;

    /// Serve a router on an ephemeral local port and return its base URL.
    pub(crate) async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_http_detail_success_range() {
        let detail = |status| HttpDetail {
            status,
            body: String::new(),
        };
        assert!(detail(200).is_success());
        assert!(detail(299).is_success());
        assert!(!detail(199).is_success());
        assert!(!detail(300).is_success());
        assert!(!HttpDetail::default().is_success());
    }
}
