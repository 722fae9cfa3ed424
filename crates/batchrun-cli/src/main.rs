//! batchrun - run a batch of HTTP requests with bounded concurrency.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use batchrun_engine::{CancellationToken, ChannelReporter, Dispatcher};
use clap::{Parser, Subcommand};
use reqwest::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;
mod progress;
mod report;
mod source;
mod tasks;

use config::Config;
use report::{describe_http, write_json, write_probe, write_text};
use tasks::ConnectionMode;

/// batchrun - bounded fan-out over HTTP endpoints
#[derive(Parser, Debug)]
#[command(name = "batchrun")]
#[command(about = "Run a batch of HTTP requests with bounded concurrency", long_about = None)]
struct Cli {
    /// Maximum concurrent requests
    #[arg(long, global = true, default_value_t = 2)]
    max_in_flight: usize,

    /// Pause between two request admissions, in milliseconds
    #[arg(long, global = true, default_value_t = 0)]
    delay_ms: u64,

    /// Abort outstanding requests after this many seconds
    #[arg(long, global = true)]
    deadline_secs: Option<u64>,

    /// Minimum time between two progress log lines, in milliseconds
    #[arg(long, global = true, default_value_t = 1000)]
    progress_interval_ms: u64,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// POST each row of a JSON array file
    Post {
        /// Endpoint receiving the rows
        #[arg(long)]
        url: String,

        /// JSON file holding an array of objects
        #[arg(long)]
        file: PathBuf,
    },

    /// POST the contents of each file in a directory
    #[command(name = "send-dir")]
    SendDir {
        /// Endpoint receiving the files
        #[arg(long)]
        url: String,

        /// Directory holding the payloads
        #[arg(long)]
        path: PathBuf,

        /// Content type sent with each payload
        #[arg(long, default_value = "application/json")]
        content_type: String,
    },

    /// Issue repeated GET requests and time them
    Probe {
        /// Endpoint to probe
        #[arg(long)]
        url: String,

        /// Number of requests
        #[arg(long, default_value_t = 10)]
        requests: usize,

        /// Reuse one pooled connection instead of connecting per request
        #[arg(long)]
        single_conn: bool,
    },
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            max_in_flight: self.max_in_flight,
            delay: Duration::from_millis(self.delay_ms),
            deadline: self.deadline_secs.map(Duration::from_secs),
            json: self.json,
            progress_interval: Duration::from_millis(self.progress_interval_ms),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    let config = cli.config();
    let cancel = CancellationToken::new();
    spawn_ctrl_c(cancel.clone());

    let (reporter, events) = ChannelReporter::new();
    let renderer = progress::spawn_renderer(events, config.progress_interval);
    let dispatcher = Dispatcher::new(config.concurrency())?
        .with_reporter(Arc::new(reporter))
        .with_cancellation(cancel);
    let client = Client::builder().build().map_err(error::CliError::from)?;

    let result = match &cli.command {
        Commands::Post { url, file } => {
            commands::post_rows(&dispatcher, client, url, file)
                .await
                .and_then(|report| {
                    if config.json {
                        write_json(io::stdout().lock(), &report)?;
                    } else {
                        write_text(io::stdout().lock(), &report, |o| {
                            describe_http("Row", o.index + 1, o)
                        })?;
                    }
                    Ok(())
                })
        }
        Commands::SendDir {
            url,
            path,
            content_type,
        } => commands::send_dir(&dispatcher, client, url, path, content_type)
            .await
            .and_then(|(files, report)| {
                if config.json {
                    write_json(io::stdout().lock(), &report)?;
                } else {
                    write_text(io::stdout().lock(), &report, |o| {
                        let name = files
                            .get(o.index)
                            .map(|p| p.display().to_string())
                            .unwrap_or_default();
                        describe_http("File", name, o)
                    })?;
                }
                Ok(())
            }),
        Commands::Probe {
            url,
            requests,
            single_conn,
        } => {
            let mode = if *single_conn {
                ConnectionMode::Shared
            } else {
                ConnectionMode::PerRequest
            };
            commands::probe(&dispatcher, client, url, *requests, mode)
                .await
                .and_then(|report| {
                    if config.json {
                        write_json(io::stdout().lock(), &report)?;
                    } else {
                        write_probe(io::stdout().lock(), &report)?;
                    }
                    Ok(())
                })
        }
    };

    // The renderer exits once every reporter handle is gone.
    drop(dispatcher);
    if let Err(e) = renderer.await {
        warn!(error = %e, "Progress renderer stopped abnormally");
    }

    result?;
    Ok(())
}

/// Cancel the run on Ctrl-C; outstanding items are reported as cancelled.
fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling outstanding requests");
            cancel.cancel();
        }
    });
}
