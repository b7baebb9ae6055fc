//! partwise-upload entry point.

mod config;
mod render;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use partwise_client::{HttpPartTransport, HttpSessionClient};
use partwise_protocol::constants::MIN_PART_SIZE;
use partwise_transfer::UploadSource;
use partwise_uploader::{Coordinator, Submission, UploadEvent};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Upload a file to object storage in parallel parts.
#[derive(Parser)]
#[command(name = "partwise-upload", version)]
struct Cli {
    /// File to upload.
    file: PathBuf,

    /// Your name; prefixes the stored object key.
    #[arg(short, long)]
    name: String,

    /// Control-plane endpoint (overrides the config file).
    #[arg(long)]
    endpoint: Option<String>,

    /// Part size in bytes.
    #[arg(long)]
    part_size: Option<u64>,

    /// Parts uploaded at once.
    #[arg(short = 'k', long)]
    concurrency: Option<usize>,

    /// Config file (default: ~/.config/partwise/uploader.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(part_size) = self.part_size {
            config.uploader.part_size = part_size;
        }
        if let Some(k) = self.concurrency {
            config.uploader.max_concurrency = k;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    if config.uploader.part_size < MIN_PART_SIZE {
        tracing::warn!(
            part_size = config.uploader.part_size,
            minimum = MIN_PART_SIZE,
            "part size below the storage minimum; multi-part uploads may be rejected"
        );
    }
    tracing::info!(endpoint = %config.endpoint, "configuration loaded");

    let source = UploadSource::open(&cli.file).await?;
    let client = HttpSessionClient::new(
        config.endpoint.clone(),
        Some(Duration::from_secs(config.request_timeout_secs)),
    )?;
    let transport = HttpPartTransport::new(config.uploader.stream_chunk_size)?;
    let coordinator = Arc::new(Coordinator::new(
        Arc::new(client),
        Arc::new(transport),
        config.uploader.clone(),
    )?);

    let renderer = coordinator.take_events().map(|mut events| {
        tokio::spawn(async move {
            let mut stderr = std::io::stderr();
            while let Some(event) = events.recv().await {
                match &event {
                    UploadEvent::Progress(snapshot) => {
                        let _ = write!(stderr, "\r{}", render::progress_line(snapshot));
                        let _ = stderr.flush();
                    }
                    other => {
                        if let Some(line) = render::event_line(other) {
                            tracing::debug!("{line}");
                        }
                    }
                }
            }
        })
    });

    let mut upload = {
        let coordinator = Arc::clone(&coordinator);
        let submission = Submission::new(cli.name.clone(), source);
        tokio::spawn(async move { coordinator.submit(submission).await })
    };

    let result = tokio::select! {
        joined = &mut upload => joined?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            tracing::info!("interrupt received, cancelling");
            coordinator.cancel().await;
            upload.await?
        }
    };

    // The coordinator owns the event sender; stop rendering once settled.
    if let Some(renderer) = renderer {
        renderer.abort();
    }
    eprintln!();
    if let Some(line) = render::notice_line(&coordinator.status().notice) {
        eprintln!("{line}");
    }

    match result {
        Ok(outcome) => {
            println!("{}", outcome.object_key);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_cancelled() => Ok(ExitCode::from(130)),
        Err(e) => {
            tracing::error!(error = %e, "upload failed");
            Ok(ExitCode::FAILURE)
        }
    }
}
