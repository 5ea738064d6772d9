pub mod channels;
pub mod config;
pub mod dispatcher;
pub mod dynamic;
pub mod endpoint;
pub mod error;
pub mod options;
pub mod poller;
pub mod prelude;
pub mod registry;
pub mod snapshot_writer;
pub mod sunspec;
pub mod transport;

const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::poller::Poller;
use crate::prelude::*;
use crate::snapshot_writer::SnapshotWriter;

/// Timestamped single-line log format, level taken from `RUST_LOG` or `default_level`.
pub fn init_logging(default_level: &str) {
    let result = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .try_init();

    if let Err(e) = result {
        warn!("logger already initialised: {}", e);
    }
}

/// Run the pollers, and the datalog writer if configured, until `shutdown_rx` fires.
pub async fn app(mut shutdown_rx: broadcast::Receiver<()>, config: ConfigWrapper) -> Result<()> {
    info!("sunspec-bridge {} starting", CARGO_PKG_VERSION);
    config.log_summary();

    let channels = Channels::new();

    let writer = match config.datalog_file() {
        Some(path) => Some(SnapshotWriter::new(&path)?),
        None => None,
    };
    let writer_handle = writer.map(|writer| {
        let channels = channels.clone();
        tokio::spawn(async move {
            if let Err(e) = writer.start(channels).await {
                error!("Datalog writer failed: {}", e);
            }
        })
    });

    let poller = Poller::new(config.clone(), channels.clone());
    let poller_handle = {
        let poller = poller.clone();
        tokio::spawn(async move {
            if let Err(e) = poller.start().await {
                error!("Poller failed: {}", e);
            }
        })
    };

    info!("Waiting for shutdown signal...");
    let _ = shutdown_rx.recv().await;
    info!("Shutdown signal received, stopping components...");

    poller.stop();
    if let Err(e) = poller_handle.await {
        error!("Error waiting for poller task: {}", e);
    }

    let _ = channels.from_poller.send(ChannelData::Shutdown);
    if let Some(handle) = writer_handle {
        if let Err(e) = handle.await {
            error!("Error waiting for datalog writer task: {}", e);
        }
    }

    poller
        .shared_stats
        .lock()
        .map_err(|_| anyhow!("Failed to lock poll stats"))?
        .print_summary();

    info!("Shutdown complete");
    Ok(())
}

/// Read every enabled device once and print one JSON line per device.
pub async fn read_once(config: ConfigWrapper) -> Result<()> {
    let poller = Poller::new(config, Channels::new());
    let snapshots = poller.read_once().await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for snapshot in &snapshots {
        writeln!(out, "{}", serde_json::to_string(snapshot)?)?;
    }
    Ok(())
}
