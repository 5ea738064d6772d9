use crate::prelude::*;

use crate::channels::Snapshot;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Appends every snapshot to a file as one JSON object per line.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    file: Arc<Mutex<std::fs::File>>,
    path: String,
    snapshots_written: Arc<Mutex<u64>>,
}

impl SnapshotWriter {
    pub fn new(path: &str) -> Result<Self> {
        info!("Opening datalog file at {}", path);

        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to open datalog file {}: {}", path, e);
                return Err(e.into());
            }
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644)) {
                error!("Failed to set permissions on datalog file {}: {}", path, e);
                return Err(e.into());
            }
        }

        Ok(Self {
            file: Arc::new(Mutex::new(file)),
            path: path.to_string(),
            snapshots_written: Arc::new(Mutex::new(0)),
        })
    }

    pub fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let line = serde_json::json!({
            "utc_timestamp": snapshot.time.timestamp(),
            "device": snapshot.device,
            "values": snapshot.values,
        });
        let line = serde_json::to_string(&line)?;

        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("Failed to lock datalog file"))?;
        if let Err(e) = writeln!(file, "{}", line).and_then(|_| file.flush()) {
            error!("Failed to write to datalog file {}: {}", self.path, e);
            return Err(e.into());
        }

        let mut written = self
            .snapshots_written
            .lock()
            .map_err(|_| anyhow!("Failed to lock snapshot counter"))?;
        *written += 1;
        debug!("{} snapshots stored in {}", *written, self.path);
        Ok(())
    }

    pub fn snapshots_written(&self) -> u64 {
        self.snapshots_written.lock().map(|n| *n).unwrap_or(0)
    }

    /// Write snapshots from the pollers until told to shut down.
    pub async fn start(&self, channels: Channels) -> Result<()> {
        let mut receiver = channels.from_poller.subscribe();

        loop {
            match receiver.recv().await {
                Ok(ChannelData::Snapshot(snapshot)) => {
                    if let Err(e) = self.write_snapshot(&snapshot) {
                        warn!("dropping snapshot of {}: {}", snapshot.device, e);
                    }
                }
                Ok(ChannelData::Shutdown) => break,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("datalog writer lagged, {} snapshots lost", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        info!("datalog writer stopped after {} snapshots", self.snapshots_written());
        Ok(())
    }
}
