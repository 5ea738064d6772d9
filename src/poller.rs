use crate::prelude::*;

use crate::channels::Snapshot;
use crate::dynamic::DynamicObject;
use crate::endpoint::Endpoint;
use crate::transport::{TcpTransport, Transport};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Default, Debug)]
pub struct PollStats {
    pub polls: u64,
    pub good_polls: u64,
    pub snapshots_sent: u64,
    pub failures: BTreeMap<StatusKind, u64>,
    // last failure per device
    pub last_failures: HashMap<String, String>,
}

impl PollStats {
    fn record(&mut self, device: &str, status: &Status) {
        self.polls += 1;
        if status.is_good() {
            self.good_polls += 1;
        } else {
            *self.failures.entry(status.kind).or_default() += 1;
            self.last_failures
                .insert(device.to_string(), status.to_string());
        }
    }

    pub fn print_summary(&self) {
        info!("Poll Statistics:");
        info!("  Total polls: {}", self.polls);
        info!("  Good polls: {}", self.good_polls);
        info!("  Snapshots sent: {}", self.snapshots_sent);
        if !self.failures.is_empty() {
            info!("  Failures by kind:");
            for (kind, count) in &self.failures {
                info!("    {}: {}", kind, count);
            }
            info!("  Last failure by device:");
            for (device, failure) in &self.last_failures {
                info!("    {}: {}", device, failure);
            }
        }
    }
}

#[derive(Clone)]
pub struct Poller {
    config: ConfigWrapper,
    channels: Channels,
    pub shared_stats: Arc<Mutex<PollStats>>,
}

impl Poller {
    pub fn new(config: ConfigWrapper, channels: Channels) -> Self {
        Self {
            config,
            channels,
            shared_stats: Arc::new(Mutex::new(PollStats::default())),
        }
    }

    pub async fn start(&self) -> Result<()> {
        // every device loop is listening before anything can call stop()
        let futures: Vec<_> = self
            .config
            .enabled_devices()
            .into_iter()
            .map(|device| {
                let shutdown = self.channels.to_poller.subscribe();
                self.poll_device(device, shutdown)
            })
            .collect();

        futures::future::try_join_all(futures).await?;
        Ok(())
    }

    pub fn stop(&self) {
        let _ = self.channels.to_poller.send(ChannelData::Shutdown);
    }

    fn endpoint(device: &config::Device) -> Endpoint<TcpTransport> {
        let transport = TcpTransport::new(
            device.host(),
            device.port(),
            device.unit_id(),
            device.read_timeout(),
        );
        Endpoint::new(device.name(), transport)
            .keep_connected(device.keep_connected())
            .with_mode(device.read_mode())
    }

    async fn poll_device(
        &self,
        device: config::Device,
        shutdown: broadcast::Receiver<ChannelData>,
    ) -> Result<()> {
        let object = DynamicObject::new(device.catalog()?);
        self.run(Self::endpoint(&device), object, device.poll_interval(), shutdown)
            .await
    }

    /// Read every enabled device once. Devices that fail are logged and left out.
    pub async fn read_once(&self) -> Result<Vec<Snapshot>> {
        let mut snapshots = Vec::new();
        for device in self.config.enabled_devices() {
            let mut object = DynamicObject::new(device.catalog()?);
            let endpoint = Self::endpoint(&device).keep_connected(false);
            if let Some(snapshot) = self.read_snapshot(&endpoint, &mut object).await {
                snapshots.push(snapshot);
            }
        }
        Ok(snapshots)
    }

    /// Read `object` through `endpoint` every `interval` until `shutdown` delivers
    /// [`ChannelData::Shutdown`] or closes.
    pub async fn run<T: Transport>(
        &self,
        endpoint: Endpoint<T>,
        mut object: DynamicObject,
        interval: Duration,
        mut shutdown: broadcast::Receiver<ChannelData>,
    ) -> Result<()> {
        let mut interval = tokio::time::interval(interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!("polling {} every {:?}", endpoint.name(), interval.period());
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.poll_once(&endpoint, &mut object).await?;
                }
                message = shutdown.recv() => {
                    match message {
                        Ok(ChannelData::Shutdown) | Err(broadcast::error::RecvError::Closed) => break,
                        _ => {}
                    }
                }
            }
        }

        info!("stopped polling {}", endpoint.name());
        Ok(())
    }

    async fn read_snapshot<T: Transport>(
        &self,
        endpoint: &Endpoint<T>,
        object: &mut DynamicObject,
    ) -> Option<Snapshot> {
        let status = endpoint.read_all(object).await;
        self.stats().record(endpoint.name(), &status);

        if !status.is_good() {
            warn!("{}: {}", endpoint.name(), status);
            return None;
        }

        let snapshot = Snapshot {
            device: endpoint.name().to_string(),
            time: chrono::Utc::now(),
            values: object.to_json(),
        };
        debug!("{}: {}", snapshot.device, snapshot.values);
        Some(snapshot)
    }

    async fn poll_once<T: Transport>(&self, endpoint: &Endpoint<T>, object: &mut DynamicObject) -> Result<()> {
        let snapshot = match self.read_snapshot(endpoint, object).await {
            Some(snapshot) => snapshot,
            None => return Ok(()),
        };

        // nobody listening is fine
        if self
            .channels
            .from_poller
            .send(ChannelData::Snapshot(snapshot))
            .is_ok()
        {
            self.stats().snapshots_sent += 1;
        }
        Ok(())
    }

    fn stats(&self) -> std::sync::MutexGuard<'_, PollStats> {
        self.shared_stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
