use crate::dispatcher::{self, ReadMode, Report};
use crate::error::{Status, StatusKind};
use crate::registry::DataObject;
use crate::transport::Transport;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// One device connection and the gate in front of it.
///
/// Every public operation holds the gate from connect to disconnect, so two
/// operations against the same endpoint never interleave their register
/// calls. Clones share the gate and the transport.
pub struct Endpoint<T: Transport> {
    name: String,
    transport: Arc<Mutex<T>>,
    keep_connected: bool,
    mode: ReadMode,
}

impl<T: Transport> Clone for Endpoint<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            transport: Arc::clone(&self.transport),
            keep_connected: self.keep_connected,
            mode: self.mode,
        }
    }
}

impl<T: Transport> Endpoint<T> {
    pub fn new(name: impl Into<String>, transport: T) -> Self {
        Self {
            name: name.into(),
            transport: Arc::new(Mutex::new(transport)),
            keep_connected: false,
            mode: ReadMode::Strict,
        }
    }

    /// Leave the connection open between operations.
    pub fn keep_connected(mut self, keep_connected: bool) -> Self {
        self.keep_connected = keep_connected;
        self
    }

    pub fn with_mode(mut self, mode: ReadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    async fn open(&self) -> Result<MutexGuard<'_, T>, Status> {
        let mut transport = self.transport.lock().await;
        if transport.is_connected() {
            return Ok(transport);
        }
        match transport.connect().await {
            Ok(true) => Ok(transport),
            Ok(false) => Err(Status::new(
                StatusKind::NotConnected,
                format!("{} refused the connection", self.name),
            )),
            Err(err) => {
                warn!("{}: connect failed: {}", self.name, err);
                Err(Status::new(
                    StatusKind::NotConnected,
                    format!("{}: {}", self.name, err),
                ))
            }
        }
    }

    /// Disconnect unless asked to stay connected. A connection that just failed
    /// at the transport level is always dropped so the next operation reconnects.
    async fn close(&self, transport: &mut T, status: &Status) {
        let broken = matches!(
            status.kind,
            StatusKind::NotConnected | StatusKind::CommunicationError
        );
        if self.keep_connected && !broken {
            return;
        }
        if broken {
            debug!("{}: dropping connection after {}", self.name, status);
        }
        if let Err(err) = transport.disconnect().await {
            warn!("{}: disconnect failed: {}", self.name, err);
        }
    }

    pub async fn read_all<O>(&self, object: &mut O) -> Status
    where
        O: DataObject + Send + ?Sized,
    {
        let mut transport = match self.open().await {
            Ok(transport) => transport,
            Err(status) => return status,
        };
        debug!("{}: read all ({:?})", self.name, self.mode);
        let status = dispatcher::read_all(object, &mut *transport, self.mode).await;
        self.close(&mut transport, &status).await;
        status
    }

    pub async fn read_section<O>(&self, object: &mut O, section: &str) -> Status
    where
        O: DataObject + Send + ?Sized,
    {
        let mut transport = match self.open().await {
            Ok(transport) => transport,
            Err(status) => return status,
        };
        let status = dispatcher::read_section(object, section, &mut *transport, self.mode).await;
        self.close(&mut transport, &status).await;
        status
    }

    pub async fn read_property<O>(&self, object: &mut O, name: &str) -> Status
    where
        O: DataObject + Send + ?Sized,
    {
        let mut transport = match self.open().await {
            Ok(transport) => transport,
            Err(status) => return status,
        };
        let status = dispatcher::read_property(object, name, &mut *transport).await;
        self.close(&mut transport, &status).await;
        status
    }

    pub async fn write_property<O>(&self, object: &mut O, name: &str) -> Status
    where
        O: DataObject + Send + ?Sized,
    {
        let mut transport = match self.open().await {
            Ok(transport) => transport,
            Err(status) => return status,
        };
        let status = dispatcher::write_property(object, name, &mut *transport).await;
        self.close(&mut transport, &status).await;
        status
    }

    pub async fn write_property_str<O>(&self, object: &mut O, name: &str, text: &str) -> Status
    where
        O: DataObject + Send + ?Sized,
    {
        let mut transport = match self.open().await {
            Ok(transport) => transport,
            Err(status) => return status,
        };
        let status = dispatcher::write_property_str(object, name, text, &mut *transport).await;
        self.close(&mut transport, &status).await;
        status
    }

    pub async fn read_properties<O, S>(&self, object: &mut O, names: &[S]) -> Report
    where
        O: DataObject + Send + ?Sized,
        S: AsRef<str> + Sync,
    {
        let mut transport = match self.open().await {
            Ok(transport) => transport,
            Err(status) => return unattempted(names, status),
        };
        let report = dispatcher::read_properties(object, names, &mut *transport).await;
        self.close(&mut transport, &report.status()).await;
        report
    }

    pub async fn write_properties<O, S>(&self, object: &mut O, names: &[S]) -> Report
    where
        O: DataObject + Send + ?Sized,
        S: AsRef<str> + Sync,
    {
        let mut transport = match self.open().await {
            Ok(transport) => transport,
            Err(status) => return unattempted(names, status),
        };
        let report = dispatcher::write_properties(object, names, &mut *transport).await;
        self.close(&mut transport, &report.status()).await;
        report
    }
}

// the connection failed before the first property was tried
fn unattempted<S: AsRef<str>>(names: &[S], status: Status) -> Report {
    Report {
        results: names
            .first()
            .map(|name| (name.as_ref().to_string(), status))
            .into_iter()
            .collect(),
    }
}
