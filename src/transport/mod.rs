//! The register transport the dispatcher talks through.
//!
//! Implementations own their own timeouts. The dispatcher never retries.

pub mod simulator;
pub mod tcp;

pub use simulator::{Call, Fault, Simulator};
pub use tcp::TcpTransport;

use crate::error::{Status, StatusKind};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("modbus error: {0}")]
    Modbus(#[from] tokio_modbus::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("device exception: {0}")]
    Exception(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TransportError {
    /// Category of the failure as seen by callers of the dispatcher.
    pub fn kind(&self) -> StatusKind {
        match self {
            Self::NotConnected => StatusKind::NotConnected,
            Self::Timeout(_) | Self::Io(_) | Self::Modbus(_) | Self::MalformedResponse(_) => {
                StatusKind::CommunicationError
            }
            Self::Exception(_) => StatusKind::DeviceFailure,
            Self::Other(_) => StatusKind::InternalError,
        }
    }

    /// The connection can't be trusted after this error and should be reopened.
    pub fn breaks_connection(&self) -> bool {
        matches!(
            self.kind(),
            StatusKind::NotConnected | StatusKind::CommunicationError
        )
    }
}

impl From<TransportError> for Status {
    fn from(err: TransportError) -> Self {
        Status::new(err.kind(), err.to_string())
    }
}

#[async_trait]
pub trait Transport: Send {
    /// Open the connection. `Ok(false)` means the peer refused without error.
    async fn connect(&mut self) -> Result<bool, TransportError>;

    async fn disconnect(&mut self) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;

    /// Read `count` holding registers starting at `offset`.
    async fn read_registers(&mut self, offset: u16, count: u16) -> Result<Vec<u16>, TransportError>;

    async fn write_registers(&mut self, offset: u16, words: &[u16]) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_by_category() {
        assert_eq!(TransportError::NotConnected.kind(), StatusKind::NotConnected);
        assert_eq!(
            TransportError::Timeout(Duration::from_secs(1)).kind(),
            StatusKind::CommunicationError
        );
        assert_eq!(
            TransportError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe)).kind(),
            StatusKind::CommunicationError
        );
        assert_eq!(
            TransportError::Exception("IllegalDataAddress".into()).kind(),
            StatusKind::DeviceFailure
        );
        assert_eq!(
            TransportError::Other(anyhow::anyhow!("boom")).kind(),
            StatusKind::InternalError
        );

        let status = Status::from(TransportError::MalformedResponse("short".into()));
        assert_eq!(status.kind, StatusKind::CommunicationError);
        assert_eq!(status.explanation, "malformed response: short");
    }
}
