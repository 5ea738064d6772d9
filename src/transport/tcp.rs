use super::{Transport, TransportError};
use anyhow::anyhow;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::time::timeout;
use tokio_modbus::client::{tcp, Context, Reader, Writer};
use tokio_modbus::Slave;

/// Modbus-TCP over tokio-modbus: holding registers, fc 3 and fc 16.
pub struct TcpTransport {
    host: String,
    port: u16,
    unit_id: u8,
    read_timeout: Duration,
    ctx: Option<Context>,
}

impl TcpTransport {
    pub fn new(host: impl Into<String>, port: u16, unit_id: u8, read_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            unit_id,
            read_timeout,
            ctx: None,
        }
    }

    fn ctx(&mut self) -> Result<&mut Context, TransportError> {
        self.ctx.as_mut().ok_or(TransportError::NotConnected)
    }

    /// Drop the context after a failure that leaves the stream out of step,
    /// so a late reply can't be taken for the next request's.
    fn settle<V>(&mut self, result: Result<V, TransportError>) -> Result<V, TransportError> {
        if let Err(err) = &result {
            if err.breaks_connection() && self.ctx.take().is_some() {
                warn!("dropped connection to {}:{}: {}", self.host, self.port, err);
            }
        }
        result
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<bool, TransportError> {
        if self.ctx.is_some() {
            return Ok(true);
        }

        let addr = tokio::net::lookup_host((self.host.as_str(), self.port))
            .await?
            .next()
            .ok_or_else(|| anyhow!("{} did not resolve to any address", self.host))?;

        debug!("connecting to {} unit {}", addr, self.unit_id);
        let ctx = timeout(
            self.read_timeout,
            tcp::connect_slave(addr, Slave(self.unit_id)),
        )
        .await
        .map_err(|_| TransportError::Timeout(self.read_timeout))??;

        info!("connected to {}:{}", self.host, self.port);
        self.ctx = Some(ctx);
        Ok(true)
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        // dropping the context closes the socket
        if self.ctx.take().is_some() {
            debug!("disconnected from {}:{}", self.host, self.port);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.ctx.is_some()
    }

    async fn read_registers(&mut self, offset: u16, count: u16) -> Result<Vec<u16>, TransportError> {
        let read_timeout = self.read_timeout;
        let ctx = self.ctx()?;

        let result = match timeout(read_timeout, ctx.read_holding_registers(offset, count)).await {
            Err(_) => Err(TransportError::Timeout(read_timeout)),
            Ok(Err(err)) => Err(TransportError::from(err)),
            Ok(Ok(Err(code))) => Err(TransportError::Exception(code.to_string())),
            Ok(Ok(Ok(words))) if words.len() != usize::from(count) => {
                Err(TransportError::MalformedResponse(format!(
                    "asked for {} registers at {}, got {}",
                    count,
                    offset,
                    words.len()
                )))
            }
            Ok(Ok(Ok(words))) => Ok(words),
        };
        self.settle(result)
    }

    async fn write_registers(&mut self, offset: u16, words: &[u16]) -> Result<(), TransportError> {
        let read_timeout = self.read_timeout;
        let ctx = self.ctx()?;

        let result = match timeout(read_timeout, ctx.write_multiple_registers(offset, words)).await {
            Err(_) => Err(TransportError::Timeout(read_timeout)),
            Ok(Err(err)) => Err(TransportError::from(err)),
            Ok(Ok(Err(code))) => Err(TransportError::Exception(code.to_string())),
            Ok(Ok(Ok(()))) => Ok(()),
        };
        self.settle(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn io_before_connect_is_not_connected() {
        let mut transport = TcpTransport::new("127.0.0.1", 502, 1, Duration::from_millis(100));
        assert!(!transport.is_connected());
        assert!(matches!(
            transport.read_registers(0, 1).await,
            Err(TransportError::NotConnected)
        ));
        assert!(transport.disconnect().await.is_ok());
    }

    #[test]
    fn broken_replies_drop_the_context() {
        let mut transport = TcpTransport::new("127.0.0.1", 502, 1, Duration::from_millis(100));
        let timed_out: Result<(), _> = Err(TransportError::Timeout(Duration::from_millis(100)));
        assert!(transport.settle(timed_out).is_err());
        assert!(!transport.is_connected());

        let refused: Result<(), _> = Err(TransportError::Exception("illegal data address".into()));
        assert!(matches!(
            transport.settle(refused),
            Err(TransportError::Exception(_))
        ));
    }
}
