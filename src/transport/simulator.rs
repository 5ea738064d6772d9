use super::{Transport, TransportError};
use async_trait::async_trait;
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One request seen by a [`Simulator`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Connect,
    Disconnect,
    Read { offset: u16, count: u16 },
    Write { offset: u16, words: Vec<u16> },
}

/// Failure to raise when a request touches a faulted register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    Timeout,
    Exception(u8),
    Disconnected,
    /// Answer reads with one register fewer than asked for.
    Truncated,
}

struct Bank {
    registers: Vec<u16>,
    calls: Vec<Call>,
    faults: HashMap<u16, Fault>,
}

/// In-memory register bank.
///
/// Clones share the bank, the call log and the injected faults, but each
/// clone tracks its own connection state.
#[derive(Clone)]
pub struct Simulator {
    bank: Arc<Mutex<Bank>>,
    connected: bool,
    delay: Option<Duration>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self {
            bank: Arc::new(Mutex::new(Bank {
                registers: vec![0; 0x1_0000],
                calls: Vec::new(),
                faults: HashMap::new(),
            })),
            connected: false,
            delay: None,
        }
    }

    /// Sleep this long inside every read and write.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn bank(&self) -> MutexGuard<'_, Bank> {
        self.bank.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn load(&self, offset: u16, words: &[u16]) {
        let mut bank = self.bank();
        let start = usize::from(offset);
        bank.registers[start..start + words.len()].copy_from_slice(words);
    }

    pub fn registers(&self, offset: u16, count: u16) -> Vec<u16> {
        let start = usize::from(offset);
        self.bank().registers[start..start + usize::from(count)].to_vec()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.bank().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.bank().calls.clear();
    }

    /// Any request covering register `offset` fails with `fault`.
    pub fn inject_fault(&self, offset: u16, fault: Fault) {
        self.bank().faults.insert(offset, fault);
    }

    pub fn clear_faults(&self) {
        self.bank().faults.clear();
    }

    fn fault_in(&self, offset: u16, count: usize) -> Option<Fault> {
        let bank = self.bank();
        let start = u32::from(offset);
        let end = start + count as u32;
        bank.faults
            .iter()
            .find(|(at, _)| (start..end).contains(&u32::from(**at)))
            .map(|(_, fault)| *fault)
    }

    fn raise(fault: Fault) -> TransportError {
        match fault {
            Fault::Timeout => TransportError::Timeout(Duration::from_secs(0)),
            Fault::Exception(code) => {
                TransportError::Exception(format!("exception code 0x{:02X}", code))
            }
            Fault::Disconnected => TransportError::NotConnected,
            Fault::Truncated => TransportError::MalformedResponse("short response".into()),
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_span(offset: u16, count: usize) -> Result<(), TransportError> {
        if usize::from(offset) + count > 0x1_0000 {
            return Err(TransportError::Exception(format!(
                "illegal data address {}+{}",
                offset, count
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for Simulator {
    async fn connect(&mut self) -> Result<bool, TransportError> {
        self.bank().calls.push(Call::Connect);
        self.connected = true;
        debug!("simulator connected");
        Ok(true)
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.bank().calls.push(Call::Disconnect);
        self.connected = false;
        debug!("simulator disconnected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn read_registers(&mut self, offset: u16, count: u16) -> Result<Vec<u16>, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.bank().calls.push(Call::Read { offset, count });
        trace!("simulator read {} @ {}", count, offset);
        self.pause().await;

        Self::check_span(offset, usize::from(count))?;
        match self.fault_in(offset, usize::from(count)) {
            Some(Fault::Truncated) => {
                let mut words = self.registers(offset, count);
                words.pop();
                Ok(words)
            }
            Some(fault) => Err(Self::raise(fault)),
            None => Ok(self.registers(offset, count)),
        }
    }

    async fn write_registers(&mut self, offset: u16, words: &[u16]) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.bank().calls.push(Call::Write {
            offset,
            words: words.to_vec(),
        });
        trace!("simulator write {:?} @ {}", words, offset);
        self.pause().await;

        Self::check_span(offset, words.len())?;
        if let Some(fault) = self.fault_in(offset, words.len()) {
            return Err(Self::raise(fault));
        }
        self.load(offset, words);
        Ok(())
    }
}
