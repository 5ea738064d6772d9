use super::{take, RegisterCodec, Registers, Sentinel, Value, ValueKind};
use crate::error::CodecError;
use serde::Serialize;
use std::net::{Ipv4Addr, Ipv6Addr};

fn words_to_bytes<const N: usize>(words: &[u16]) -> [u8; N] {
    let mut bytes = [0u8; N];
    for (chunk, word) in bytes.chunks_mut(2).zip(words) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    bytes
}

fn bytes_to_words(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

/// `ipaddr`: IPv4 address over two registers. 0.0.0.0 means not configured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct IpV4(Option<Ipv4Addr>);

impl IpV4 {
    pub fn new(addr: Ipv4Addr) -> Self {
        if addr.is_unspecified() {
            Self(None)
        } else {
            Self(Some(addr))
        }
    }

    pub fn addr(&self) -> Option<Ipv4Addr> {
        self.0
    }

    pub(crate) fn parse(text: &str) -> Result<Self, CodecError> {
        text.parse::<Ipv4Addr>()
            .map(Self::new)
            .map_err(|err| CodecError::InvalidArgument(format!("{:?}: {}", text, err)))
    }
}

impl Registers for IpV4 {
    fn encode(&self) -> Vec<u16> {
        bytes_to_words(&self.0.unwrap_or(Ipv4Addr::UNSPECIFIED).octets())
    }

    fn sentinel(&self) -> Option<Sentinel> {
        self.0.is_none().then_some(Sentinel::NotConfigured)
    }

    fn kind(&self) -> ValueKind {
        ValueKind::IpV4
    }
}

impl RegisterCodec for IpV4 {
    const KIND: ValueKind = ValueKind::IpV4;

    fn decode(words: &[u16]) -> Result<Self, CodecError> {
        let words = take(words, ValueKind::IpV4)?;
        Ok(Self::new(Ipv4Addr::from(words_to_bytes::<4>(words))))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::IpV4(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for IpV4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(addr) => write!(f, "{}", addr),
            None => write!(f, "{}", Sentinel::NotConfigured),
        }
    }
}

/// `ipv6addr`: IPv6 address over eight registers. `::` means not configured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct IpV6(Option<Ipv6Addr>);

impl IpV6 {
    pub fn new(addr: Ipv6Addr) -> Self {
        if addr.is_unspecified() {
            Self(None)
        } else {
            Self(Some(addr))
        }
    }

    pub fn addr(&self) -> Option<Ipv6Addr> {
        self.0
    }

    pub(crate) fn parse(text: &str) -> Result<Self, CodecError> {
        text.parse::<Ipv6Addr>()
            .map(Self::new)
            .map_err(|err| CodecError::InvalidArgument(format!("{:?}: {}", text, err)))
    }
}

impl Registers for IpV6 {
    fn encode(&self) -> Vec<u16> {
        bytes_to_words(&self.0.unwrap_or(Ipv6Addr::UNSPECIFIED).octets())
    }

    fn sentinel(&self) -> Option<Sentinel> {
        self.0.is_none().then_some(Sentinel::NotConfigured)
    }

    fn kind(&self) -> ValueKind {
        ValueKind::IpV6
    }
}

impl RegisterCodec for IpV6 {
    const KIND: ValueKind = ValueKind::IpV6;

    fn decode(words: &[u16]) -> Result<Self, CodecError> {
        let words = take(words, ValueKind::IpV6)?;
        Ok(Self::new(Ipv6Addr::from(words_to_bytes::<16>(words))))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::IpV6(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for IpV6 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(addr) => write!(f, "{}", addr),
            None => write!(f, "{}", Sentinel::NotConfigured),
        }
    }
}
