//! SunSpec register value types.
//!
//! Every type here is backed by a fixed number of 16-bit Modbus registers.
//! Multi-register integers are big-endian word ordered (most significant
//! register first) and IP addresses are big-endian byte ordered across their
//! registers. Each type reserves one bit pattern as a sentinel which decodes
//! to a marker rather than a number.

pub mod address;
pub mod integer;
pub mod scale_factor;

pub use address::{IpV4, IpV6};
pub use integer::{
    Acc16, Acc32, Acc64, Bitfield16, Bitfield32, Enum16, Enum32, Int16, Int32, Int64, Pad,
    UInt16, UInt32, UInt64,
};
pub use scale_factor::{scaled, ScaleFactor};

use crate::error::CodecError;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

/// What a sentinel bit pattern stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Sentinel {
    NotImplemented,
    NotAccumulated,
    NotConfigured,
}

impl Sentinel {
    pub fn name(self) -> &'static str {
        match self {
            Self::NotImplemented => "NotImplemented",
            Self::NotAccumulated => "NotAccumulated",
            Self::NotConfigured => "NotConfigured",
        }
    }

    fn from_name(text: &str) -> Option<Self> {
        match text {
            "NotImplemented" => Some(Self::NotImplemented),
            "NotAccumulated" => Some(Self::NotAccumulated),
            "NotConfigured" => Some(Self::NotConfigured),
            _ => None,
        }
    }
}

impl std::fmt::Display for Sentinel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[enum_dispatch]
pub trait Registers {
    /// Register words for this value, exactly `kind().length()` long.
    fn encode(&self) -> Vec<u16>;
    fn sentinel(&self) -> Option<Sentinel>;
    fn kind(&self) -> ValueKind;

    fn is_sentinel(&self) -> bool {
        self.sentinel().is_some()
    }
}

/// Decoding side of a codec. Not object safe, so it stays off `Value`.
pub trait RegisterCodec: Registers + Copy + Default + Into<Value> {
    const KIND: ValueKind;
    const LENGTH: usize = Self::KIND.length();

    fn decode(words: &[u16]) -> Result<Self, CodecError>;

    /// Narrow a `Value` back to this codec; `None` if it holds another kind.
    fn from_value(value: Value) -> Option<Self>;
}

/// Slice out the leading `kind.length()` words, or explain why we can't.
pub(crate) fn take(words: &[u16], kind: ValueKind) -> Result<&[u16], CodecError> {
    if words.is_empty() {
        return Err(CodecError::InvalidArgument(format!(
            "{}: no registers to decode",
            kind
        )));
    }
    let length = kind.length();
    if words.len() < length {
        return Err(CodecError::OutOfRange {
            kind: kind.name(),
            expected: length,
            actual: words.len(),
        });
    }
    Ok(&words[..length])
}

#[enum_dispatch(Registers)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int16(Int16),
    UInt16(UInt16),
    Acc16(Acc16),
    Enum16(Enum16),
    Bitfield16(Bitfield16),
    Pad(Pad),
    ScaleFactor(ScaleFactor),
    Int32(Int32),
    UInt32(UInt32),
    Acc32(Acc32),
    Enum32(Enum32),
    Bitfield32(Bitfield32),
    IpV4(IpV4),
    Int64(Int64),
    UInt64(UInt64),
    Acc64(Acc64),
    IpV6(IpV6),
}

impl Value {
    /// Numeric reading as a float, `None` for sentinels and non-numeric kinds.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int16(v) => v.value().map(f64::from),
            Self::UInt16(v) => v.value().map(f64::from),
            Self::Acc16(v) => v.value().map(f64::from),
            Self::Int32(v) => v.value().map(f64::from),
            Self::UInt32(v) => v.value().map(f64::from),
            Self::Acc32(v) => v.value().map(f64::from),
            Self::Int64(v) => v.value().map(|v| v as f64),
            Self::UInt64(v) => v.value().map(|v| v as f64),
            Self::Acc64(v) => v.value().map(|v| v as f64),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int16(v) => write!(f, "{}", v),
            Self::UInt16(v) => write!(f, "{}", v),
            Self::Acc16(v) => write!(f, "{}", v),
            Self::Enum16(v) => write!(f, "{}", v),
            Self::Bitfield16(v) => write!(f, "{}", v),
            Self::Pad(v) => write!(f, "{}", v),
            Self::ScaleFactor(v) => write!(f, "{}", v),
            Self::Int32(v) => write!(f, "{}", v),
            Self::UInt32(v) => write!(f, "{}", v),
            Self::Acc32(v) => write!(f, "{}", v),
            Self::Enum32(v) => write!(f, "{}", v),
            Self::Bitfield32(v) => write!(f, "{}", v),
            Self::IpV4(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::UInt64(v) => write!(f, "{}", v),
            Self::Acc64(v) => write!(f, "{}", v),
            Self::IpV6(v) => write!(f, "{}", v),
        }
    }
}

/// Closed set of codec tags. Resolved once when a descriptor is built so
/// dispatch is a single `match` rather than a per-call type test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    #[serde(rename = "int16")]
    Int16,
    #[serde(rename = "uint16")]
    UInt16,
    #[serde(rename = "acc16")]
    Acc16,
    #[serde(rename = "enum16")]
    Enum16,
    #[serde(rename = "bitfield16")]
    Bitfield16,
    #[serde(rename = "pad")]
    Pad,
    #[serde(rename = "sunssf")]
    ScaleFactor,
    #[serde(rename = "int32")]
    Int32,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "acc32")]
    Acc32,
    #[serde(rename = "enum32")]
    Enum32,
    #[serde(rename = "bitfield32")]
    Bitfield32,
    #[serde(rename = "ipaddr")]
    IpV4,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "uint64")]
    UInt64,
    #[serde(rename = "acc64")]
    Acc64,
    #[serde(rename = "ipv6addr")]
    IpV6,
}

impl ValueKind {
    pub const ALL: [ValueKind; 17] = [
        Self::Int16,
        Self::UInt16,
        Self::Acc16,
        Self::Enum16,
        Self::Bitfield16,
        Self::Pad,
        Self::ScaleFactor,
        Self::Int32,
        Self::UInt32,
        Self::Acc32,
        Self::Enum32,
        Self::Bitfield32,
        Self::IpV4,
        Self::Int64,
        Self::UInt64,
        Self::Acc64,
        Self::IpV6,
    ];

    /// Number of registers backing a value of this kind.
    pub const fn length(self) -> usize {
        match self {
            Self::Int16
            | Self::UInt16
            | Self::Acc16
            | Self::Enum16
            | Self::Bitfield16
            | Self::Pad
            | Self::ScaleFactor => 1,
            Self::Int32
            | Self::UInt32
            | Self::Acc32
            | Self::Enum32
            | Self::Bitfield32
            | Self::IpV4 => 2,
            Self::Int64 | Self::UInt64 | Self::Acc64 => 4,
            Self::IpV6 => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Acc16 => "acc16",
            Self::Enum16 => "enum16",
            Self::Bitfield16 => "bitfield16",
            Self::Pad => "pad",
            Self::ScaleFactor => "sunssf",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Acc32 => "acc32",
            Self::Enum32 => "enum32",
            Self::Bitfield32 => "bitfield32",
            Self::IpV4 => "ipaddr",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Acc64 => "acc64",
            Self::IpV6 => "ipv6addr",
        }
    }

    pub fn decode(self, words: &[u16]) -> Result<Value, CodecError> {
        Ok(match self {
            Self::Int16 => Int16::decode(words)?.into(),
            Self::UInt16 => UInt16::decode(words)?.into(),
            Self::Acc16 => Acc16::decode(words)?.into(),
            Self::Enum16 => Enum16::decode(words)?.into(),
            Self::Bitfield16 => Bitfield16::decode(words)?.into(),
            Self::Pad => Pad::decode(words)?.into(),
            Self::ScaleFactor => ScaleFactor::decode(words)?.into(),
            Self::Int32 => Int32::decode(words)?.into(),
            Self::UInt32 => UInt32::decode(words)?.into(),
            Self::Acc32 => Acc32::decode(words)?.into(),
            Self::Enum32 => Enum32::decode(words)?.into(),
            Self::Bitfield32 => Bitfield32::decode(words)?.into(),
            Self::IpV4 => IpV4::decode(words)?.into(),
            Self::Int64 => Int64::decode(words)?.into(),
            Self::UInt64 => UInt64::decode(words)?.into(),
            Self::Acc64 => Acc64::decode(words)?.into(),
            Self::IpV6 => IpV6::decode(words)?.into(),
        })
    }

    /// The canonical sentinel of this kind; also the initial state of a field.
    pub fn sentinel(self) -> Value {
        match self {
            Self::Int16 => Int16::default().into(),
            Self::UInt16 => UInt16::default().into(),
            Self::Acc16 => Acc16::default().into(),
            Self::Enum16 => Enum16::default().into(),
            Self::Bitfield16 => Bitfield16::default().into(),
            Self::Pad => Pad.into(),
            Self::ScaleFactor => ScaleFactor::default().into(),
            Self::Int32 => Int32::default().into(),
            Self::UInt32 => UInt32::default().into(),
            Self::Acc32 => Acc32::default().into(),
            Self::Enum32 => Enum32::default().into(),
            Self::Bitfield32 => Bitfield32::default().into(),
            Self::IpV4 => IpV4::default().into(),
            Self::Int64 => Int64::default().into(),
            Self::UInt64 => UInt64::default().into(),
            Self::Acc64 => Acc64::default().into(),
            Self::IpV6 => IpV6::default().into(),
        }
    }

    /// Parse a textual value, as supplied by configuration or a REST body.
    ///
    /// Sentinel names (`NotImplemented`, `NotAccumulated`, `NotConfigured`)
    /// produce this kind's sentinel.
    pub fn parse(self, text: &str) -> Result<Value, CodecError> {
        let text = text.trim();
        if Sentinel::from_name(text).is_some() && self != Self::ScaleFactor {
            return Ok(self.sentinel());
        }
        Ok(match self {
            Self::Int16 => Int16::parse(text)?.into(),
            Self::UInt16 => UInt16::parse(text)?.into(),
            Self::Acc16 => Acc16::parse(text)?.into(),
            Self::Enum16 => Enum16::parse(text)?.into(),
            Self::Bitfield16 => Bitfield16::parse(text)?.into(),
            Self::Pad => Pad.into(),
            Self::ScaleFactor => ScaleFactor::parse(text)?.into(),
            Self::Int32 => Int32::parse(text)?.into(),
            Self::UInt32 => UInt32::parse(text)?.into(),
            Self::Acc32 => Acc32::parse(text)?.into(),
            Self::Enum32 => Enum32::parse(text)?.into(),
            Self::Bitfield32 => Bitfield32::parse(text)?.into(),
            Self::IpV4 => IpV4::parse(text)?.into(),
            Self::Int64 => Int64::parse(text)?.into(),
            Self::UInt64 => UInt64::parse(text)?.into(),
            Self::Acc64 => Acc64::parse(text)?.into(),
            Self::IpV6 => IpV6::parse(text)?.into(),
        })
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ValueKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| CodecError::InvalidArgument(format!("unknown value kind {}", s)))
    }
}
