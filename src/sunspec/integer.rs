use super::{take, RegisterCodec, Registers, Sentinel, Value, ValueKind};
use crate::error::CodecError;
use serde::Serialize;

// Each integer codec stores `None` for its sentinel. Constructors fold any
// raw value outside the valid set into `None`, so encode(decode(x)) is exact
// and decode(encode(v)) == v for every constructible v.
macro_rules! integer_codec {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:ident, native = $native:ty, raw = $raw:ty,
        sentinel = $sentinel_bits:expr, $marker:ident,
        valid = |$v:ident| $valid:expr
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
        pub struct $name(Option<$native>);

        impl $name {
            pub const SENTINEL_BITS: $raw = $sentinel_bits;

            pub fn new(value: $native) -> Self {
                Self::from_raw(value as $raw)
            }

            fn from_raw(raw: $raw) -> Self {
                let $v = raw;
                if $valid {
                    Self(Some(raw as $native))
                } else {
                    Self(None)
                }
            }

            pub fn value(&self) -> Option<$native> {
                self.0
            }

            fn raw(&self) -> $raw {
                match self.0 {
                    Some(value) => value as $raw,
                    None => Self::SENTINEL_BITS,
                }
            }

            pub(crate) fn parse(text: &str) -> Result<Self, CodecError> {
                let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                    Some(hex) => <$raw>::from_str_radix(hex, 16).map(|raw| raw as $native),
                    None => text.parse::<$native>(),
                };
                parsed.map(Self::new).map_err(|err| {
                    CodecError::InvalidArgument(format!(
                        "{:?} is not a valid {}: {}",
                        text,
                        ValueKind::$kind,
                        err
                    ))
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self(None)
            }
        }

        impl Registers for $name {
            fn encode(&self) -> Vec<u16> {
                let raw = self.raw();
                let length = ValueKind::$kind.length();
                (0..length)
                    .map(|i| (raw >> (16 * (length - 1 - i))) as u16)
                    .collect()
            }

            fn sentinel(&self) -> Option<Sentinel> {
                match self.0 {
                    Some(_) => None,
                    None => Some(Sentinel::$marker),
                }
            }

            fn kind(&self) -> ValueKind {
                ValueKind::$kind
            }
        }

        impl RegisterCodec for $name {
            const KIND: ValueKind = ValueKind::$kind;

            fn decode(words: &[u16]) -> Result<Self, CodecError> {
                let words = take(words, ValueKind::$kind)?;
                let raw = words
                    .iter()
                    .fold(0 as $raw, |acc, word| {
                        (acc.checked_shl(16).unwrap_or(0)) | <$raw>::from(*word)
                    });
                Ok(Self::from_raw(raw))
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$kind(v) => Some(v),
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.0 {
                    Some(value) => write!(f, "{}", value),
                    None => write!(f, "{}", Sentinel::$marker),
                }
            }
        }
    };
}

integer_codec!(
    /// `int16`
    Int16, Int16, native = i16, raw = u16,
    sentinel = 0x8000, NotImplemented,
    valid = |raw| raw != 0x8000
);
integer_codec!(
    /// `uint16`
    UInt16, UInt16, native = u16, raw = u16,
    sentinel = 0xFFFF, NotImplemented,
    valid = |raw| raw != 0xFFFF
);
integer_codec!(
    /// `acc16`: a counter, where zero means nothing has been accumulated yet.
    Acc16, Acc16, native = u16, raw = u16,
    sentinel = 0x0000, NotAccumulated,
    valid = |raw| raw != 0
);
integer_codec!(
    /// `enum16`
    Enum16, Enum16, native = u16, raw = u16,
    sentinel = 0xFFFF, NotImplemented,
    valid = |raw| raw != 0xFFFF
);
integer_codec!(
    /// `bitfield16`. The top bit is reserved: anything above 0x7FFF is
    /// treated as not implemented rather than rejected.
    Bitfield16, Bitfield16, native = u16, raw = u16,
    sentinel = 0xFFFF, NotImplemented,
    valid = |raw| raw <= 0x7FFF
);
integer_codec!(
    /// `int32`
    Int32, Int32, native = i32, raw = u32,
    sentinel = 0x8000_0000, NotImplemented,
    valid = |raw| raw != 0x8000_0000
);
integer_codec!(
    /// `uint32`
    UInt32, UInt32, native = u32, raw = u32,
    sentinel = 0xFFFF_FFFF, NotImplemented,
    valid = |raw| raw != 0xFFFF_FFFF
);
integer_codec!(
    /// `acc32`
    Acc32, Acc32, native = u32, raw = u32,
    sentinel = 0, NotAccumulated,
    valid = |raw| raw != 0
);
integer_codec!(
    /// `enum32`
    Enum32, Enum32, native = u32, raw = u32,
    sentinel = 0xFFFF_FFFF, NotImplemented,
    valid = |raw| raw != 0xFFFF_FFFF
);
integer_codec!(
    /// `bitfield32`, same permissive policy as `Bitfield16`.
    Bitfield32, Bitfield32, native = u32, raw = u32,
    sentinel = 0xFFFF_FFFF, NotImplemented,
    valid = |raw| raw <= 0x7FFF_FFFF
);
integer_codec!(
    /// `int64`
    Int64, Int64, native = i64, raw = u64,
    sentinel = 0x8000_0000_0000_0000, NotImplemented,
    valid = |raw| raw != 0x8000_0000_0000_0000
);
integer_codec!(
    /// `uint64`
    UInt64, UInt64, native = u64, raw = u64,
    sentinel = 0xFFFF_FFFF_FFFF_FFFF, NotImplemented,
    valid = |raw| raw != 0xFFFF_FFFF_FFFF_FFFF
);
integer_codec!(
    /// `acc64`
    Acc64, Acc64, native = u64, raw = u64,
    sentinel = 0, NotAccumulated,
    valid = |raw| raw != 0
);

impl Bitfield16 {
    /// State of bit `bit`, `None` when the whole field is not implemented.
    pub fn is_bit_set(&self, bit: u8) -> Option<bool> {
        self.0.map(|data| bit < 16 && data & (1 << bit) != 0)
    }
}

impl Bitfield32 {
    pub fn is_bit_set(&self, bit: u8) -> Option<bool> {
        self.0.map(|data| bit < 32 && data & (1 << bit) != 0)
    }
}

/// Structural filler. Always 0x8000 on the wire whatever was read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Pad;

impl Pad {
    pub const BITS: u16 = 0x8000;
}

impl Registers for Pad {
    fn encode(&self) -> Vec<u16> {
        vec![Self::BITS]
    }

    fn sentinel(&self) -> Option<Sentinel> {
        Some(Sentinel::NotImplemented)
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Pad
    }
}

impl RegisterCodec for Pad {
    const KIND: ValueKind = ValueKind::Pad;

    fn decode(words: &[u16]) -> Result<Self, CodecError> {
        take(words, ValueKind::Pad)?;
        Ok(Pad)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Pad(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for Pad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("pad")
    }
}
