use super::{take, RegisterCodec, Registers, Sentinel, Value, ValueKind};
use crate::error::CodecError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Serialize, Serializer};

/// `sunssf`: power-of-ten exponent applied to a neighbouring reading.
///
/// Unlike the bitfields, a register outside the legal set is a decode error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(i16)]
pub enum ScaleFactor {
    N10 = -10,
    N9 = -9,
    N8 = -8,
    N7 = -7,
    N6 = -6,
    N5 = -5,
    N4 = -4,
    N3 = -3,
    N2 = -2,
    N1 = -1,
    Zero = 0,
    P1 = 1,
    P2 = 2,
    P3 = 3,
    P4 = 4,
    P5 = 5,
    P6 = 6,
    P7 = 7,
    P8 = 8,
    P9 = 9,
    P10 = 10,
    NotImplemented = -32768,
}

// num_enum treats a `#[default]` variant as the catch-all for unknown words.
impl Default for ScaleFactor {
    fn default() -> Self {
        Self::NotImplemented
    }
}

impl ScaleFactor {
    pub const ALL: [ScaleFactor; 22] = [
        Self::N10,
        Self::N9,
        Self::N8,
        Self::N7,
        Self::N6,
        Self::N5,
        Self::N4,
        Self::N3,
        Self::N2,
        Self::N1,
        Self::Zero,
        Self::P1,
        Self::P2,
        Self::P3,
        Self::P4,
        Self::P5,
        Self::P6,
        Self::P7,
        Self::P8,
        Self::P9,
        Self::P10,
        Self::NotImplemented,
    ];

    pub fn from_word(word: u16) -> Result<Self, CodecError> {
        Self::try_from(word as i16).map_err(|_| {
            CodecError::InvalidArgument(format!("0x{:04X} is not a scale factor", word))
        })
    }

    /// Signed exponent, `None` when not implemented.
    pub fn factor(self) -> Option<i32> {
        match self {
            Self::NotImplemented => None,
            sf => Some(i32::from(i16::from(sf))),
        }
    }

    /// `raw * 10^factor`
    pub fn apply(self, raw: f64) -> Option<f64> {
        self.factor().map(|factor| raw * 10f64.powi(factor))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::N10 => "N10",
            Self::N9 => "N9",
            Self::N8 => "N8",
            Self::N7 => "N7",
            Self::N6 => "N6",
            Self::N5 => "N5",
            Self::N4 => "N4",
            Self::N3 => "N3",
            Self::N2 => "N2",
            Self::N1 => "N1",
            Self::Zero => "Zero",
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::P4 => "P4",
            Self::P5 => "P5",
            Self::P6 => "P6",
            Self::P7 => "P7",
            Self::P8 => "P8",
            Self::P9 => "P9",
            Self::P10 => "P10",
            Self::NotImplemented => "NotImplemented",
        }
    }

    /// Exact, case-sensitive match against the canonical names.
    pub fn from_name(name: &str) -> Result<Self, CodecError> {
        Self::ALL
            .into_iter()
            .find(|sf| sf.name() == name)
            .ok_or_else(|| CodecError::InvalidArgument(format!("unknown scale factor {:?}", name)))
    }

    /// Name or bare exponent, e.g. `"N2"` or `"-2"`.
    pub(crate) fn parse(text: &str) -> Result<Self, CodecError> {
        match text.parse::<i16>() {
            Ok(exponent) => Self::try_from(exponent).map_err(|_| {
                CodecError::InvalidArgument(format!("{} is not a scale factor", exponent))
            }),
            Err(_) => Self::from_name(text),
        }
    }
}

impl Registers for ScaleFactor {
    fn encode(&self) -> Vec<u16> {
        vec![i16::from(*self) as u16]
    }

    fn sentinel(&self) -> Option<Sentinel> {
        (*self == Self::NotImplemented).then_some(Sentinel::NotImplemented)
    }

    fn kind(&self) -> ValueKind {
        ValueKind::ScaleFactor
    }
}

impl RegisterCodec for ScaleFactor {
    const KIND: ValueKind = ValueKind::ScaleFactor;

    fn decode(words: &[u16]) -> Result<Self, CodecError> {
        let words = take(words, ValueKind::ScaleFactor)?;
        Self::from_word(words[0])
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::ScaleFactor(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ScaleFactor {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl Serialize for ScaleFactor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.factor() {
            Some(factor) => serializer.serialize_i32(factor),
            None => serializer.serialize_none(),
        }
    }
}

/// Rescale a raw reading into engineering units. `None` if either the
/// reading or the scale factor is a sentinel, or the reading isn't numeric.
pub fn scaled(value: Value, sf: ScaleFactor) -> Option<f64> {
    value.as_f64().and_then(|raw| sf.apply(raw))
}
