use serde::Serialize;
use thiserror::Error;

/// Failure decoding or encoding a register value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("out of range: {kind} needs {expected} registers, got {actual}")]
    OutOfRange {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{0} field cannot hold a {1} value")]
    KindMismatch(&'static str, &'static str),
}

impl CodecError {
    pub fn kind(&self) -> StatusKind {
        match self {
            Self::InvalidArgument(_) => StatusKind::InvalidArgument,
            Self::OutOfRange { .. } => StatusKind::OutOfRange,
            Self::KindMismatch(_, _) => StatusKind::EncodingError,
        }
    }
}

/// Outcome category of a dispatcher operation.
///
/// Callers branch on the kind, never on the explanation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StatusKind {
    Good,
    NotFound,
    NotReadable,
    NotWritable,
    OutOfRange,
    InvalidArgument,
    EncodingError,
    CommunicationError,
    DeviceFailure,
    NotConnected,
    InternalError,
}

impl StatusKind {
    /// Soft failures concern a single property's schema or access policy;
    /// a multi-property operation records them and carries on.
    pub fn is_soft(self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::NotReadable | Self::NotWritable
        )
    }

    /// Anything that is neither good nor soft stops a multi-property operation.
    pub fn is_hard(self) -> bool {
        self != Self::Good && !self.is_soft()
    }
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub kind: StatusKind,
    pub explanation: String,
}

impl Status {
    pub fn good() -> Self {
        Self {
            kind: StatusKind::Good,
            explanation: String::new(),
        }
    }

    pub fn new(kind: StatusKind, explanation: impl Into<String>) -> Self {
        Self {
            kind,
            explanation: explanation.into(),
        }
    }

    pub fn is_good(&self) -> bool {
        self.kind == StatusKind::Good
    }

    pub fn not_found(name: &str) -> Self {
        Self::new(StatusKind::NotFound, format!("no property named {}", name))
    }

    pub fn not_readable(name: &str) -> Self {
        Self::new(StatusKind::NotReadable, format!("{} is not readable", name))
    }

    pub fn not_writable(name: &str) -> Self {
        Self::new(StatusKind::NotWritable, format!("{} is not writable", name))
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.explanation.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.explanation)
        }
    }
}

impl From<CodecError> for Status {
    fn from(err: CodecError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_and_hard_kinds() {
        assert!(StatusKind::NotFound.is_soft());
        assert!(StatusKind::NotWritable.is_soft());
        assert!(!StatusKind::Good.is_hard());
        assert!(StatusKind::CommunicationError.is_hard());
        assert!(StatusKind::EncodingError.is_hard());
        assert!(!StatusKind::NotReadable.is_hard());
    }

    #[test]
    fn codec_error_maps_to_status() {
        let status: Status = CodecError::OutOfRange {
            kind: "uint32",
            expected: 2,
            actual: 1,
        }
        .into();
        assert_eq!(status.kind, StatusKind::OutOfRange);
        assert_eq!(
            status.to_string(),
            "OutOfRange: out of range: uint32 needs 2 registers, got 1"
        );
    }
}
