//! Classified results of the plant service calls.
//!
//! Every call ends in exactly one outcome. Failures carry a
//! [`FailureKind`] so the caller can tell "fix your input" apart from
//! "try again".

use std::fmt;

/// Detail used when a rejection carries no readable message.
pub const UNKNOWN_ERROR_DETAIL: &str = "unknown";

/// Why a call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Local precondition failed; no request was sent.
    Validation,
    /// No response was received (connectivity, DNS, timeout).
    Transport,
    /// The creation endpoint answered with a failure status.
    Rejected,
    /// The recognition endpoint answered without a usable name.
    EmptyOrRejected,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transport => "transport",
            Self::Rejected => "rejected",
            Self::EmptyOrRejected => "empty_or_rejected",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal failure of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    /// Best-effort human readable detail.
    pub detail: String,
}

impl Failure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, detail)
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, detail)
    }

    /// Only transport failures are worth repeating unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind == FailureKind::Transport
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// Outcome of a recognition call. Advisory: a failure never blocks the
/// user from typing a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionResult {
    Success { name: String },
    Failure(Failure),
}

impl RecognitionResult {
    /// The recognized name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Success { name } => Some(name),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

/// Outcome of a create-record call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateResult {
    Success,
    Failure(Failure),
}

impl CreateResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Success => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}
