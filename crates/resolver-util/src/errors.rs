use miette::Diagnostic;
use thiserror::Error;

/// The failure taxonomy shared by the collector, the graph transformer
/// pipeline, `SyncContext` and the `ArtifactResolver`.
///
/// Every user-visible failure is tagged with one of these kinds so callers
/// can branch on failure category without string-matching messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Resource missing, or filtered out by policy.
    NotFound,
    /// Transport IO, 5xx, timeout, or TLS failure.
    TransferFailed,
    /// Repository unreachable because of an offline policy.
    Offline,
    /// A post-processor rejected a downloaded artifact's checksum.
    ChecksumMismatch,
    /// The descriptor collaborator returned a malformed descriptor.
    DescriptorInvalid,
    /// An unsolvable conflict was found during graph transformation.
    VersionConflict,
    /// Worker cancellation propagated to the collector's driver loop.
    CollectionInterrupted,
    /// A named lock timed out after exhausting its retry budget.
    LockAcquisition,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::TransferFailed => "transfer failed",
            Self::Offline => "offline",
            Self::ChecksumMismatch => "checksum mismatch",
            Self::DescriptorInvalid => "invalid descriptor",
            Self::VersionConflict => "version conflict",
            Self::CollectionInterrupted => "collection interrupted",
            Self::LockAcquisition => "lock acquisition failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for all resolver operations.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolverError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A failure tagged with one of the kinds in [`ErrorKind`], carrying the
    /// offending coordinates and/or repository as free text (spec-level
    /// "user-visible failures" always carry coordinates + cause chain).
    #[error("{kind}: {message}")]
    Kinded { kind: ErrorKind, message: String },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

impl ResolverError {
    pub fn kinded(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Kinded {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Kinded { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Convenience alias for `miette::Result<T>`.
pub type ResolverResult<T> = miette::Result<T>;
