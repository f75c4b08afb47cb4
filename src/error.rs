//! Error types for TyrantKV
//!
//! Every operation reports failure through one error type. The store's own
//! numeric error codes survive as [`ErrorCode`], so callers that need the
//! legacy `(message, code)` pair can still get it from any error.

use std::fmt;

use thiserror::Error;

/// Result type alias using TyrantError
pub type Result<T> = std::result::Result<T, TyrantError>;

/// Error codes defined by the store's client library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,
    Invalid = 1,
    NoHost = 2,
    Refused = 3,
    Send = 4,
    Recv = 5,
    Keep = 6,
    NoRecord = 7,
    Misc = 9999,
}

impl ErrorCode {
    /// Canonical human-readable message for the code
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::Success => "success",
            ErrorCode::Invalid => "invalid operation",
            ErrorCode::NoHost => "host not found",
            ErrorCode::Refused => "connection refused",
            ErrorCode::Send => "send error",
            ErrorCode::Recv => "recv error",
            ErrorCode::Keep => "existing record",
            ErrorCode::NoRecord => "no record found",
            ErrorCode::Misc => "miscellaneous error",
        }
    }

    /// Numeric value as exposed to callers
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a numeric code back to its variant; unknown codes become `Misc`
    pub fn from_i32(code: i32) -> Self {
        match code {
            0 => ErrorCode::Success,
            1 => ErrorCode::Invalid,
            2 => ErrorCode::NoHost,
            3 => ErrorCode::Refused,
            4 => ErrorCode::Send,
            5 => ErrorCode::Recv,
            6 => ErrorCode::Keep,
            7 => ErrorCode::NoRecord,
            _ => ErrorCode::Misc,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Unified error type for TyrantKV operations
#[derive(Debug, Error)]
pub enum TyrantError {
    // -------------------------------------------------------------------------
    // Remote Errors
    // -------------------------------------------------------------------------
    /// The server answered with a failure status
    #[error("{code} (code {})", .code.as_i32())]
    Remote { code: ErrorCode },

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    /// Connecting, sending or receiving failed at the socket level
    #[error("{code}: {source}")]
    Transport {
        code: ErrorCode,
        #[source]
        source: std::io::Error,
    },

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Local Errors
    // -------------------------------------------------------------------------
    /// The caller passed something the operation cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Handle is closed")]
    Closed,

    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Snapshot Errors (mock server)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot corruption detected: {0}")]
    SnapshotCorruption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TyrantError {
    /// Build a remote failure from a store error code
    pub fn remote(code: ErrorCode) -> Self {
        TyrantError::Remote { code }
    }

    /// Wrap a socket error with the store code it corresponds to
    pub fn transport(code: ErrorCode, source: std::io::Error) -> Self {
        TyrantError::Transport { code, source }
    }

    /// Store error code equivalent of this error
    pub fn code(&self) -> ErrorCode {
        match self {
            TyrantError::Remote { code } | TyrantError::Transport { code, .. } => *code,
            TyrantError::InvalidArgument(_) | TyrantError::Closed | TyrantError::Config(_) => {
                ErrorCode::Invalid
            }
            TyrantError::Protocol(_)
            | TyrantError::Io(_)
            | TyrantError::SnapshotCorruption(_)
            | TyrantError::Serialization(_) => ErrorCode::Misc,
        }
    }

    /// Human-readable message paired with [`code`](Self::code)
    pub fn message(&self) -> String {
        match self {
            TyrantError::Remote { code } => code.message().to_string(),
            other => other.to_string(),
        }
    }

    /// True for programming mistakes detected before anything reached the wire
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            TyrantError::InvalidArgument(_) | TyrantError::Closed | TyrantError::Config(_)
        )
    }

    /// True when the failure came from the transport layer
    pub fn is_transport(&self) -> bool {
        matches!(self, TyrantError::Transport { .. })
    }

    /// True when the server reported that the record does not exist
    pub fn is_no_record(&self) -> bool {
        self.code() == ErrorCode::NoRecord
    }
}
