//! Error types for engine client operations.

use std::fmt;

use thiserror::Error;

/// Errors that can occur during engine client operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An entity, or an entity it references, does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller supplied malformed input (bad MAC, empty name, ...).
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// The engine answered, but the response is missing something we need.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// The operation clashes with existing state (duplicate name, entity in use).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The engine rejected our credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Generic remote failure.
    #[error("{0}")]
    Unidentified(String),

    /// The request never made it to the engine, or the reply never came back.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A single attempt ran past its call timeout.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The entity is not visible yet but is expected to appear.
    ///
    /// The backends never report this. Callers return it from their own
    /// polling closures passed to [`crate::retry::retry`] so that a
    /// not-yet-visible entity is retried instead of failing as `NotFound`.
    #[error("Pending: {0}")]
    Pending(String),

    /// Internal error (lock poisoning and similar).
    #[error("Internal error: {0}")]
    Internal(String),

    /// The retry budget ran out; carries the last retryable failure.
    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    Exhausted {
        operation: String,
        attempts: u32,
        #[source]
        source: Box<EngineError>,
    },
}

/// Discriminant of [`EngineError`], used by callers to branch on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    ValidationFailed,
    ProtocolViolation,
    Conflict,
    Unauthorized,
    Unidentified,
    Transport,
    Timeout,
    Pending,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::ValidationFailed => "validation failed",
            ErrorKind::ProtocolViolation => "protocol violation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Unidentified => "unidentified",
            ErrorKind::Transport => "transport",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Pending => "pending",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

impl EngineError {
    /// Failure class. Looks through [`EngineError::Exhausted`] to the last failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            EngineError::ProtocolViolation(_) => ErrorKind::ProtocolViolation,
            EngineError::Conflict(_) => ErrorKind::Conflict,
            EngineError::Unauthorized(_) => ErrorKind::Unauthorized,
            EngineError::Unidentified(_) => ErrorKind::Unidentified,
            EngineError::Transport(_) => ErrorKind::Transport,
            EngineError::Timeout(_) => ErrorKind::Timeout,
            EngineError::Pending(_) => ErrorKind::Pending,
            EngineError::Internal(_) => ErrorKind::Internal,
            EngineError::Exhausted { source, .. } => source.kind(),
        }
    }

    /// Whether another attempt could plausibly succeed.
    ///
    /// An already exhausted error is never retryable again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Unidentified(_)
                | EngineError::Transport(_)
                | EngineError::Timeout(_)
                | EngineError::Pending(_)
        )
    }

    /// Number of attempts made, if the error came out of an exhausted retry loop.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            EngineError::Exhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Prefix the message with context, keeping the failure class.
    pub fn context(self, context: impl fmt::Display) -> Self {
        let wrap = |msg: String| format!("{}: {}", context, msg);
        match self {
            EngineError::NotFound(m) => EngineError::NotFound(wrap(m)),
            EngineError::ValidationFailed(m) => EngineError::ValidationFailed(wrap(m)),
            EngineError::ProtocolViolation(m) => EngineError::ProtocolViolation(wrap(m)),
            EngineError::Conflict(m) => EngineError::Conflict(wrap(m)),
            EngineError::Unauthorized(m) => EngineError::Unauthorized(wrap(m)),
            EngineError::Unidentified(m) => EngineError::Unidentified(wrap(m)),
            EngineError::Transport(m) => EngineError::Transport(wrap(m)),
            EngineError::Timeout(m) => EngineError::Timeout(wrap(m)),
            EngineError::Pending(m) => EngineError::Pending(wrap(m)),
            EngineError::Internal(m) => EngineError::Internal(wrap(m)),
            exhausted @ EngineError::Exhausted { .. } => exhausted,
        }
    }
}

/// A response arrived without a field the operation needs.
pub fn field_not_found(object: &str, field: &str) -> EngineError {
    EngineError::ProtocolViolation(format!("{} does not contain the {} field", object, field))
}

pub(crate) fn lock_poisoned() -> EngineError {
    EngineError::Internal("Lock poisoned".to_string())
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
