//! Error types for streamforge

use thiserror::Error;

/// Main error type for pipeline construction and session propagation.
///
/// Configuration errors are reported by `ConstraintFactory::build` and are
/// never recoverable: no pipeline exists afterwards. Every other variant is
/// raised by a running session; after a `ProtocolViolation` or a
/// `ScoreCorruption` the session is poisoned and refuses further work.
#[derive(Debug, Error)]
pub enum StreamForgeError {
    /// Invalid pipeline description.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Joiners of a single join or exists call are not in a legal order.
    #[error("Invalid joiner combination: {0}")]
    InvalidJoiner(String),

    /// A stream operation would produce tuples outside the supported arity range.
    #[error("Arity out of range: {operation} would produce arity {arity} (supported: 1..=4)")]
    ArityOutOfRange { operation: &'static str, arity: usize },

    /// The handle does not refer to a live fact of this session.
    #[error("Unknown fact: {0}")]
    UnknownFact(String),

    /// A fact update supplied a value of a different type than the original.
    #[error("Fact type mismatch: expected {expected}, got {actual}")]
    FactTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// The insert/retract protocol was broken by the caller or by a node.
    #[error("Propagation protocol violation in {node}: {detail}")]
    ProtocolViolation { node: String, detail: String },

    /// Incremental score differs from a from-scratch recomputation.
    #[error("Score corruption: incremental score {incremental} != from-scratch score {from_scratch}")]
    ScoreCorruption {
        incremental: String,
        from_scratch: String,
    },

    /// A user-supplied function panicked during propagation.
    #[error("User function panicked: {0}")]
    UserPanic(String),

    /// A previous failure aborted this session.
    #[error("Session poisoned by an earlier failure")]
    SessionPoisoned,

    /// Internal error (should not occur in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StreamForgeError {
    /// Creates a protocol violation error for the named node.
    pub fn protocol(node: impl Into<String>, detail: impl Into<String>) -> Self {
        StreamForgeError::ProtocolViolation {
            node: node.into(),
            detail: detail.into(),
        }
    }

    /// Returns true if this error must abort the session that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StreamForgeError::ProtocolViolation { .. }
                | StreamForgeError::ScoreCorruption { .. }
                | StreamForgeError::UserPanic(_)
                | StreamForgeError::SessionPoisoned
                | StreamForgeError::Internal(_)
        )
    }
}

/// Result type alias for streamforge operations
pub type Result<T> = std::result::Result<T, StreamForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = StreamForgeError::protocol("GroupNode#3", "no undo registered for tuple 17");
        assert_eq!(
            err.to_string(),
            "Propagation protocol violation in GroupNode#3: no undo registered for tuple 17"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_user_errors_are_not_fatal() {
        assert!(!StreamForgeError::UnknownFact("#4".into()).is_fatal());
        assert!(!StreamForgeError::Config("x".into()).is_fatal());
    }
}
