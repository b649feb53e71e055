//! Common result and error types for svgen.

/// The standard result type for operations that can hit a contract failure.
///
/// `Err` means the elaborated model handed to svgen was internally
/// inconsistent (a missing declaration, a variable converted to a port that
/// was never created, a sensitivity source without a channel mapping). The
/// current build is abandoned. User-facing problems are reported through
/// [`DiagnosticSink`](svgen_diagnostics) and the operation still returns `Ok`.
pub type SvgenResult<T> = Result<T, InternalError>;

/// A violated invariant of the elaborated object model or of svgen itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the violated invariant.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for InternalError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<std::fmt::Error> for InternalError {
    fn from(_: std::fmt::Error) -> Self {
        Self::new("formatter error while rendering output")
    }
}
