//! Common result and error types for the sinter toolchain.

/// The standard result type for operations that maintain netlist invariants.
pub type SinterResult<T> = Result<T, InternalError>;

/// A violated netlist invariant.
///
/// Raised when an operation would break a structural guarantee of the IR,
/// such as inserting a second wire with an existing name or connecting
/// signals of different widths. Passes treat these as fatal.
#[derive(Debug, thiserror::Error)]
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
