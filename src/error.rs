//! Error types.
//!
//! Programming-contract violations (reading a value a `sequence` never
//! produced, invoking a one-shot continuation twice) are panics, not errors.
//! The types here cover outcomes a caller can act on.

use thiserror::Error;

use crate::dom::NodeId;

/// Failure of an asynchronous computation.
///
/// Delivered to the error continuation of an [`Async`](crate::concurrency::Async)
/// chain. Cancellation is not an error; it travels on its own channel as
/// [`OperationCanceled`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AsyncError {
    /// The computation reported a failure.
    #[error("{0}")]
    Failed(String),
    /// The computation panicked; the panic was caught at a bind boundary.
    #[error("computation panicked: {0}")]
    Panicked(String),
}

impl AsyncError {
    /// Convenience constructor for [`AsyncError::Failed`].
    pub fn failed(msg: impl Into<String>) -> Self {
        AsyncError::Failed(msg.into())
    }
}

/// Marker outcome for a computation whose token was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the operation was canceled")]
pub struct OperationCanceled;

/// Errors raised while mounting a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// `run_replace` needs the replaced element to have a parent.
    #[error("element {0:?} has no parent to mount into")]
    Detached(NodeId),
}

/// Result alias for mount operations.
pub type Result<T> = std::result::Result<T, Error>;
