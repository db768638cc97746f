//! Error types for coinpilot-chat

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using coinpilot-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by session operations.
///
/// A failed exchange is not one of these: its failure is recorded on the
/// exchange itself.
#[derive(Error, Debug)]
pub enum Error {
    /// Another exchange is still in flight
    #[error("An exchange is already in flight")]
    Busy,

    /// No visible exchange has this id
    #[error("Unknown exchange: {0}")]
    UnknownExchange(Uuid),

    /// The exchange did not fail, so there is nothing to retry
    #[error("Exchange {0} has not failed and cannot be retried")]
    NotRetryable(Uuid),
}
