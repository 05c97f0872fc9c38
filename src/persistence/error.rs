//! Errors raised by transaction providers.

use thiserror::Error;

/// Failure of the transactional boundary itself, as opposed to the work
/// running inside it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("No transaction is open")]
    NotOpen,

    #[error("Transaction provider failed: {0}")]
    Provider(String),
}
