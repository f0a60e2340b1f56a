//! Error types for the SipControl core
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to the application shell, which renders
//! them as transient notices.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Bad user input: empty drink name, malformed PIN, mismatched
    /// confirmation. Aborts the operation with no state change.
    #[error("{0}")]
    Validation(String),

    /// Operation refused because the current state does not allow it:
    /// no default drink, deleting the last drink, nothing to undo.
    #[error("{0}")]
    Precondition(String),

    /// Import document rejected: unsupported version or failed structural
    /// validation. Existing data is left untouched.
    #[error("Import error: {0}")]
    Import(String),

    /// Wrong PIN on unlock, change, or disable.
    #[error("Incorrect PIN")]
    PinMismatch,

    #[error("Drink not found: {0}")]
    DrinkNotFound(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("{0}")]
    Generic(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
