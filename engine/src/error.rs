//! Error types for the lofi sync engine.
//!
//! The merge itself never fails. These errors come from the boundary layer:
//! parsing and validating cards, and the [`CardStore`](crate::CardStore) handle.

use crate::CardId;
use thiserror::Error;

/// All possible errors from the sync engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Validation errors
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    #[error("type mismatch for field '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    #[error("invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    // Store errors
    #[error("card not found: {0}")]
    CardNotFound(CardId),

    #[error("card already exists: {0}")]
    CardAlreadyExists(CardId),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
