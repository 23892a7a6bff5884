//! Error types for ABI loading and payload decoding.

use thiserror::Error;

/// Errors raised while decoding a transaction payload or event data.
///
/// A decode failure concerns a single log entry: the caller logs it and moves
/// on to the next entry.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("method '{name}' not found in ABI")]
    MethodNotFound { name: String },

    #[error("event '{name}' not found in ABI")]
    EventNotFound { name: String },

    #[error("ABI decode failed: {reason}")]
    AbiDecodeFailed { reason: String },

    #[error("Type mismatch at {field}: expected {expected}")]
    TypeMismatch { field: &'static str, expected: &'static str },

    #[error("Missing argument: {field}")]
    MissingField { field: &'static str },

    #[error("integer at {field} does not fit: {value}")]
    IntegerOverflow { field: &'static str, value: String },
}

impl DecodeError {
    pub(crate) fn abi(e: impl std::fmt::Display) -> Self {
        Self::AbiDecodeFailed { reason: e.to_string() }
    }
}

/// Errors raised while resolving a deployment's contracts.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid ABI for {contract}: {reason}")]
    InvalidAbi { contract: &'static str, reason: String },

    #[error("ABI for {contract} lacks event '{name}'")]
    MissingEvent { contract: &'static str, name: &'static str },
}
