// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Fieldwork service-contract engine.

use thiserror::Error;

/// The primary error type used across all Fieldwork store traits and engine operations.
#[derive(Debug, Error)]
pub enum FieldworkError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, row decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An insert lost to an existing row on a unique key.
    ///
    /// Raised by stores and consumed by `get_or_create`; callers outside the
    /// engine should never observe it.
    #[error("duplicate {entity} for key {key}")]
    UniqueViolation { entity: &'static str, key: String },

    /// A contact identifier failed normalization.
    #[error("invalid contact identifier `{input}`: expected exactly {expected_digits} digits")]
    InvalidIdentifier {
        input: String,
        expected_digits: usize,
    },

    /// A job card's contract attributes cannot produce a schedule.
    #[error("invalid contract spec: {0}")]
    InvalidContractSpec(String),

    /// Renewal scheduling failed for a reason other than invalid input.
    #[error("scheduling failed: {message}")]
    Scheduling {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A referenced client, inquiry, job card, or renewal does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Input rejected before any write was attempted.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FieldworkError {
    /// Wrap any storage-layer error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for errors that reject the caller's input rather than signal a fault.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. } | Self::InvalidContractSpec(_) | Self::Validation(_)
        )
    }
}
