// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::FieldworkError;

/// Adapter for storage and persistence backends.
///
/// Storage adapters own the database connection; the entity store traits
/// are implemented on the same type once it is initialized.
#[async_trait]
pub trait StorageAdapter: Send + Sync + 'static {
    /// Initializes the storage backend (connection, PRAGMAs, migrations).
    async fn initialize(&self) -> Result<(), FieldworkError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), FieldworkError>;
}
