// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable storage of client identity records.

use async_trait::async_trait;

use crate::error::FieldworkError;
use crate::types::{Client, ClientId, NewClient};

/// Client rows keyed by a unique contact identifier.
///
/// Implementations must enforce uniqueness of `mobile` atomically at insert
/// time and report a lost insert as [`FieldworkError::UniqueViolation`].
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up a client by its normalized identifier, active or not.
    async fn find_client_by_mobile(&self, mobile: &str) -> Result<Option<Client>, FieldworkError>;

    async fn get_client(&self, id: ClientId) -> Result<Option<Client>, FieldworkError>;

    /// Insert a client. Fails with `UniqueViolation` if the identifier is taken.
    async fn insert_client(&self, client: &NewClient) -> Result<Client, FieldworkError>;

    /// Every client row, oldest first.
    async fn list_clients(&self) -> Result<Vec<Client>, FieldworkError>;

    /// Set the active flag. Returns false if the client does not exist.
    async fn set_client_active(&self, id: ClientId, active: bool) -> Result<bool, FieldworkError>;

    /// Rewrite a stored identifier. Fails with `UniqueViolation` on collision.
    async fn update_client_mobile(&self, id: ClientId, mobile: &str)
    -> Result<(), FieldworkError>;
}
