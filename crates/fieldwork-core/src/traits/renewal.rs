// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable storage of renewals.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::FieldworkError;
use crate::types::{JobCardId, NewRenewal, Renewal, RenewalId, RenewalStatus, RenewalType};

/// Renewal rows, unique on `(job_card_id, due_date, renewal_type)`.
///
/// Implementations must report an insert that collides with that key as
/// [`FieldworkError::UniqueViolation`].
#[async_trait]
pub trait RenewalStore: Send + Sync {
    /// Find the renewal occupying a dedup key, if any.
    async fn find_renewal(
        &self,
        job_card_id: JobCardId,
        due_date: NaiveDate,
        renewal_type: RenewalType,
    ) -> Result<Option<Renewal>, FieldworkError>;

    async fn insert_renewal(&self, renewal: &NewRenewal) -> Result<Renewal, FieldworkError>;

    /// All renewals of one job card, ordered by due date then type.
    async fn list_renewals_for_job_card(
        &self,
        job_card_id: JobCardId,
    ) -> Result<Vec<Renewal>, FieldworkError>;

    async fn get_renewal(&self, id: RenewalId) -> Result<Option<Renewal>, FieldworkError>;

    /// Returns false if the renewal does not exist.
    async fn set_renewal_status(
        &self,
        id: RenewalId,
        status: RenewalStatus,
    ) -> Result<bool, FieldworkError>;
}
