// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable storage of job cards.

use async_trait::async_trait;

use crate::error::FieldworkError;
use crate::types::{JobCard, JobCardId, NewJobCard, PaymentStatus};

#[async_trait]
pub trait JobCardStore: Send + Sync {
    /// Insert a job card and assign its `JC-` code in the same transaction.
    async fn insert_job_card(&self, job_card: &NewJobCard) -> Result<JobCard, FieldworkError>;

    async fn get_job_card(&self, id: JobCardId) -> Result<Option<JobCard>, FieldworkError>;

    /// Persist every mutable column of `job_card` and return the stored row.
    /// Payment status is left alone; it moves only through
    /// [`set_job_card_payment_status`](Self::set_job_card_payment_status).
    ///
    /// Fails with `NotFound` if the row no longer exists.
    async fn update_job_card(&self, job_card: &JobCard) -> Result<JobCard, FieldworkError>;

    /// Set the pause flag. Returns false if the job card does not exist.
    async fn set_job_card_paused(&self, id: JobCardId, paused: bool)
    -> Result<bool, FieldworkError>;

    /// Returns false if the job card does not exist.
    async fn set_job_card_payment_status(
        &self,
        id: JobCardId,
        status: PaymentStatus,
    ) -> Result<bool, FieldworkError>;
}
