// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! State transitions on renewals and on job card pause and payment flags.

use std::sync::Arc;

use fieldwork_core::types::{JobCardId, PaymentStatus, Renewal, RenewalId, RenewalStatus};
use fieldwork_core::{FieldworkError, JobCardStore, RenewalStore};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info};

/// Per-item result counts of a bulk action. `failed_ids` keeps input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub success_count: usize,
    pub failure_count: usize,
    pub failed_ids: Vec<RenewalId>,
}

pub struct RenewalActions {
    renewals: Arc<dyn RenewalStore>,
    job_cards: Arc<dyn JobCardStore>,
}

impl RenewalActions {
    pub fn new(renewals: Arc<dyn RenewalStore>, job_cards: Arc<dyn JobCardStore>) -> Self {
        Self {
            renewals,
            job_cards,
        }
    }

    /// Mark one renewal completed and return the refreshed row.
    ///
    /// Completing an already-completed renewal is a no-op.
    pub async fn mark_completed(&self, id: RenewalId) -> Result<Renewal, FieldworkError> {
        let not_found = || FieldworkError::NotFound {
            entity: "renewal",
            id: id.0,
        };
        let renewal = self.renewals.get_renewal(id).await?.ok_or_else(not_found)?;
        if renewal.status == RenewalStatus::Completed {
            debug!(renewal_id = %id, "renewal already completed");
            return Ok(renewal);
        }

        if !self
            .renewals
            .set_renewal_status(id, RenewalStatus::Completed)
            .await?
        {
            return Err(not_found());
        }
        self.renewals.get_renewal(id).await?.ok_or_else(not_found)
    }

    /// Complete each id independently; one failure never aborts the batch.
    pub async fn bulk_mark_completed(&self, ids: &[RenewalId]) -> BulkOutcome {
        let results = join_all(ids.iter().map(|id| self.mark_completed(*id))).await;

        let mut outcome = BulkOutcome::default();
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(_) => outcome.success_count += 1,
                Err(err) => {
                    debug!(renewal_id = %id, error = %err, "bulk completion item failed");
                    outcome.failure_count += 1;
                    outcome.failed_ids.push(*id);
                }
            }
        }
        info!(
            success_count = outcome.success_count,
            failure_count = outcome.failure_count,
            "bulk marked renewals completed"
        );
        outcome
    }

    /// Set the pause flag on a job card. Renewal rows are not touched.
    ///
    /// Returns `false` when the job card does not exist.
    pub async fn toggle_pause(&self, job_card_id: JobCardId, pause: bool) -> Result<bool, FieldworkError> {
        let found = self.job_cards.set_job_card_paused(job_card_id, pause).await?;
        if found {
            info!(job_card_id = %job_card_id, paused = pause, "job card pause flag set");
        }
        Ok(found)
    }

    /// Record whether a job card has been paid. Renewals are not touched.
    ///
    /// Returns `false` when the job card does not exist.
    pub async fn update_payment_status(
        &self,
        job_card_id: JobCardId,
        status: PaymentStatus,
    ) -> Result<bool, FieldworkError> {
        let found = self
            .job_cards
            .set_job_card_payment_status(job_card_id, status)
            .await?;
        if found {
            info!(job_card_id = %job_card_id, payment_status = %status, "job card payment status set");
        }
        Ok(found)
    }
}
