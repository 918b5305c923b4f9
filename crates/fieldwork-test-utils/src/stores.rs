// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Renewal store wrappers for fault injection and call recording.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;

use fieldwork_core::types::{
    JobCardId, NewRenewal, Renewal, RenewalId, RenewalStatus, RenewalType,
};
use fieldwork_core::{FieldworkError, RenewalStore};

/// A renewal store that fails every call with a storage error.
///
/// Used to prove that job card writes survive a broken scheduling path.
#[derive(Debug, Default)]
pub struct FailingRenewalStore {
    calls: AtomicUsize,
}

impl FailingRenewalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls attempted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self, op: &str) -> Result<T, FieldworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FieldworkError::storage(std::io::Error::other(format!(
            "injected renewal store failure in {op}"
        ))))
    }
}

#[async_trait]
impl RenewalStore for FailingRenewalStore {
    async fn find_renewal(
        &self,
        _job_card_id: JobCardId,
        _due_date: NaiveDate,
        _renewal_type: RenewalType,
    ) -> Result<Option<Renewal>, FieldworkError> {
        self.fail("find_renewal")
    }

    async fn insert_renewal(&self, _renewal: &NewRenewal) -> Result<Renewal, FieldworkError> {
        self.fail("insert_renewal")
    }

    async fn list_renewals_for_job_card(
        &self,
        _job_card_id: JobCardId,
    ) -> Result<Vec<Renewal>, FieldworkError> {
        self.fail("list_renewals_for_job_card")
    }

    async fn get_renewal(&self, _id: RenewalId) -> Result<Option<Renewal>, FieldworkError> {
        self.fail("get_renewal")
    }

    async fn set_renewal_status(
        &self,
        _id: RenewalId,
        _status: RenewalStatus,
    ) -> Result<bool, FieldworkError> {
        self.fail("set_renewal_status")
    }
}

/// Pass-through renewal store that counts calls.
///
/// Every reconcile starts with exactly one `list_renewals_for_job_card`, so
/// [`list_calls`](Self::list_calls) counts reconcile invocations.
pub struct RecordingRenewalStore {
    inner: Arc<dyn RenewalStore>,
    list_calls: AtomicUsize,
    inserts: AtomicUsize,
}

impl RecordingRenewalStore {
    pub fn new(inner: Arc<dyn RenewalStore>) -> Self {
        Self {
            inner,
            list_calls: AtomicUsize::new(0),
            inserts: AtomicUsize::new(0),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Successful inserts only.
    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.list_calls.store(0, Ordering::SeqCst);
        self.inserts.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl RenewalStore for RecordingRenewalStore {
    async fn find_renewal(
        &self,
        job_card_id: JobCardId,
        due_date: NaiveDate,
        renewal_type: RenewalType,
    ) -> Result<Option<Renewal>, FieldworkError> {
        self.inner
            .find_renewal(job_card_id, due_date, renewal_type)
            .await
    }

    async fn insert_renewal(&self, renewal: &NewRenewal) -> Result<Renewal, FieldworkError> {
        let inserted = self.inner.insert_renewal(renewal).await?;
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(inserted)
    }

    async fn list_renewals_for_job_card(
        &self,
        job_card_id: JobCardId,
    ) -> Result<Vec<Renewal>, FieldworkError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_renewals_for_job_card(job_card_id).await
    }

    async fn get_renewal(&self, id: RenewalId) -> Result<Option<Renewal>, FieldworkError> {
        self.inner.get_renewal(id).await
    }

    async fn set_renewal_status(
        &self,
        id: RenewalId,
        status: RenewalStatus,
    ) -> Result<bool, FieldworkError> {
        self.inner.set_renewal_status(id, status).await
    }
}
