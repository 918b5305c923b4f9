// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage and entity store traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::OnceCell;
use tracing::debug;

use fieldwork_config::model::StorageConfig;
use fieldwork_core::types::{
    Client, ClientId, Inquiry, InquiryId, InquiryStatus, JobCard, JobCardId, NewClient,
    NewInquiry, NewJobCard, NewRenewal, PaymentStatus, Renewal, RenewalId, RenewalStatus,
    RenewalType,
};
use fieldwork_core::{
    FieldworkError, IdentityStore, InquiryStore, JobCardStore, RenewalStore, StorageAdapter,
};

use crate::database::{self, Database};
use crate::queries;

/// SQLite-backed storage.
///
/// Wraps a [`Database`] handle and delegates every store operation to the
/// typed query modules. The database is opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: StorageAdapter::initialize
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already-open database; `initialize` will then fail.
    pub fn from_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Returns the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, FieldworkError> {
        self.db.get().ok_or_else(|| FieldworkError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), FieldworkError> {
        let db = Database::open_with(&self.config).await?;
        self.db.set(db).map_err(|_| FieldworkError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), FieldworkError> {
        let db = self.database()?;
        database::checkpoint(db.connection()).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for SqliteStorage {
    async fn find_client_by_mobile(&self, mobile: &str) -> Result<Option<Client>, FieldworkError> {
        queries::clients::find_client_by_mobile(self.database()?, mobile).await
    }

    async fn get_client(&self, id: ClientId) -> Result<Option<Client>, FieldworkError> {
        queries::clients::get_client(self.database()?, id).await
    }

    async fn insert_client(&self, client: &NewClient) -> Result<Client, FieldworkError> {
        queries::clients::insert_client(self.database()?, client).await
    }

    async fn list_clients(&self) -> Result<Vec<Client>, FieldworkError> {
        queries::clients::list_clients(self.database()?).await
    }

    async fn set_client_active(&self, id: ClientId, active: bool) -> Result<bool, FieldworkError> {
        queries::clients::set_client_active(self.database()?, id, active).await
    }

    async fn update_client_mobile(&self, id: ClientId, mobile: &str) -> Result<(), FieldworkError> {
        queries::clients::update_client_mobile(self.database()?, id, mobile).await
    }
}

#[async_trait]
impl InquiryStore for SqliteStorage {
    async fn insert_inquiry(&self, inquiry: &NewInquiry) -> Result<Inquiry, FieldworkError> {
        queries::inquiries::insert_inquiry(self.database()?, inquiry).await
    }

    async fn get_inquiry(&self, id: InquiryId) -> Result<Option<Inquiry>, FieldworkError> {
        queries::inquiries::get_inquiry(self.database()?, id).await
    }

    async fn set_inquiry_status(
        &self,
        id: InquiryId,
        status: InquiryStatus,
    ) -> Result<bool, FieldworkError> {
        queries::inquiries::set_inquiry_status(self.database()?, id, status).await
    }
}

#[async_trait]
impl JobCardStore for SqliteStorage {
    async fn insert_job_card(&self, job_card: &NewJobCard) -> Result<JobCard, FieldworkError> {
        queries::job_cards::insert_job_card(self.database()?, job_card).await
    }

    async fn get_job_card(&self, id: JobCardId) -> Result<Option<JobCard>, FieldworkError> {
        queries::job_cards::get_job_card(self.database()?, id).await
    }

    async fn update_job_card(&self, job_card: &JobCard) -> Result<JobCard, FieldworkError> {
        queries::job_cards::update_job_card(self.database()?, job_card).await
    }

    async fn set_job_card_paused(&self, id: JobCardId, paused: bool) -> Result<bool, FieldworkError> {
        queries::job_cards::set_job_card_paused(self.database()?, id, paused).await
    }

    async fn set_job_card_payment_status(
        &self,
        id: JobCardId,
        status: PaymentStatus,
    ) -> Result<bool, FieldworkError> {
        queries::job_cards::set_job_card_payment_status(self.database()?, id, status).await
    }
}

#[async_trait]
impl RenewalStore for SqliteStorage {
    async fn find_renewal(
        &self,
        job_card_id: JobCardId,
        due_date: NaiveDate,
        renewal_type: RenewalType,
    ) -> Result<Option<Renewal>, FieldworkError> {
        queries::renewals::find_renewal(self.database()?, job_card_id, due_date, renewal_type).await
    }

    async fn insert_renewal(&self, renewal: &NewRenewal) -> Result<Renewal, FieldworkError> {
        queries::renewals::insert_renewal(self.database()?, renewal).await
    }

    async fn list_renewals_for_job_card(
        &self,
        job_card_id: JobCardId,
    ) -> Result<Vec<Renewal>, FieldworkError> {
        queries::renewals::list_renewals_for_job_card(self.database()?, job_card_id).await
    }

    async fn get_renewal(&self, id: RenewalId) -> Result<Option<Renewal>, FieldworkError> {
        queries::renewals::get_renewal(self.database()?, id).await
    }

    async fn set_renewal_status(
        &self,
        id: RenewalId,
        status: RenewalStatus,
    ) -> Result<bool, FieldworkError> {
        queries::renewals::set_renewal_status(self.database()?, id, status).await
    }
}
