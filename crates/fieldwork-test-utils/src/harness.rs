// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete contract engine over a temp SQLite
//! database. The renewal store can be swapped for a failing or recording
//! wrapper to exercise the best-effort scheduling path.

use std::sync::Arc;

use chrono::NaiveDate;
use fieldwork_config::FieldworkConfig;
use fieldwork_config::model::StorageConfig;
use fieldwork_contracts::{ClientAttributes, ClientRef, ContractEngine, JobCardDraft, Stores};
use fieldwork_core::types::JobCategory;
use fieldwork_core::{FieldworkError, RenewalStore, StorageAdapter};
use fieldwork_storage::SqliteStorage;

use crate::stores::{FailingRenewalStore, RecordingRenewalStore};

enum RenewalOverride {
    None,
    Failing,
    Recording,
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: FieldworkConfig,
    renewals: RenewalOverride,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: FieldworkConfig::default(),
            renewals: RenewalOverride::None,
        }
    }

    /// Use a custom configuration. The storage section is replaced by the
    /// harness's temp database.
    pub fn with_config(mut self, config: FieldworkConfig) -> Self {
        self.config = config;
        self
    }

    /// Route every renewal store call to a store that always fails.
    pub fn with_failing_renewals(mut self) -> Self {
        self.renewals = RenewalOverride::Failing;
        self
    }

    /// Count renewal store calls while delegating to SQLite.
    pub fn with_recording_renewals(mut self) -> Self {
        self.renewals = RenewalOverride::Recording;
        self
    }

    /// Build the test harness, creating the temp database and engine.
    pub async fn build(self) -> Result<TestHarness, FieldworkError> {
        let temp_dir = tempfile::TempDir::new().map_err(FieldworkError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            ..config.storage
        };

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let mut recorder = None;
        let renewals: Arc<dyn RenewalStore> = match self.renewals {
            RenewalOverride::None => storage.clone(),
            RenewalOverride::Failing => Arc::new(FailingRenewalStore::new()),
            RenewalOverride::Recording => {
                let wrapped = Arc::new(RecordingRenewalStore::new(storage.clone()));
                recorder = Some(wrapped.clone());
                wrapped
            }
        };

        let stores = Stores::shared(storage.clone()).with_renewals(renewals);
        let engine = ContractEngine::from_stores(stores, &config);

        Ok(TestHarness {
            storage,
            engine,
            recorder,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment over a temp database.
pub struct TestHarness {
    /// SQLite storage (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// Engine wired to `storage`, or to the renewal override.
    pub engine: ContractEngine,
    /// Present when built with [`TestHarnessBuilder::with_recording_renewals`].
    pub recorder: Option<Arc<RecordingRenewalStore>>,
    pub config: FieldworkConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A recurring job card draft for a new client.
    pub fn recurring_draft(mobile: &str, schedule_date: NaiveDate, months: i64) -> JobCardDraft {
        JobCardDraft {
            client: ClientRef::New {
                identifier: mobile.to_string(),
                attributes: ClientAttributes {
                    full_name: format!("Client {mobile}"),
                    ..ClientAttributes::default()
                },
            },
            category: JobCategory::Recurring,
            status: "WIP".into(),
            service_type: "General pest control".into(),
            schedule_date,
            technician_name: String::new(),
            price_subtotal_minor: 100_000,
            tax_percent: None,
            next_service_date: None,
            contract_duration_months: Some(months),
            client_address: None,
            notes: None,
        }
    }

    /// A one-time job card draft for a new client.
    pub fn one_time_draft(
        mobile: &str,
        schedule_date: NaiveDate,
        service_date: NaiveDate,
    ) -> JobCardDraft {
        JobCardDraft {
            category: JobCategory::OneTime,
            next_service_date: Some(service_date),
            contract_duration_months: None,
            ..Self::recurring_draft(mobile, schedule_date, 1)
        }
    }
}
