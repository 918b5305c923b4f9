// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations.
//!
//! Each command runs one engine operation against an open [`Workspace`] and
//! returns its result as JSON for the caller to print.

use std::sync::Arc;

use fieldwork_config::FieldworkConfig;
use fieldwork_contracts::{ClientAttributes, ContractEngine};
use fieldwork_core::types::{JobCardId, PaymentStatus, RenewalId};
use fieldwork_core::{FieldworkError, StorageAdapter};
use fieldwork_storage::SqliteStorage;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

/// Storage plus an engine wired to it, closed together.
pub struct Workspace {
    storage: Arc<SqliteStorage>,
    engine: ContractEngine,
}

impl Workspace {
    /// Open the configured database, applying pending migrations.
    pub async fn open(config: &FieldworkConfig) -> Result<Self, FieldworkError> {
        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;
        let engine = ContractEngine::new(storage.clone(), config);
        Ok(Self { storage, engine })
    }

    pub async fn close(self) -> Result<(), FieldworkError> {
        self.storage.close().await
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, FieldworkError> {
    serde_json::to_value(value).map_err(|e| FieldworkError::Internal(e.to_string()))
}

/// Migrations already ran when the workspace was opened.
pub fn migrate(config: &FieldworkConfig) -> Result<Value, FieldworkError> {
    info!(database = %config.storage.database_path, "database migrated");
    Ok(json!({ "database_path": config.storage.database_path }))
}

pub async fn resolve_client(
    workspace: &Workspace,
    mobile: &str,
    name: &str,
    city: Option<String>,
) -> Result<Value, FieldworkError> {
    let attributes = ClientAttributes {
        full_name: name.to_string(),
        city,
        ..ClientAttributes::default()
    };
    let (client, created) = workspace.engine.resolver().resolve(mobile, &attributes).await?;
    Ok(json!({ "client": to_json(&client)?, "created": created }))
}

pub async fn reconcile(
    workspace: &Workspace,
    job_card_id: i64,
    force: bool,
) -> Result<Value, FieldworkError> {
    let renewals = workspace
        .engine
        .reconcile_job_card(JobCardId(job_card_id), force)
        .await?;
    to_json(&renewals)
}

pub async fn complete(workspace: &Workspace, ids: &[i64]) -> Result<Value, FieldworkError> {
    let ids: Vec<RenewalId> = ids.iter().copied().map(RenewalId).collect();
    let outcome = workspace.engine.actions().bulk_mark_completed(&ids).await;
    to_json(&outcome)
}

pub async fn pause(
    workspace: &Workspace,
    job_card_id: i64,
    resume: bool,
) -> Result<Value, FieldworkError> {
    let id = JobCardId(job_card_id);
    let paused = !resume;
    if !workspace.engine.actions().toggle_pause(id, paused).await? {
        return Err(FieldworkError::NotFound {
            entity: "job card",
            id: id.0,
        });
    }
    Ok(json!({ "job_card_id": id, "paused": paused }))
}

pub async fn payment(
    workspace: &Workspace,
    job_card_id: i64,
    status: &str,
) -> Result<Value, FieldworkError> {
    let status: PaymentStatus = status.trim().parse().map_err(|_| {
        FieldworkError::Validation(format!(
            "payment status must be `paid` or `unpaid`, got `{status}`"
        ))
    })?;
    let id = JobCardId(job_card_id);
    if !workspace.engine.actions().update_payment_status(id, status).await? {
        return Err(FieldworkError::NotFound {
            entity: "job card",
            id: id.0,
        });
    }
    Ok(json!({ "job_card_id": id, "payment_status": status }))
}

pub async fn audit_identifiers(workspace: &Workspace, fix: bool) -> Result<Value, FieldworkError> {
    if fix {
        let report = workspace.engine.repair_identifiers().await?;
        to_json(&report)
    } else {
        let audit = workspace.engine.audit_identifiers().await?;
        to_json(&audit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &tempfile::TempDir) -> FieldworkConfig {
        let mut config = FieldworkConfig::default();
        config.storage.database_path = dir.path().join("cli.db").to_string_lossy().into_owned();
        config
    }

    #[tokio::test]
    async fn migrate_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        Workspace::open(&config).await.unwrap().close().await.unwrap();
        let out = migrate(&config).unwrap();
        assert_eq!(out["database_path"], config.storage.database_path);
        assert!(dir.path().join("cli.db").exists());
    }

    #[tokio::test]
    async fn resolve_client_reports_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::open(&config(&dir)).await.unwrap();

        let first = resolve_client(&workspace, "98765 43210", "Asha", None).await.unwrap();
        assert_eq!(first["created"], true);
        assert_eq!(first["client"]["mobile"], "9876543210");
        assert_eq!(first["client"]["city"], "Unknown");

        let second = resolve_client(&workspace, "9876543210", "Someone", Some("Pune".into()))
            .await
            .unwrap();
        assert_eq!(second["created"], false);
        assert_eq!(second["client"]["id"], first["client"]["id"]);
        workspace.close().await.unwrap();
    }

    #[tokio::test]
    async fn resolve_client_rejects_bad_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::open(&config(&dir)).await.unwrap();
        let err = resolve_client(&workspace, "12ab", "Asha", None).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn missing_ids_surface_as_errors_or_failures() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::open(&config(&dir)).await.unwrap();

        assert!(reconcile(&workspace, 5, false).await.unwrap_err().is_not_found());
        assert!(pause(&workspace, 5, false).await.unwrap_err().is_not_found());

        let out = complete(&workspace, &[1, 2]).await.unwrap();
        assert_eq!(
            out,
            json!({"success_count": 0, "failure_count": 2, "failed_ids": [1, 2]})
        );
    }

    #[tokio::test]
    async fn payment_validates_status_then_job_card() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::open(&config(&dir)).await.unwrap();

        assert!(payment(&workspace, 1, "partial").await.unwrap_err().is_validation());
        assert!(payment(&workspace, 1, "paid").await.unwrap_err().is_not_found());

        let card = workspace
            .engine
            .lifecycle()
            .create_job_card(fieldwork_contracts::JobCardDraft {
                client: fieldwork_contracts::ClientRef::New {
                    identifier: "9000000002".into(),
                    attributes: ClientAttributes::default(),
                },
                category: fieldwork_core::types::JobCategory::OneTime,
                status: "Done".into(),
                service_type: "Rodent control".into(),
                schedule_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                technician_name: String::new(),
                price_subtotal_minor: 40_000,
                tax_percent: None,
                next_service_date: None,
                contract_duration_months: None,
                client_address: None,
                notes: None,
            })
            .await
            .unwrap()
            .job_card;
        let out = payment(&workspace, card.id.0, "Paid").await.unwrap();
        assert_eq!(out, json!({"job_card_id": card.id.0, "payment_status": "paid"}));
        workspace.close().await.unwrap();
    }

    #[tokio::test]
    async fn audit_on_empty_database_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::open(&config(&dir)).await.unwrap();

        let audit = audit_identifiers(&workspace, false).await.unwrap();
        assert_eq!(audit["scanned"], 0);
        let repair = audit_identifiers(&workspace, true).await.unwrap();
        assert_eq!(repair["fixed"], 0);
    }
}
