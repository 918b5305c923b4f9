// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit and repair of stored client identifiers.
//!
//! Rows written before normalization was enforced may hold separators, or
//! two rows may collapse to the same identifier once normalized. The audit
//! reports both; the repair rewrites only rows that can be fixed without
//! creating a collision.

use std::collections::BTreeMap;

use fieldwork_core::types::{Client, ClientId};
use fieldwork_core::{FieldworkError, IdentityStore};
use serde::Serialize;
use tracing::{info, warn};

use crate::identifier::{is_normalized, normalize_identifier};

/// Clients that share one normalized identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub identifier: String,
    pub client_ids: Vec<ClientId>,
}

/// A client whose stored identifier is not in normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnnormalizedClient {
    pub client_id: ClientId,
    pub stored: String,
    /// `None` when the stored value cannot be normalized at all.
    pub normalized: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentifierAudit {
    pub scanned: usize,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub unnormalized: Vec<UnnormalizedClient>,
}

impl IdentifierAudit {
    pub fn is_clean(&self) -> bool {
        self.duplicate_groups.is_empty() && self.unnormalized.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub fixed: usize,
    pub failed: usize,
    pub failed_ids: Vec<ClientId>,
}

fn build_audit(clients: &[Client], digits: usize) -> IdentifierAudit {
    let mut groups: BTreeMap<String, Vec<ClientId>> = BTreeMap::new();
    let mut unnormalized = Vec::new();

    for client in clients {
        let normalized = normalize_identifier(&client.mobile, digits).ok();
        if !is_normalized(&client.mobile, digits) {
            unnormalized.push(UnnormalizedClient {
                client_id: client.id,
                stored: client.mobile.clone(),
                normalized: normalized.clone(),
            });
        }
        let key = normalized.unwrap_or_else(|| client.mobile.clone());
        groups.entry(key).or_default().push(client.id);
    }

    IdentifierAudit {
        scanned: clients.len(),
        duplicate_groups: groups
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(identifier, client_ids)| DuplicateGroup {
                identifier,
                client_ids,
            })
            .collect(),
        unnormalized,
    }
}

/// Scan every client and report identifier problems.
pub async fn audit_identifiers(
    store: &dyn IdentityStore,
    digits: usize,
) -> Result<IdentifierAudit, FieldworkError> {
    let clients = store.list_clients().await?;
    let audit = build_audit(&clients, digits);
    info!(
        scanned = audit.scanned,
        duplicate_groups = audit.duplicate_groups.len(),
        unnormalized = audit.unnormalized.len(),
        "identifier audit complete"
    );
    Ok(audit)
}

/// Normalize stored identifiers where that cannot collide with another row.
///
/// Rows that cannot be normalized, or whose normalized form is shared with
/// another client, are counted as failed and left unchanged.
pub async fn repair_identifiers(
    store: &dyn IdentityStore,
    digits: usize,
) -> Result<RepairReport, FieldworkError> {
    let clients = store.list_clients().await?;
    let audit = build_audit(&clients, digits);
    let mut report = RepairReport::default();

    for entry in &audit.unnormalized {
        let fixable = entry.normalized.as_ref().filter(|normalized| {
            !audit
                .duplicate_groups
                .iter()
                .any(|group| &group.identifier == *normalized)
        });
        let result = match fixable {
            Some(normalized) => store.update_client_mobile(entry.client_id, normalized).await,
            None => Err(FieldworkError::Validation(format!(
                "identifier {:?} cannot be normalized without a collision",
                entry.stored
            ))),
        };
        match result {
            Ok(()) => report.fixed += 1,
            Err(err) => {
                warn!(client_id = %entry.client_id, error = %err, "identifier repair failed");
                report.failed += 1;
                report.failed_ids.push(entry.client_id);
            }
        }
    }

    info!(fixed = report.fixed, failed = report.failed, "identifier repair complete");
    Ok(report)
}
