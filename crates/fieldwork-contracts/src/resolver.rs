// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client identity resolution.
//!
//! `resolve` is a get-or-create keyed by the normalized contact identifier.
//! Exactly one client row exists per identifier no matter how many callers
//! race on it.

use std::sync::Arc;

use fieldwork_config::model::IdentityConfig;
use fieldwork_core::types::{Client, ClientId, NewClient};
use fieldwork_core::{FieldworkError, IdentityStore};
use serde::Deserialize;
use tracing::{debug, info};

use crate::get_or_create::get_or_create;
use crate::identifier::normalize_identifier;

/// Caller-supplied data used only when a new client has to be created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientAttributes {
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Falls back to the configured default city.
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Resolves raw contact data to a durable client.
pub struct ClientResolver {
    store: Arc<dyn IdentityStore>,
    identifier_digits: usize,
    default_city: String,
}

impl ClientResolver {
    pub fn new(store: Arc<dyn IdentityStore>, config: &IdentityConfig) -> Self {
        Self {
            store,
            identifier_digits: config.identifier_digits,
            default_city: config.default_city.clone(),
        }
    }

    pub fn identifier_digits(&self) -> usize {
        self.identifier_digits
    }

    /// Return the client owning `identifier`, creating it if needed.
    ///
    /// The boolean is `true` only for the call whose insert won. An existing
    /// client is returned unchanged; `attributes` never overwrite it.
    pub async fn resolve(
        &self,
        identifier: &str,
        attributes: &ClientAttributes,
    ) -> Result<(Client, bool), FieldworkError> {
        let mobile = normalize_identifier(identifier, self.identifier_digits)?;
        let new_client = NewClient {
            full_name: attributes.full_name.trim().to_string(),
            mobile: mobile.clone(),
            email: attributes.email.clone(),
            city: attributes
                .city
                .as_deref()
                .map(str::trim)
                .filter(|city| !city.is_empty())
                .unwrap_or(&self.default_city)
                .to_string(),
            address: attributes.address.clone(),
            notes: attributes.notes.clone(),
        };

        let store = &*self.store;
        let mobile_ref = mobile.as_str();
        let new_ref = &new_client;
        let (client, created) = get_or_create(
            move || store.find_client_by_mobile(mobile_ref),
            move || store.insert_client(new_ref),
        )
        .await?;

        if created {
            info!(client_id = %client.id, "created client");
        } else {
            debug!(client_id = %client.id, "resolved existing client");
        }
        Ok((client, created))
    }

    /// Flag a client inactive. Returns `false` when the id is unknown.
    pub async fn deactivate(&self, id: ClientId) -> Result<bool, FieldworkError> {
        let changed = self.store.set_client_active(id, false).await?;
        if changed {
            info!(client_id = %id, "deactivated client");
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fieldwork_config::model::StorageConfig;
    use fieldwork_storage::{Database, SqliteStorage};
    use std::sync::atomic::{AtomicBool, Ordering};

    async fn sqlite() -> Arc<SqliteStorage> {
        let db = Database::open_in_memory().await.unwrap();
        Arc::new(SqliteStorage::from_database(StorageConfig::default(), db))
    }

    fn attrs(name: &str) -> ClientAttributes {
        ClientAttributes {
            full_name: name.to_string(),
            ..ClientAttributes::default()
        }
    }

    /// Misses the first lookup, as if another caller inserted right after it.
    struct StaleFirstLookup {
        inner: Arc<SqliteStorage>,
        stale: AtomicBool,
    }

    #[async_trait]
    impl IdentityStore for StaleFirstLookup {
        async fn find_client_by_mobile(&self, mobile: &str) -> Result<Option<Client>, FieldworkError> {
            if self.stale.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_client_by_mobile(mobile).await
        }
        async fn get_client(&self, id: ClientId) -> Result<Option<Client>, FieldworkError> {
            self.inner.get_client(id).await
        }
        async fn insert_client(&self, client: &NewClient) -> Result<Client, FieldworkError> {
            self.inner.insert_client(client).await
        }
        async fn list_clients(&self) -> Result<Vec<Client>, FieldworkError> {
            self.inner.list_clients().await
        }
        async fn set_client_active(&self, id: ClientId, active: bool) -> Result<bool, FieldworkError> {
            self.inner.set_client_active(id, active).await
        }
        async fn update_client_mobile(&self, id: ClientId, mobile: &str) -> Result<(), FieldworkError> {
            self.inner.update_client_mobile(id, mobile).await
        }
    }

    #[tokio::test]
    async fn creates_then_reuses() {
        let resolver = ClientResolver::new(sqlite().await, &IdentityConfig::default());

        let (first, created) = resolver.resolve("9876543210", &attrs("Asha")).await.unwrap();
        assert!(created);
        assert_eq!(first.city, "Unknown");

        let (second, created) = resolver
            .resolve("98765 43210", &attrs("Someone Else"))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.full_name, "Asha", "attributes must not overwrite");
    }

    #[tokio::test]
    async fn invalid_identifier_writes_nothing() {
        let store = sqlite().await;
        let resolver = ClientResolver::new(store.clone(), &IdentityConfig::default());

        let err = resolver.resolve("12345", &attrs("Short")).await.unwrap_err();
        assert!(matches!(err, FieldworkError::InvalidIdentifier { .. }));
        assert!(store.list_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lost_race_returns_winner_without_error() {
        let inner = sqlite().await;
        inner
            .insert_client(&NewClient {
                full_name: "Winner".into(),
                mobile: "9876543210".into(),
                email: None,
                city: "Pune".into(),
                address: None,
                notes: None,
            })
            .await
            .unwrap();
        let racing = Arc::new(StaleFirstLookup {
            inner: inner.clone(),
            stale: AtomicBool::new(true),
        });
        let resolver = ClientResolver::new(racing, &IdentityConfig::default());

        let (client, created) = resolver.resolve("9876543210", &attrs("Loser")).await.unwrap();
        assert!(!created);
        assert_eq!(client.full_name, "Winner");
        assert_eq!(inner.list_clients().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn explicit_city_and_default_city() {
        let config = IdentityConfig {
            default_city: "Nagpur".into(),
            ..IdentityConfig::default()
        };
        let resolver = ClientResolver::new(sqlite().await, &config);

        let (defaulted, _) = resolver.resolve("9000000001", &attrs("A")).await.unwrap();
        assert_eq!(defaulted.city, "Nagpur");

        let with_city = ClientAttributes {
            city: Some("Aurangabad".into()),
            ..attrs("B")
        };
        let (explicit, _) = resolver.resolve("9000000002", &with_city).await.unwrap();
        assert_eq!(explicit.city, "Aurangabad");
    }

    #[tokio::test]
    async fn deactivate_keeps_identity() {
        let resolver = ClientResolver::new(sqlite().await, &IdentityConfig::default());
        let (client, _) = resolver.resolve("9876543210", &attrs("Asha")).await.unwrap();

        assert!(resolver.deactivate(client.id).await.unwrap());
        assert!(!resolver.deactivate(ClientId(404)).await.unwrap());

        let (again, created) = resolver.resolve("9876543210", &attrs("Asha")).await.unwrap();
        assert!(!created);
        assert_eq!(again.id, client.id);
        assert!(!again.is_active);
    }
}
