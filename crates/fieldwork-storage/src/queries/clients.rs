// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client CRUD operations.
//!
//! The `mobile` column carries a UNIQUE index; it is the arbiter when two
//! callers race to create the same client.

use fieldwork_core::FieldworkError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, is_unique_violation, map_tr_err};
use crate::models::{Client, ClientId, NewClient};

const SELECT_CLIENT: &str = "SELECT id, full_name, mobile, email, city, address, notes, \
     is_active, created_at, updated_at FROM clients";

fn row_to_client(row: &rusqlite::Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: ClientId(row.get(0)?),
        full_name: row.get(1)?,
        mobile: row.get(2)?,
        email: row.get(3)?,
        city: row.get(4)?,
        address: row.get(5)?,
        notes: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn select_by_id(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Client>> {
    conn.query_row(
        &format!("{SELECT_CLIENT} WHERE id = ?1"),
        params![id],
        row_to_client,
    )
    .optional()
}

/// Insert a client. A duplicate mobile yields `FieldworkError::UniqueViolation`.
pub async fn insert_client(db: &Database, client: &NewClient) -> Result<Client, FieldworkError> {
    let client = client.clone();
    let mobile = client.mobile.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<Option<Client>, rusqlite::Error> {
            let result = conn.execute(
                "INSERT INTO clients (full_name, mobile, email, city, address, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    client.full_name,
                    client.mobile,
                    client.email,
                    client.city,
                    client.address,
                    client.notes,
                ],
            );
            match result {
                Ok(_) => {
                    let id = conn.last_insert_rowid();
                    select_by_id(conn, id)
                }
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    inserted.ok_or(FieldworkError::UniqueViolation {
        entity: "client",
        key: mobile,
    })
}

/// Look up a client by normalized mobile number, active or not.
pub async fn find_client_by_mobile(
    db: &Database,
    mobile: &str,
) -> Result<Option<Client>, FieldworkError> {
    let mobile = mobile.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("{SELECT_CLIENT} WHERE mobile = ?1"),
                params![mobile],
                row_to_client,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_client(db: &Database, id: ClientId) -> Result<Option<Client>, FieldworkError> {
    db.connection()
        .call(move |conn| select_by_id(conn, id.0))
        .await
        .map_err(map_tr_err)
}

/// All clients ordered by id.
pub async fn list_clients(db: &Database) -> Result<Vec<Client>, FieldworkError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_CLIENT} ORDER BY id"))?;
            let rows = stmt.query_map([], row_to_client)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Flip the active flag. Returns `false` when the client does not exist.
pub async fn set_client_active(
    db: &Database,
    id: ClientId,
    active: bool,
) -> Result<bool, FieldworkError> {
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE clients SET is_active = ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![active, id.0],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}

/// Rewrite a client's stored mobile number.
pub async fn update_client_mobile(
    db: &Database,
    id: ClientId,
    mobile: &str,
) -> Result<(), FieldworkError> {
    let mobile = mobile.to_string();
    let key = mobile.clone();
    let changed = db
        .connection()
        .call(move |conn| -> Result<Option<usize>, rusqlite::Error> {
            let result = conn.execute(
                "UPDATE clients SET mobile = ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![mobile, id.0],
            );
            match result {
                Ok(n) => Ok(Some(n)),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    match changed {
        None => Err(FieldworkError::UniqueViolation {
            entity: "client",
            key,
        }),
        Some(0) => Err(FieldworkError::NotFound {
            entity: "client",
            id: id.0,
        }),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_client(mobile: &str) -> NewClient {
        NewClient {
            full_name: "Asha Patil".to_string(),
            mobile: mobile.to_string(),
            email: Some("asha@example.com".to_string()),
            city: "Pune".to_string(),
            address: Some("12 FC Road".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn insert_and_find_by_mobile() {
        let db = Database::open_in_memory().await.unwrap();
        let created = insert_client(&db, &new_client("9876543210")).await.unwrap();
        assert!(created.is_active);
        assert_eq!(created.city, "Pune");

        let found = find_client_by_mobile(&db, "9876543210")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, created);
        assert!(find_client_by_mobile(&db, "9000000000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_mobile_is_unique_violation() {
        let db = Database::open_in_memory().await.unwrap();
        insert_client(&db, &new_client("9876543210")).await.unwrap();

        let err = insert_client(&db, &new_client("9876543210"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation(), "got {err:?}");
        assert_eq!(list_clients(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deactivate_keeps_row() {
        let db = Database::open_in_memory().await.unwrap();
        let client = insert_client(&db, &new_client("9876543210")).await.unwrap();

        assert!(set_client_active(&db, client.id, false).await.unwrap());
        let reloaded = get_client(&db, client.id).await.unwrap().unwrap();
        assert!(!reloaded.is_active);
        assert!(!set_client_active(&db, ClientId(404), false).await.unwrap());
    }

    #[tokio::test]
    async fn update_mobile_respects_uniqueness() {
        let db = Database::open_in_memory().await.unwrap();
        let first = insert_client(&db, &new_client("9876543210")).await.unwrap();
        let second = insert_client(&db, &new_client("9123456780")).await.unwrap();

        let err = update_client_mobile(&db, second.id, "9876543210")
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        update_client_mobile(&db, first.id, "9000000001").await.unwrap();
        let reloaded = get_client(&db, first.id).await.unwrap().unwrap();
        assert_eq!(reloaded.mobile, "9000000001");

        let err = update_client_mobile(&db, ClientId(404), "9000000002")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
