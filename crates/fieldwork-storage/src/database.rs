// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All reads and writes are serialized through tokio-rusqlite's single
//! background thread. The `Database` struct IS the single writer: query
//! modules accept `&Database` and go through `connection().call()`.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use fieldwork_config::model::StorageConfig;
use fieldwork_core::FieldworkError;
use tracing::debug;

use crate::migrations;

/// An open, migrated SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` with default settings.
    pub async fn open(path: &str) -> Result<Self, FieldworkError> {
        let config = StorageConfig {
            database_path: path.to_string(),
            ..StorageConfig::default()
        };
        Self::open_with(&config).await
    }

    /// Open the database described by `config` and apply pending migrations.
    pub async fn open_with(config: &StorageConfig) -> Result<Self, FieldworkError> {
        if let Some(parent) = Path::new(&config.database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(FieldworkError::storage)?;
            }
        }
        let conn = tokio_rusqlite::Connection::open(&config.database_path)
            .await
            .map_err(FieldworkError::storage)?;
        let db = Self { conn };
        db.prepare(
            config.wal_mode,
            Duration::from_millis(config.busy_timeout_ms),
        )
        .await?;
        debug!(path = %config.database_path, wal = config.wal_mode, "database opened");
        Ok(db)
    }

    /// Open a private in-memory database with the full schema applied.
    pub async fn open_in_memory() -> Result<Self, FieldworkError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(FieldworkError::storage)?;
        let db = Self { conn };
        db.prepare(false, Duration::from_millis(0)).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool, busy_timeout: Duration) -> Result<(), FieldworkError> {
        self.conn
            .call(
                move |conn| -> Result<Result<(), FieldworkError>, rusqlite::Error> {
                    conn.pragma_update(None, "foreign_keys", "ON")?;
                    conn.busy_timeout(busy_timeout)?;
                    if wal_mode {
                        let mode: String = conn.pragma_update_and_check(
                            None,
                            "journal_mode",
                            "WAL",
                            |row| row.get(0),
                        )?;
                        debug!(journal_mode = %mode, "journal mode set");
                    }
                    Ok(migrations::run_migrations(conn))
                },
            )
            .await
            .map_err(map_tr_err)?
    }

    /// The shared connection handle used by the query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), FieldworkError> {
        checkpoint(&self.conn).await?;
        self.conn.close().await.map_err(FieldworkError::storage)
    }
}

/// Fold the WAL back into the main database file.
pub(crate) async fn checkpoint(conn: &tokio_rusqlite::Connection) -> Result<(), FieldworkError> {
    conn.call(|conn| -> Result<(), rusqlite::Error> {
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)
}

/// Convert a tokio-rusqlite error into `FieldworkError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> FieldworkError {
    FieldworkError::Storage {
        source: Box::new(e),
    }
}

/// Whether an insert or update was rejected by a UNIQUE or PRIMARY KEY index.
///
/// Foreign-key and CHECK failures are deliberately excluded: they are faults,
/// not lost races.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Read a TEXT column holding a strum-encoded enum tag.
pub(crate) fn parse_tag<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_schema() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("open.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        assert!(db_path.exists());

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' \
                     AND name IN ('clients', 'inquiries', 'job_cards', 'renewals') ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .unwrap();
        assert_eq!(tables, vec!["clients", "inquiries", "job_cards", "renewals"]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reopening_does_not_rerun_migrations() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let path = db_path.to_str().unwrap();

        Database::open(path).await.unwrap().close().await.unwrap();
        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("data").join("fw.db");
        Database::open(db_path.to_str().unwrap())
            .await
            .unwrap()
            .close()
            .await
            .unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn wal_mode_is_enabled_by_default() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("wal.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let mode: String = db
            .connection()
            .call(|conn| -> Result<String, rusqlite::Error> {
                conn.query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let db = Database::open_in_memory().await.unwrap();
        let result = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO renewals (job_card_id, due_date, renewal_type) \
                     VALUES (999, '2024-01-01', 'contract_end')",
                    [],
                )?;
                Ok(())
            })
            .await;
        let err = match result {
            Err(tokio_rusqlite::Error::Error(e)) => e,
            other => panic!("expected a rusqlite error, got {other:?}"),
        };
        assert!(!is_unique_violation(&err), "FK failure is not a lost race");
    }
}
