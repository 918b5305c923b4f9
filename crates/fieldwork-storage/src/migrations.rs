// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations using refinery.
//!
//! SQL files under `migrations/` are compiled in via `embed_migrations!` and
//! applied on every open; already-applied versions are skipped.

use fieldwork_core::FieldworkError;
use tracing::info;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied versions in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), FieldworkError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(FieldworkError::storage)?;
    let applied = report.applied_migrations();
    if !applied.is_empty() {
        info!(count = applied.len(), "applied schema migrations");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();

        let version: i64 = conn
            .query_row(
                "SELECT MAX(version) FROM refinery_schema_history",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, 2);
    }

    #[test]
    fn renewal_dedup_key_is_unique() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn.execute_batch(
            "INSERT INTO clients (full_name, mobile, city) VALUES ('A', '9876543210', 'Pune');
             INSERT INTO job_cards (client_id, category, status, service_type, schedule_date)
                 VALUES (1, 'recurring', 'WIP', 'Pest control', '2024-01-10');
             INSERT INTO renewals (job_card_id, due_date, renewal_type)
                 VALUES (1, '2024-02-10', 'monthly_reminder');",
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO renewals (job_card_id, due_date, renewal_type)
             VALUES (1, '2024-02-10', 'monthly_reminder')",
            [],
        );
        assert!(dup.is_err());

        // Same date, different type is a distinct obligation.
        conn.execute(
            "INSERT INTO renewals (job_card_id, due_date, renewal_type)
             VALUES (1, '2024-02-10', 'contract_end')",
            [],
        )
        .unwrap();
    }
}
