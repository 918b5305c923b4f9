// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Renewal CRUD operations.
//!
//! `(job_card_id, due_date, renewal_type)` is UNIQUE, so concurrent
//! reconciliations of the same job card cannot both insert an obligation.

use chrono::NaiveDate;
use fieldwork_core::FieldworkError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, is_unique_violation, map_tr_err, parse_tag};
use crate::models::{JobCardId, NewRenewal, Renewal, RenewalId, RenewalStatus, RenewalType};

const SELECT_RENEWAL: &str = "SELECT id, job_card_id, due_date, renewal_type, status, remarks, \
     created_at, updated_at FROM renewals";

fn row_to_renewal(row: &rusqlite::Row<'_>) -> rusqlite::Result<Renewal> {
    Ok(Renewal {
        id: RenewalId(row.get(0)?),
        job_card_id: JobCardId(row.get(1)?),
        due_date: row.get(2)?,
        renewal_type: parse_tag(row, 3)?,
        status: parse_tag(row, 4)?,
        remarks: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Find the renewal occupying a dedup key, if any.
pub async fn find_renewal(
    db: &Database,
    job_card_id: JobCardId,
    due_date: NaiveDate,
    renewal_type: RenewalType,
) -> Result<Option<Renewal>, FieldworkError> {
    let renewal_type = renewal_type.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "{SELECT_RENEWAL} WHERE job_card_id = ?1 AND due_date = ?2 AND renewal_type = ?3"
                ),
                params![job_card_id.0, due_date, renewal_type],
                row_to_renewal,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a `due` renewal. An occupied dedup key yields `UniqueViolation`.
pub async fn insert_renewal(db: &Database, renewal: &NewRenewal) -> Result<Renewal, FieldworkError> {
    let renewal = renewal.clone();
    let key = format!(
        "{}/{}/{}",
        renewal.job_card_id, renewal.due_date, renewal.renewal_type
    );
    let inserted = db
        .connection()
        .call(move |conn| -> Result<Option<Renewal>, rusqlite::Error> {
            let result = conn.execute(
                "INSERT INTO renewals (job_card_id, due_date, renewal_type, remarks)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    renewal.job_card_id.0,
                    renewal.due_date,
                    renewal.renewal_type.to_string(),
                    renewal.remarks,
                ],
            );
            match result {
                Ok(_) => {
                    let id = conn.last_insert_rowid();
                    conn.query_row(
                        &format!("{SELECT_RENEWAL} WHERE id = ?1"),
                        params![id],
                        row_to_renewal,
                    )
                    .map(Some)
                }
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    inserted.ok_or(FieldworkError::UniqueViolation {
        entity: "renewal",
        key,
    })
}

/// All renewals of a job card, earliest first; ties ordered by type.
pub async fn list_renewals_for_job_card(
    db: &Database,
    job_card_id: JobCardId,
) -> Result<Vec<Renewal>, FieldworkError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_RENEWAL} WHERE job_card_id = ?1 ORDER BY due_date, renewal_type"
            ))?;
            let rows = stmt.query_map(params![job_card_id.0], row_to_renewal)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_renewal(db: &Database, id: RenewalId) -> Result<Option<Renewal>, FieldworkError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("{SELECT_RENEWAL} WHERE id = ?1"),
                params![id.0],
                row_to_renewal,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Set a renewal's status. Returns `false` when it does not exist.
pub async fn set_renewal_status(
    db: &Database,
    id: RenewalId,
    status: RenewalStatus,
) -> Result<bool, FieldworkError> {
    let status = status.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE renewals SET status = ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![status, id.0],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}
