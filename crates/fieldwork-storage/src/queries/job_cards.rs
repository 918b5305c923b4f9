// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job card CRUD operations.

use fieldwork_core::FieldworkError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err, parse_tag};
use crate::models::{ClientId, JobCard, JobCardId, NewJobCard, PaymentStatus};

const SELECT_JOB_CARD: &str = "SELECT id, code, client_id, category, status, service_type, \
     schedule_date, technician_name, price_subtotal_minor, tax_percent, grand_total_minor, \
     next_service_date, contract_duration_months, client_address, notes, is_paused, \
     payment_status, created_at, updated_at FROM job_cards";

fn row_to_job_card(row: &rusqlite::Row<'_>) -> rusqlite::Result<JobCard> {
    Ok(JobCard {
        id: JobCardId(row.get(0)?),
        code: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        client_id: ClientId(row.get(2)?),
        category: parse_tag(row, 3)?,
        status: row.get(4)?,
        service_type: row.get(5)?,
        schedule_date: row.get(6)?,
        technician_name: row.get(7)?,
        price_subtotal_minor: row.get(8)?,
        tax_percent: row.get(9)?,
        grand_total_minor: row.get(10)?,
        next_service_date: row.get(11)?,
        contract_duration_months: row.get(12)?,
        client_address: row.get(13)?,
        notes: row.get(14)?,
        is_paused: row.get(15)?,
        payment_status: parse_tag(row, 16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

fn select_by_id(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<JobCard>> {
    conn.query_row(
        &format!("{SELECT_JOB_CARD} WHERE id = ?1"),
        params![id],
        row_to_job_card,
    )
    .optional()
}

/// Human-facing code derived from the row id.
pub fn job_card_code(id: i64) -> String {
    format!("JC-{id:04}")
}

/// Insert a job card and assign its `JC-NNNN` code in the same transaction.
pub async fn insert_job_card(db: &Database, card: &NewJobCard) -> Result<JobCard, FieldworkError> {
    let card = card.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<Option<JobCard>, rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO job_cards (client_id, category, status, service_type, schedule_date,
                     technician_name, price_subtotal_minor, tax_percent, grand_total_minor,
                     next_service_date, contract_duration_months, client_address, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    card.client_id.0,
                    card.category.to_string(),
                    card.status,
                    card.service_type,
                    card.schedule_date,
                    card.technician_name,
                    card.price_subtotal_minor,
                    card.tax_percent,
                    card.grand_total_minor,
                    card.next_service_date,
                    card.contract_duration_months,
                    card.client_address,
                    card.notes,
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.execute(
                "UPDATE job_cards SET code = ?1 WHERE id = ?2",
                params![job_card_code(id), id],
            )?;
            let row = select_by_id(&tx, id)?;
            tx.commit()?;
            Ok(row)
        })
        .await
        .map_err(map_tr_err)?;

    inserted.ok_or_else(|| FieldworkError::Internal("inserted job card vanished".to_string()))
}

pub async fn get_job_card(db: &Database, id: JobCardId) -> Result<Option<JobCard>, FieldworkError> {
    db.connection()
        .call(move |conn| select_by_id(conn, id.0))
        .await
        .map_err(map_tr_err)
}

/// Persist every mutable column of `card` and return the stored row.
///
/// `id`, `code`, `payment_status`, and `created_at` are never rewritten.
pub async fn update_job_card(db: &Database, card: &JobCard) -> Result<JobCard, FieldworkError> {
    let card = card.clone();
    let id = card.id;
    let updated = db
        .connection()
        .call(move |conn| -> Result<Option<JobCard>, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE job_cards SET client_id = ?1, category = ?2, status = ?3,
                     service_type = ?4, schedule_date = ?5, technician_name = ?6,
                     price_subtotal_minor = ?7, tax_percent = ?8, grand_total_minor = ?9,
                     next_service_date = ?10, contract_duration_months = ?11,
                     client_address = ?12, notes = ?13, is_paused = ?14,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?15",
                params![
                    card.client_id.0,
                    card.category.to_string(),
                    card.status,
                    card.service_type,
                    card.schedule_date,
                    card.technician_name,
                    card.price_subtotal_minor,
                    card.tax_percent,
                    card.grand_total_minor,
                    card.next_service_date,
                    card.contract_duration_months,
                    card.client_address,
                    card.notes,
                    card.is_paused,
                    card.id.0,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_by_id(conn, card.id.0)
        })
        .await
        .map_err(map_tr_err)?;

    updated.ok_or(FieldworkError::NotFound {
        entity: "job card",
        id: id.0,
    })
}

/// Set the pause flag. Returns `false` when the job card does not exist.
pub async fn set_job_card_paused(
    db: &Database,
    id: JobCardId,
    paused: bool,
) -> Result<bool, FieldworkError> {
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE job_cards SET is_paused = ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![paused, id.0],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}

/// Set the payment status. Returns `false` when the job card does not exist.
pub async fn set_job_card_payment_status(
    db: &Database,
    id: JobCardId,
    status: PaymentStatus,
) -> Result<bool, FieldworkError> {
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE job_cards SET payment_status = ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![status.to_string(), id.0],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}
