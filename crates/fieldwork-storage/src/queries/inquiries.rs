// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inquiry CRUD operations.

use fieldwork_core::FieldworkError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err, parse_tag};
use crate::models::{Inquiry, InquiryId, InquiryStatus, NewInquiry};

const SELECT_INQUIRY: &str = "SELECT id, name, mobile, email, message, service_interest, city, \
     status, created_at, updated_at FROM inquiries";

fn row_to_inquiry(row: &rusqlite::Row<'_>) -> rusqlite::Result<Inquiry> {
    Ok(Inquiry {
        id: InquiryId(row.get(0)?),
        name: row.get(1)?,
        mobile: row.get(2)?,
        email: row.get(3)?,
        message: row.get(4)?,
        service_interest: row.get(5)?,
        city: row.get(6)?,
        status: parse_tag(row, 7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Record a new inquiry in the `new` state.
pub async fn insert_inquiry(db: &Database, inquiry: &NewInquiry) -> Result<Inquiry, FieldworkError> {
    let inquiry = inquiry.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO inquiries (name, mobile, email, message, service_interest, city)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    inquiry.name,
                    inquiry.mobile,
                    inquiry.email,
                    inquiry.message,
                    inquiry.service_interest,
                    inquiry.city,
                ],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("{SELECT_INQUIRY} WHERE id = ?1"),
                params![id],
                row_to_inquiry,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_inquiry(db: &Database, id: InquiryId) -> Result<Option<Inquiry>, FieldworkError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("{SELECT_INQUIRY} WHERE id = ?1"),
                params![id.0],
                row_to_inquiry,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Move an inquiry to `status`. Returns `false` when it does not exist.
pub async fn set_inquiry_status(
    db: &Database,
    id: InquiryId,
    status: InquiryStatus,
) -> Result<bool, FieldworkError> {
    let status = status.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE inquiries SET status = ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![status, id.0],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}
