// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store traits, the storage layer, and the engine.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

row_id!(
    /// Durable key of a client row.
    ClientId
);
row_id!(
    /// Durable key of an inquiry row.
    InquiryId
);
row_id!(
    /// Durable key of a job card row.
    JobCardId
);
row_id!(
    /// Durable key of a renewal row.
    RenewalId
);

/// An identity record for a contact, keyed by its normalized mobile number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub full_name: String,
    /// Normalized contact identifier (digits only). Unique across all clients.
    pub mobile: String,
    pub email: Option<String>,
    pub city: String,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Column values for a client insert. `mobile` must already be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub full_name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub city: String,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Lifecycle of an inbound inquiry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    New,
    Contacted,
    Converted,
    Closed,
}

/// A prospective customer's request, prior to conversion into a job card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: InquiryId,
    pub name: String,
    /// Contact identifier as submitted; normalized only when converted.
    pub mobile: String,
    pub email: Option<String>,
    pub message: String,
    pub service_interest: String,
    pub city: String,
    pub status: InquiryStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInquiry {
    pub name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub message: String,
    pub service_interest: String,
    pub city: String,
}

/// Which of the two contract shapes a job card follows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobCategory {
    /// Single visit with an optional follow-up date (`next_service_date`).
    OneTime,
    /// Society/annual contract running `contract_duration_months` months.
    Recurring,
}

/// Whether a job card has been paid for. New job cards start unpaid.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

/// A work order tying a client to a service category and contract shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCard {
    pub id: JobCardId,
    /// Human-facing code, `JC-0001` style.
    pub code: String,
    pub client_id: ClientId,
    pub category: JobCategory,
    pub status: String,
    pub service_type: String,
    pub schedule_date: NaiveDate,
    pub technician_name: String,
    pub price_subtotal_minor: i64,
    pub tax_percent: u8,
    pub grand_total_minor: i64,
    pub next_service_date: Option<NaiveDate>,
    pub contract_duration_months: Option<i64>,
    pub client_address: Option<String>,
    pub notes: Option<String>,
    pub is_paused: bool,
    pub payment_status: PaymentStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// The subset of job card fields that drive renewal generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractFields {
    pub category: JobCategory,
    pub next_service_date: Option<NaiveDate>,
    pub contract_duration_months: Option<i64>,
}

impl JobCard {
    pub fn contract_fields(&self) -> ContractFields {
        ContractFields {
            category: self.category,
            next_service_date: self.next_service_date,
            contract_duration_months: self.contract_duration_months,
        }
    }

    /// Subtotal plus tax, with the tax amount rounded half-up to the minor unit.
    ///
    /// `None` when the total does not fit in an `i64`.
    pub fn compute_grand_total(price_subtotal_minor: i64, tax_percent: u8) -> Option<i64> {
        let tax = price_subtotal_minor
            .checked_mul(i64::from(tax_percent))?
            .checked_add(50)?
            / 100;
        price_subtotal_minor.checked_add(tax)
    }

    /// Whether the stored address is missing or whitespace.
    pub fn has_blank_address(&self) -> bool {
        self.client_address
            .as_deref()
            .is_none_or(|addr| addr.trim().is_empty())
    }
}

/// Column values for a job card insert. The code is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJobCard {
    pub client_id: ClientId,
    pub category: JobCategory,
    pub status: String,
    pub service_type: String,
    pub schedule_date: NaiveDate,
    pub technician_name: String,
    pub price_subtotal_minor: i64,
    pub tax_percent: u8,
    pub grand_total_minor: i64,
    pub next_service_date: Option<NaiveDate>,
    pub contract_duration_months: Option<i64>,
    pub client_address: Option<String>,
    pub notes: Option<String>,
}

/// Type tag of a renewal; half of the per-job-card dedup key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RenewalType {
    ContractEnd,
    MonthlyReminder,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RenewalStatus {
    Due,
    Completed,
}

/// A scheduled future obligation derived from a job card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Renewal {
    pub id: RenewalId,
    pub job_card_id: JobCardId,
    pub due_date: NaiveDate,
    pub renewal_type: RenewalType,
    pub status: RenewalStatus,
    pub remarks: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Renewal {
    /// The `(due_date, renewal_type)` pair that must be unique per job card.
    pub fn dedup_key(&self) -> (NaiveDate, RenewalType) {
        (self.due_date, self.renewal_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRenewal {
    pub job_card_id: JobCardId,
    pub due_date: NaiveDate,
    pub renewal_type: RenewalType,
    pub remarks: Option<String>,
}
