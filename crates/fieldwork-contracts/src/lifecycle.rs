// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job card create/update orchestration.
//!
//! Identity and contract validation abort an operation before anything is
//! written. Renewal scheduling runs after the job card write has landed and
//! is best-effort: its failures are logged and never reach the caller.

use std::sync::Arc;

use chrono::NaiveDate;
use fieldwork_core::types::{
    Client, ContractFields, InquiryId, InquiryStatus, JobCard, JobCardId, JobCategory,
    NewJobCard,
};
use fieldwork_core::{ClientId, FieldworkError, IdentityStore, InquiryStore, JobCardStore};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::resolver::{ClientAttributes, ClientResolver};
use crate::schedule::{ContractSpec, ScheduleGenerator};

/// Status given to job cards created from an inquiry.
pub const CONVERTED_JOB_STATUS: &str = "Enquiry";

/// Who a new job card belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRef {
    /// A client whose durable key the caller already knows.
    Existing(ClientId),
    /// Raw contact data to run through the resolver.
    New {
        identifier: String,
        attributes: ClientAttributes,
    },
}

/// Input for [`LifecycleCoordinator::create_job_card`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCardDraft {
    pub client: ClientRef,
    pub category: JobCategory,
    pub status: String,
    pub service_type: String,
    pub schedule_date: NaiveDate,
    pub technician_name: String,
    pub price_subtotal_minor: i64,
    /// Defaults to `billing.default_tax_percent`.
    pub tax_percent: Option<u8>,
    pub next_service_date: Option<NaiveDate>,
    pub contract_duration_months: Option<i64>,
    pub client_address: Option<String>,
    pub notes: Option<String>,
}

/// Partial update of a job card.
///
/// `None` leaves a field untouched. For nullable columns `Some(None)` clears
/// the value explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobCardPatch {
    pub category: Option<JobCategory>,
    pub status: Option<String>,
    pub service_type: Option<String>,
    pub schedule_date: Option<NaiveDate>,
    pub technician_name: Option<String>,
    pub price_subtotal_minor: Option<i64>,
    pub tax_percent: Option<u8>,
    pub next_service_date: Option<Option<NaiveDate>>,
    pub contract_duration_months: Option<Option<i64>>,
    pub client_address: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

impl JobCardPatch {
    fn apply_to(&self, card: &mut JobCard) {
        if let Some(category) = self.category {
            card.category = category;
        }
        if let Some(status) = &self.status {
            card.status = status.clone();
        }
        if let Some(service_type) = &self.service_type {
            card.service_type = service_type.clone();
        }
        if let Some(schedule_date) = self.schedule_date {
            card.schedule_date = schedule_date;
        }
        if let Some(technician_name) = &self.technician_name {
            card.technician_name = technician_name.clone();
        }
        if let Some(subtotal) = self.price_subtotal_minor {
            card.price_subtotal_minor = subtotal;
        }
        if let Some(tax_percent) = self.tax_percent {
            card.tax_percent = tax_percent;
        }
        if let Some(next_service_date) = self.next_service_date {
            card.next_service_date = next_service_date;
        }
        if let Some(duration) = self.contract_duration_months {
            card.contract_duration_months = duration;
        }
        if let Some(address) = &self.client_address {
            card.client_address = address.clone();
        }
        if let Some(notes) = &self.notes {
            card.notes = notes.clone();
        }
    }
}

/// Job-side input when converting an inquiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InquiryConversion {
    pub schedule_date: NaiveDate,
    pub category: JobCategory,
    pub technician_name: String,
    pub price_subtotal_minor: i64,
    pub tax_percent: Option<u8>,
    pub next_service_date: Option<NaiveDate>,
    pub contract_duration_months: Option<i64>,
}

/// A persisted job card and whether its client was created by this call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobCardOutcome {
    #[serde(flatten)]
    pub job_card: JobCard,
    pub client_created: bool,
}

pub struct LifecycleCoordinator {
    resolver: Arc<ClientResolver>,
    scheduler: Arc<ScheduleGenerator>,
    identity: Arc<dyn IdentityStore>,
    job_cards: Arc<dyn JobCardStore>,
    inquiries: Arc<dyn InquiryStore>,
    scheduling_enabled: bool,
    default_tax_percent: u8,
}

impl LifecycleCoordinator {
    pub fn new(
        resolver: Arc<ClientResolver>,
        scheduler: Arc<ScheduleGenerator>,
        identity: Arc<dyn IdentityStore>,
        job_cards: Arc<dyn JobCardStore>,
        inquiries: Arc<dyn InquiryStore>,
    ) -> Self {
        Self {
            resolver,
            scheduler,
            identity,
            job_cards,
            inquiries,
            scheduling_enabled: true,
            default_tax_percent: 18,
        }
    }

    /// Turn automatic scheduling after writes on or off.
    pub fn with_scheduling(mut self, enabled: bool) -> Self {
        self.scheduling_enabled = enabled;
        self
    }

    pub fn with_default_tax_percent(mut self, tax_percent: u8) -> Self {
        self.default_tax_percent = tax_percent;
        self
    }

    /// Create a job card, resolving its client first when given raw data.
    pub async fn create_job_card(&self, draft: JobCardDraft) -> Result<JobCardOutcome, FieldworkError> {
        let tax_percent = draft.tax_percent.unwrap_or(self.default_tax_percent);
        let grand_total_minor = validate_billing(draft.price_subtotal_minor, tax_percent)?;
        if draft.service_type.trim().is_empty() {
            return Err(FieldworkError::Validation("service type is required".into()));
        }
        ContractSpec::from_fields(
            ContractFields {
                category: draft.category,
                next_service_date: draft.next_service_date,
                contract_duration_months: draft.contract_duration_months,
            },
            draft.schedule_date,
            self.scheduler.max_contract_months(),
        )?;

        let (client, client_created) = match &draft.client {
            ClientRef::Existing(id) => (self.existing_client(*id).await?, false),
            ClientRef::New {
                identifier,
                attributes,
            } => self.resolver.resolve(identifier, attributes).await?,
        };

        let client_address = match draft.client_address {
            Some(addr) if !addr.trim().is_empty() => Some(addr),
            _ => client.address.clone(),
        };

        let job_card = self
            .job_cards
            .insert_job_card(&NewJobCard {
                client_id: client.id,
                category: draft.category,
                status: draft.status,
                service_type: draft.service_type,
                schedule_date: draft.schedule_date,
                technician_name: draft.technician_name,
                price_subtotal_minor: draft.price_subtotal_minor,
                tax_percent,
                grand_total_minor,
                next_service_date: draft.next_service_date,
                contract_duration_months: draft.contract_duration_months,
                client_address,
                notes: draft.notes,
            })
            .await?;
        info!(
            job_card_id = %job_card.id,
            code = %job_card.code,
            client_id = %client.id,
            client_created,
            "created job card"
        );

        self.schedule_best_effort(&job_card).await;
        Ok(JobCardOutcome {
            job_card,
            client_created,
        })
    }

    /// Apply `patch` and reconcile renewals if a contract field changed.
    pub async fn update_job_card(
        &self,
        id: JobCardId,
        patch: JobCardPatch,
    ) -> Result<JobCard, FieldworkError> {
        let existing = self
            .job_cards
            .get_job_card(id)
            .await?
            .ok_or(FieldworkError::NotFound {
                entity: "job card",
                id: id.0,
            })?;

        let before = existing.contract_fields();
        let mut updated = existing.clone();
        patch.apply_to(&mut updated);
        updated.grand_total_minor =
            validate_billing(updated.price_subtotal_minor, updated.tax_percent)?;

        let contract_changed = updated.contract_fields() != before;
        if contract_changed || updated.schedule_date != existing.schedule_date {
            ContractSpec::from_job_card(&updated, self.scheduler.max_contract_months())?;
        }

        // An explicit clear (`Some(None)`) is left alone.
        if patch.client_address.is_none() && updated.has_blank_address() {
            if let Some(client) = self.identity.get_client(updated.client_id).await? {
                if client.address.is_some() {
                    debug!(job_card_id = %id, "filling blank address from client");
                    updated.client_address = client.address;
                }
            }
        }

        let saved = self.job_cards.update_job_card(&updated).await?;
        debug!(job_card_id = %id, contract_changed, "updated job card");

        if contract_changed {
            self.schedule_best_effort(&saved).await;
        }
        Ok(saved)
    }

    /// Create a job card from an inquiry and mark the inquiry converted.
    ///
    /// The client is resolved from the inquiry's contact data, so converting
    /// inquiries from a known number reuses that client.
    pub async fn convert_inquiry(
        &self,
        inquiry_id: InquiryId,
        conversion: InquiryConversion,
    ) -> Result<JobCardOutcome, FieldworkError> {
        let inquiry = self
            .inquiries
            .get_inquiry(inquiry_id)
            .await?
            .ok_or(FieldworkError::NotFound {
                entity: "inquiry",
                id: inquiry_id.0,
            })?;
        if inquiry.status == InquiryStatus::Converted {
            return Err(FieldworkError::Validation(format!(
                "inquiry {inquiry_id} is already converted"
            )));
        }

        let outcome = self
            .create_job_card(JobCardDraft {
                client: ClientRef::New {
                    identifier: inquiry.mobile.clone(),
                    attributes: ClientAttributes {
                        full_name: inquiry.name.clone(),
                        email: inquiry.email.clone(),
                        city: Some(inquiry.city.clone()),
                        ..ClientAttributes::default()
                    },
                },
                category: conversion.category,
                status: CONVERTED_JOB_STATUS.to_string(),
                service_type: inquiry.service_interest.clone(),
                schedule_date: conversion.schedule_date,
                technician_name: conversion.technician_name,
                price_subtotal_minor: conversion.price_subtotal_minor,
                tax_percent: conversion.tax_percent,
                next_service_date: conversion.next_service_date,
                contract_duration_months: conversion.contract_duration_months,
                client_address: None,
                notes: Some(inquiry.message.clone()),
            })
            .await?;

        self.inquiries
            .set_inquiry_status(inquiry_id, InquiryStatus::Converted)
            .await?;
        info!(
            inquiry_id = %inquiry_id,
            job_card_id = %outcome.job_card.id,
            "converted inquiry"
        );
        Ok(outcome)
    }

    async fn existing_client(&self, id: ClientId) -> Result<Client, FieldworkError> {
        self.identity
            .get_client(id)
            .await?
            .ok_or(FieldworkError::NotFound {
                entity: "client",
                id: id.0,
            })
    }

    async fn schedule_best_effort(&self, card: &JobCard) {
        if !self.scheduling_enabled {
            debug!(job_card_id = %card.id, "scheduling disabled");
            return;
        }
        match self.scheduler.reconcile(card, false).await {
            Ok(renewals) => {
                debug!(job_card_id = %card.id, renewals = renewals.len(), "schedule reconciled");
            }
            Err(err) => {
                warn!(
                    job_card_id = %card.id,
                    error = %err,
                    "renewal scheduling failed, job card kept"
                );
            }
        }
    }
}

/// Check the billing inputs and return the grand total they produce.
fn validate_billing(price_subtotal_minor: i64, tax_percent: u8) -> Result<i64, FieldworkError> {
    if price_subtotal_minor < 0 {
        return Err(FieldworkError::Validation(
            "price subtotal must not be negative".into(),
        ));
    }
    if tax_percent > 100 {
        return Err(FieldworkError::Validation(format!(
            "tax percent must be at most 100, got {tax_percent}"
        )));
    }
    JobCard::compute_grand_total(price_subtotal_minor, tax_percent).ok_or_else(|| {
        FieldworkError::Validation(format!(
            "grand total for subtotal {price_subtotal_minor} at {tax_percent}% does not fit"
        ))
    })
}
