// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types live in `fieldwork-core::types` so they can cross the
//! store trait boundaries; they are re-exported here for the query modules.

pub use fieldwork_core::types::{
    Client, ClientId, Inquiry, InquiryId, InquiryStatus, JobCard, JobCardId, JobCategory,
    NewClient, NewInquiry, NewJobCard, NewRenewal, PaymentStatus, Renewal, RenewalId,
    RenewalStatus, RenewalType,
};
