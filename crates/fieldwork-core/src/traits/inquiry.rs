// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable storage of inbound inquiries.

use async_trait::async_trait;

use crate::error::FieldworkError;
use crate::types::{Inquiry, InquiryId, InquiryStatus, NewInquiry};

#[async_trait]
pub trait InquiryStore: Send + Sync {
    async fn insert_inquiry(&self, inquiry: &NewInquiry) -> Result<Inquiry, FieldworkError>;

    async fn get_inquiry(&self, id: InquiryId) -> Result<Option<Inquiry>, FieldworkError>;

    /// Returns false if the inquiry does not exist.
    async fn set_inquiry_status(
        &self,
        id: InquiryId,
        status: InquiryStatus,
    ) -> Result<bool, FieldworkError>;
}
