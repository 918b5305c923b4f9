// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Fieldwork service-contract engine.
//!
//! This crate provides the store trait definitions, error types, and domain
//! types used throughout the Fieldwork workspace. The SQLite backend and any
//! test doubles implement the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::FieldworkError;
pub use types::{ClientId, InquiryId, JobCardId, RenewalId};

pub use traits::{IdentityStore, InquiryStore, JobCardStore, RenewalStore, StorageAdapter};
