// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Fieldwork integration tests.
//!
//! Provides a harness backed by a throwaway SQLite database and store
//! wrappers that inject faults or record calls, so engine behavior can be
//! asserted without mocking SQL.
//!
//! # Components
//!
//! - [`TestHarness`] - temp database, storage, and a fully wired engine
//! - [`FailingRenewalStore`] - renewal store whose every call errors
//! - [`RecordingRenewalStore`] - pass-through renewal store with call counters

pub mod harness;
pub mod stores;

pub use harness::TestHarness;
pub use stores::{FailingRenewalStore, RecordingRenewalStore};
