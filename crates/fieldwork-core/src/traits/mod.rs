// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store trait definitions consumed by the contract engine.
//!
//! Every store uses `#[async_trait]` for dynamic dispatch, so the engine can
//! hold `Arc<dyn ...Store>` handles and tests can substitute wrappers.

pub mod identity;
pub mod inquiry;
pub mod job_card;
pub mod renewal;
pub mod storage;

pub use identity::IdentityStore;
pub use inquiry::InquiryStore;
pub use job_card::JobCardStore;
pub use renewal::RenewalStore;
pub use storage::StorageAdapter;
