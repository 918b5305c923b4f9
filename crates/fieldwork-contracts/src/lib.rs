// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client identity resolution and renewal scheduling engine.
//!
//! The engine sits between request handlers and the stores:
//!
//! - [`ClientResolver`] turns raw contact data into exactly one client per
//!   normalized identifier, relying on the store's unique index under races.
//! - [`ScheduleGenerator`] derives a job card's renewal set from its
//!   [`ContractSpec`] and inserts only what is missing.
//! - [`LifecycleCoordinator`] wires both into job card create/update.
//! - [`RenewalActions`] completes renewals and pauses job cards.

pub mod actions;
pub mod audit;
pub mod get_or_create;
pub mod identifier;
pub mod lifecycle;
pub mod resolver;
pub mod schedule;

use std::sync::Arc;

use fieldwork_config::FieldworkConfig;
use fieldwork_core::types::Renewal;
use fieldwork_core::{
    FieldworkError, IdentityStore, InquiryStore, JobCardId, JobCardStore, RenewalStore,
};

pub use actions::{BulkOutcome, RenewalActions};
pub use audit::{IdentifierAudit, RepairReport};
pub use get_or_create::get_or_create;
pub use identifier::normalize_identifier;
pub use lifecycle::{
    ClientRef, InquiryConversion, JobCardDraft, JobCardOutcome, JobCardPatch, LifecycleCoordinator,
};
pub use resolver::{ClientAttributes, ClientResolver};
pub use schedule::{ContractSpec, RenewalTarget, ScheduleGenerator};

/// The store handles the engine runs against.
#[derive(Clone)]
pub struct Stores {
    pub identity: Arc<dyn IdentityStore>,
    pub job_cards: Arc<dyn JobCardStore>,
    pub renewals: Arc<dyn RenewalStore>,
    pub inquiries: Arc<dyn InquiryStore>,
}

impl Stores {
    /// Use one backend for every store.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: IdentityStore + JobCardStore + RenewalStore + InquiryStore + 'static,
    {
        Self {
            identity: store.clone(),
            job_cards: store.clone(),
            renewals: store.clone(),
            inquiries: store,
        }
    }

    /// Replace the renewal store, keeping the others.
    pub fn with_renewals(mut self, renewals: Arc<dyn RenewalStore>) -> Self {
        self.renewals = renewals;
        self
    }
}

/// Fully wired engine.
pub struct ContractEngine {
    resolver: Arc<ClientResolver>,
    scheduler: Arc<ScheduleGenerator>,
    lifecycle: LifecycleCoordinator,
    actions: RenewalActions,
    identity: Arc<dyn IdentityStore>,
    job_cards: Arc<dyn JobCardStore>,
}

impl ContractEngine {
    /// Build an engine over a single backend implementing every store.
    pub fn new<S>(store: Arc<S>, config: &FieldworkConfig) -> Self
    where
        S: IdentityStore + JobCardStore + RenewalStore + InquiryStore + 'static,
    {
        Self::from_stores(Stores::shared(store), config)
    }

    pub fn from_stores(stores: Stores, config: &FieldworkConfig) -> Self {
        let resolver = Arc::new(ClientResolver::new(stores.identity.clone(), &config.identity));
        let scheduler = Arc::new(ScheduleGenerator::new(
            stores.renewals.clone(),
            config.scheduling.max_contract_months,
        ));
        let lifecycle = LifecycleCoordinator::new(
            resolver.clone(),
            scheduler.clone(),
            stores.identity.clone(),
            stores.job_cards.clone(),
            stores.inquiries,
        )
        .with_scheduling(config.scheduling.enabled)
        .with_default_tax_percent(config.billing.default_tax_percent);
        let actions = RenewalActions::new(stores.renewals, stores.job_cards.clone());

        Self {
            resolver,
            scheduler,
            lifecycle,
            actions,
            identity: stores.identity,
            job_cards: stores.job_cards,
        }
    }

    pub fn resolver(&self) -> &ClientResolver {
        &self.resolver
    }

    pub fn scheduler(&self) -> &ScheduleGenerator {
        &self.scheduler
    }

    pub fn lifecycle(&self) -> &LifecycleCoordinator {
        &self.lifecycle
    }

    pub fn actions(&self) -> &RenewalActions {
        &self.actions
    }

    /// Load a job card and reconcile its renewals.
    pub async fn reconcile_job_card(
        &self,
        id: JobCardId,
        force_regenerate: bool,
    ) -> Result<Vec<Renewal>, FieldworkError> {
        let card = self
            .job_cards
            .get_job_card(id)
            .await?
            .ok_or(FieldworkError::NotFound {
                entity: "job card",
                id: id.0,
            })?;
        self.scheduler.reconcile(&card, force_regenerate).await
    }

    pub async fn audit_identifiers(&self) -> Result<IdentifierAudit, FieldworkError> {
        audit::audit_identifiers(&*self.identity, self.resolver.identifier_digits()).await
    }

    pub async fn repair_identifiers(&self) -> Result<RepairReport, FieldworkError> {
        audit::repair_identifiers(&*self.identity, self.resolver.identifier_digits()).await
    }
}
