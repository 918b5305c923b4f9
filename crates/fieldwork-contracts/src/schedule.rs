// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Renewal schedule derivation and reconciliation.
//!
//! A job card's contract columns are first lifted into a [`ContractSpec`].
//! The target set is a pure function of the contract spec; reconciliation
//! inserts only the targets missing from the store and never deletes.
//!
//! Month arithmetic clamps to the end of the target month (Jan 31 + 1 month
//! is Feb 28/29), and every due date is computed from the reference date
//! directly so the clamp never accumulates.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Months, NaiveDate};
use fieldwork_core::types::{
    ContractFields, JobCard, JobCardId, JobCategory, NewRenewal, Renewal, RenewalType,
};
use fieldwork_core::{FieldworkError, RenewalStore};
use tracing::{debug, info};

use crate::get_or_create::get_or_create;

/// The renewal-generation rule carried by a job card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractSpec {
    /// A single follow-up visit.
    OneTime { service_date: NaiveDate },
    /// A contract running `duration_months` months from `reference_date`.
    Recurring {
        duration_months: u32,
        reference_date: NaiveDate,
    },
    /// Nothing to schedule.
    None,
}

/// One renewal that should exist, identified by its dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenewalTarget {
    pub due_date: NaiveDate,
    pub renewal_type: RenewalType,
}

impl ContractSpec {
    /// Derive the contract spec from raw contract columns.
    ///
    /// Only the field matching `category` is consulted. A duration outside
    /// `1..=max_contract_months`, or a one-time date not after
    /// `schedule_date`, is rejected.
    pub fn from_fields(
        fields: ContractFields,
        schedule_date: NaiveDate,
        max_contract_months: u32,
    ) -> Result<Self, FieldworkError> {
        match fields.category {
            JobCategory::OneTime => match fields.next_service_date {
                Some(service_date) if service_date <= schedule_date => {
                    Err(FieldworkError::InvalidContractSpec(format!(
                        "next service date {service_date} must be after schedule date {schedule_date}"
                    )))
                }
                Some(service_date) => Ok(Self::OneTime { service_date }),
                None => Ok(Self::None),
            },
            JobCategory::Recurring => match fields.contract_duration_months {
                Some(months) => {
                    let duration_months = u32::try_from(months)
                        .ok()
                        .filter(|m| (1..=max_contract_months).contains(m))
                        .ok_or_else(|| {
                            FieldworkError::InvalidContractSpec(format!(
                                "contract duration must be 1..={max_contract_months} months, got {months}"
                            ))
                        })?;
                    Ok(Self::Recurring {
                        duration_months,
                        reference_date: schedule_date,
                    })
                }
                None => Ok(Self::None),
            },
        }
    }

    pub fn from_job_card(card: &JobCard, max_contract_months: u32) -> Result<Self, FieldworkError> {
        Self::from_fields(card.contract_fields(), card.schedule_date, max_contract_months)
    }

    /// The full set of renewals this contract calls for, ordered by dedup key.
    pub fn targets(&self) -> Result<Vec<RenewalTarget>, FieldworkError> {
        match *self {
            Self::None => Ok(Vec::new()),
            Self::OneTime { service_date } => Ok(vec![RenewalTarget {
                due_date: service_date,
                renewal_type: RenewalType::ContractEnd,
            }]),
            Self::Recurring {
                duration_months,
                reference_date,
            } => {
                let mut targets = Vec::with_capacity(duration_months as usize + 1);
                for month in 1..=duration_months {
                    targets.push(RenewalTarget {
                        due_date: add_months(reference_date, month)?,
                        renewal_type: RenewalType::MonthlyReminder,
                    });
                }
                targets.push(RenewalTarget {
                    due_date: add_months(reference_date, duration_months)?,
                    renewal_type: RenewalType::ContractEnd,
                });
                targets.sort();
                Ok(targets)
            }
        }
    }
}

/// `date + months`, clamped to the last day of the target month.
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, FieldworkError> {
    date.checked_add_months(Months::new(months)).ok_or_else(|| {
        FieldworkError::InvalidContractSpec(format!("{date} + {months} months is out of range"))
    })
}

/// Targets whose dedup key is not yet taken by an existing renewal.
pub fn missing_targets(targets: &[RenewalTarget], existing: &[Renewal]) -> Vec<RenewalTarget> {
    let taken: HashSet<_> = existing.iter().map(Renewal::dedup_key).collect();
    targets
        .iter()
        .filter(|t| !taken.contains(&(t.due_date, t.renewal_type)))
        .copied()
        .collect()
}

/// Persists the missing part of a job card's renewal schedule.
pub struct ScheduleGenerator {
    renewals: Arc<dyn RenewalStore>,
    max_contract_months: u32,
}

impl ScheduleGenerator {
    pub fn new(renewals: Arc<dyn RenewalStore>, max_contract_months: u32) -> Self {
        Self {
            renewals,
            max_contract_months,
        }
    }

    pub fn max_contract_months(&self) -> u32 {
        self.max_contract_months
    }

    /// Bring the stored renewals of `card` up to its target set and return
    /// the complete set, ordered by due date then type.
    ///
    /// Existing rows, completed or not, are reused and never rewritten, so a
    /// shifted date adds the new target alongside the old row. The target set
    /// depends only on category and the contract columns; status and the pause
    /// flag play no part. `force_regenerate` cannot bypass dedup.
    pub async fn reconcile(
        &self,
        card: &JobCard,
        force_regenerate: bool,
    ) -> Result<Vec<Renewal>, FieldworkError> {
        let spec = ContractSpec::from_job_card(card, self.max_contract_months)?;
        let targets = spec.targets()?;

        let existing = self
            .renewals
            .list_renewals_for_job_card(card.id)
            .await
            .map_err(|e| scheduling_failure(card.id, e))?;

        let missing = missing_targets(&targets, &existing);
        if missing.is_empty() {
            debug!(
                job_card_id = %card.id,
                renewals = existing.len(),
                force_regenerate,
                "schedule already complete"
            );
            return Ok(existing);
        }

        let mut renewals = existing;
        let mut renewals_created = 0usize;
        for target in missing {
            let (renewal, created) = self.ensure(card.id, target).await?;
            if created {
                renewals_created += 1;
            }
            renewals.push(renewal);
        }
        renewals.sort_by_key(Renewal::dedup_key);
        info!(job_card_id = %card.id, renewals_created, "reconciled renewal schedule");
        Ok(renewals)
    }

    /// Get-or-create one target row; the flag is true when this call inserted it.
    async fn ensure(
        &self,
        job_card_id: JobCardId,
        target: RenewalTarget,
    ) -> Result<(Renewal, bool), FieldworkError> {
        let store = &*self.renewals;
        let new_renewal = NewRenewal {
            job_card_id,
            due_date: target.due_date,
            renewal_type: target.renewal_type,
            remarks: None,
        };
        let new_ref = &new_renewal;
        get_or_create(
            move || store.find_renewal(job_card_id, target.due_date, target.renewal_type),
            move || store.insert_renewal(new_ref),
        )
        .await
        .map_err(|e| scheduling_failure(job_card_id, e))
    }
}

fn scheduling_failure(job_card_id: JobCardId, err: FieldworkError) -> FieldworkError {
    FieldworkError::Scheduling {
        message: format!("reconcile of job card {job_card_id} failed: {err}"),
        source: Some(Box::new(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldwork_config::model::StorageConfig;
    use fieldwork_core::types::{NewClient, NewJobCard, RenewalStatus};
    use fieldwork_core::{IdentityStore, JobCardStore};
    use fieldwork_storage::{Database, SqliteStorage};
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fields(
        category: JobCategory,
        next_service_date: Option<NaiveDate>,
        contract_duration_months: Option<i64>,
    ) -> ContractFields {
        ContractFields {
            category,
            next_service_date,
            contract_duration_months,
        }
    }

    fn target(due_date: NaiveDate, renewal_type: RenewalType) -> RenewalTarget {
        RenewalTarget {
            due_date,
            renewal_type,
        }
    }

    #[test]
    fn one_time_yields_single_contract_end() {
        let spec = ContractSpec::from_fields(
            fields(JobCategory::OneTime, Some(date(2024, 4, 15)), None),
            date(2024, 1, 10),
            120,
        )
        .unwrap();
        assert_eq!(
            spec.targets().unwrap(),
            vec![target(date(2024, 4, 15), RenewalType::ContractEnd)]
        );
    }

    #[test]
    fn recurring_three_months_yields_four_targets() {
        let spec = ContractSpec::from_fields(
            fields(JobCategory::Recurring, None, Some(3)),
            date(2024, 1, 10),
            120,
        )
        .unwrap();
        assert_eq!(
            spec.targets().unwrap(),
            vec![
                target(date(2024, 2, 10), RenewalType::MonthlyReminder),
                target(date(2024, 3, 10), RenewalType::MonthlyReminder),
                target(date(2024, 4, 10), RenewalType::ContractEnd),
                target(date(2024, 4, 10), RenewalType::MonthlyReminder),
            ]
        );
    }

    #[test]
    fn month_end_clamps_without_drift() {
        let spec = ContractSpec::Recurring {
            duration_months: 3,
            reference_date: date(2024, 1, 31),
        };
        let reminders: Vec<_> = spec
            .targets()
            .unwrap()
            .into_iter()
            .filter(|t| t.renewal_type == RenewalType::MonthlyReminder)
            .map(|t| t.due_date)
            .collect();
        assert_eq!(
            reminders,
            vec![date(2024, 2, 29), date(2024, 3, 31), date(2024, 4, 30)]
        );
        assert_eq!(add_months(date(2023, 1, 31), 1).unwrap(), date(2023, 2, 28));
    }

    #[test]
    fn inactive_field_is_ignored() {
        // A one-time card with a stray duration still schedules by date only.
        let spec = ContractSpec::from_fields(
            fields(JobCategory::OneTime, None, Some(12)),
            date(2024, 1, 10),
            120,
        )
        .unwrap();
        assert_eq!(spec, ContractSpec::None);
        assert!(spec.targets().unwrap().is_empty());

        let spec = ContractSpec::from_fields(
            fields(JobCategory::Recurring, Some(date(2024, 5, 1)), None),
            date(2024, 1, 10),
            120,
        )
        .unwrap();
        assert_eq!(spec, ContractSpec::None);
    }

    #[test]
    fn malformed_specs_are_rejected() {
        for months in [0, -3, 121] {
            let err = ContractSpec::from_fields(
                fields(JobCategory::Recurring, None, Some(months)),
                date(2024, 1, 10),
                120,
            )
            .unwrap_err();
            assert!(matches!(err, FieldworkError::InvalidContractSpec(_)), "{months}");
        }

        let err = ContractSpec::from_fields(
            fields(JobCategory::OneTime, Some(date(2024, 1, 10)), None),
            date(2024, 1, 10),
            120,
        )
        .unwrap_err();
        assert!(matches!(err, FieldworkError::InvalidContractSpec(_)));
    }

    proptest! {
        #[test]
        fn recurring_targets_are_unique_and_sized(
            months in 1u32..=120,
            day in 1u32..=28,
            month in 1u32..=12,
        ) {
            let spec = ContractSpec::Recurring {
                duration_months: months,
                reference_date: date(2024, month, day),
            };
            let targets = spec.targets().unwrap();
            prop_assert_eq!(targets.len(), months as usize + 1);
            let unique: HashSet<_> = targets.iter().collect();
            prop_assert_eq!(unique.len(), targets.len());
            prop_assert!(targets.windows(2).all(|w| w[0] < w[1]));
        }
    }

    async fn setup(
        category: JobCategory,
        next: Option<NaiveDate>,
        months: Option<i64>,
    ) -> (Arc<SqliteStorage>, JobCard) {
        let db = Database::open_in_memory().await.unwrap();
        let storage = Arc::new(SqliteStorage::from_database(StorageConfig::default(), db));
        let client = storage
            .insert_client(&NewClient {
                full_name: "Lakeview CHS".into(),
                mobile: "9822000001".into(),
                email: None,
                city: "Pune".into(),
                address: None,
                notes: None,
            })
            .await
            .unwrap();
        let card = storage
            .insert_job_card(&NewJobCard {
                client_id: client.id,
                category,
                status: "WIP".into(),
                service_type: "Pest control".into(),
                schedule_date: date(2024, 1, 10),
                technician_name: "Sunil".into(),
                price_subtotal_minor: 0,
                tax_percent: 18,
                grand_total_minor: 0,
                next_service_date: next,
                contract_duration_months: months,
                client_address: None,
                notes: None,
            })
            .await
            .unwrap();
        (storage, card)
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let (storage, card) = setup(JobCategory::Recurring, None, Some(3)).await;
        let generator = ScheduleGenerator::new(storage.clone(), 120);

        let first = generator.reconcile(&card, false).await.unwrap();
        let second = generator.reconcile(&card, false).await.unwrap();
        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn reconcile_preserves_completed_rows() {
        let (storage, mut card) =
            setup(JobCategory::OneTime, Some(date(2024, 4, 15)), None).await;
        let generator = ScheduleGenerator::new(storage.clone(), 120);

        let initial = generator.reconcile(&card, false).await.unwrap();
        storage
            .set_renewal_status(initial[0].id, RenewalStatus::Completed)
            .await
            .unwrap();

        card.next_service_date = Some(date(2024, 7, 15));
        let after = generator.reconcile(&card, false).await.unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].due_date, date(2024, 4, 15));
        assert_eq!(after[0].status, RenewalStatus::Completed);
        assert_eq!(after[1].due_date, date(2024, 7, 15));
        assert_eq!(after[1].status, RenewalStatus::Due);
    }

    #[tokio::test]
    async fn shortened_contract_keeps_existing_rows() {
        let (storage, mut card) = setup(JobCategory::Recurring, None, Some(3)).await;
        let generator = ScheduleGenerator::new(storage.clone(), 120);
        generator.reconcile(&card, false).await.unwrap();

        card.contract_duration_months = Some(1);
        let after = generator.reconcile(&card, false).await.unwrap();
        // 2024-02-10 contract end is new; nothing is removed.
        assert_eq!(after.len(), 5);
    }

    #[tokio::test]
    async fn status_does_not_gate_reconcile() {
        let (storage, mut card) = setup(JobCategory::Recurring, None, Some(2)).await;
        card.status = "Cancelled".into();
        let generator = ScheduleGenerator::new(storage.clone(), 120);

        assert_eq!(generator.reconcile(&card, false).await.unwrap().len(), 3);
        assert_eq!(generator.reconcile(&card, true).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn empty_spec_is_not_an_error() {
        let (storage, card) = setup(JobCategory::OneTime, None, None).await;
        let generator = ScheduleGenerator::new(storage, 120);
        assert!(generator.reconcile(&card, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_scheduling_error() {
        let (storage, mut card) = setup(JobCategory::Recurring, None, Some(2)).await;
        card.id = JobCardId(999);
        let generator = ScheduleGenerator::new(storage, 120);

        // The foreign key rejects renewals for a job card that does not exist.
        let err = generator.reconcile(&card, false).await.unwrap_err();
        assert!(matches!(err, FieldworkError::Scheduling { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn overlapping_reconciles_do_not_duplicate() {
        let (storage, card) = setup(JobCategory::Recurring, None, Some(6)).await;
        let generator = Arc::new(ScheduleGenerator::new(storage.clone(), 120));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = generator.clone();
                let card = card.clone();
                tokio::spawn(async move { generator.reconcile(&card, false).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = storage.list_renewals_for_job_card(card.id).await.unwrap();
        assert_eq!(stored.len(), 7);
    }
}
