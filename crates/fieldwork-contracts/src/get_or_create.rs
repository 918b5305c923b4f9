// SPDX-FileCopyrightText: 2026 Fieldwork Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Get-or-create on top of a store-enforced unique key.
//!
//! Check-then-insert is not atomic, so two callers can both miss the lookup.
//! The store's unique index decides the winner; the loser sees
//! [`FieldworkError::UniqueViolation`] and re-reads exactly once.

use std::future::Future;

use fieldwork_core::FieldworkError;
use tracing::debug;

/// Look up a row, creating it when absent. Returns `(row, created)`.
///
/// `lookup` may run twice: before the insert and after a lost race. Any
/// error other than a unique violation from `create` is returned as is.
pub async fn get_or_create<T, L, LF, C, CF>(lookup: L, create: C) -> Result<(T, bool), FieldworkError>
where
    L: Fn() -> LF,
    LF: Future<Output = Result<Option<T>, FieldworkError>>,
    C: FnOnce() -> CF,
    CF: Future<Output = Result<T, FieldworkError>>,
{
    if let Some(existing) = lookup().await? {
        return Ok((existing, false));
    }

    match create().await {
        Ok(created) => Ok((created, true)),
        Err(err) if err.is_unique_violation() => {
            debug!(error = %err, "lost creation race, re-reading winner");
            match lookup().await? {
                Some(winner) => Ok((winner, false)),
                None => Err(FieldworkError::Internal(format!(
                    "{err}, but no conflicting row is visible"
                ))),
            }
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn conflict() -> FieldworkError {
        FieldworkError::UniqueViolation {
            entity: "client",
            key: "9876543210".into(),
        }
    }

    #[tokio::test]
    async fn existing_row_short_circuits() {
        let creates = AtomicUsize::new(0);
        let (value, created) = get_or_create(
            || async { Ok(Some(7)) },
            || async {
                creates.fetch_add(1, Ordering::SeqCst);
                Ok(8)
            },
        )
        .await
        .unwrap();
        assert_eq!((value, created), (7, false));
        assert_eq!(creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_row_is_created() {
        let (value, created) = get_or_create(|| async { Ok(None) }, || async { Ok(42) })
            .await
            .unwrap();
        assert_eq!((value, created), (42, true));
    }

    #[tokio::test]
    async fn lost_race_rereads_once() {
        // First lookup misses, the insert loses, the second lookup sees the winner.
        let lookups = AtomicUsize::new(0);
        let (value, created) = get_or_create(
            || async {
                match lookups.fetch_add(1, Ordering::SeqCst) {
                    0 => Ok(None),
                    _ => Ok(Some(99)),
                }
            },
            || async { Err::<i32, _>(conflict()) },
        )
        .await
        .unwrap();
        assert_eq!((value, created), (99, false));
        assert_eq!(lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn conflict_without_visible_winner_is_internal() {
        let err = get_or_create(|| async { Ok(None::<i32>) }, || async { Err(conflict()) })
            .await
            .unwrap_err();
        assert!(matches!(err, FieldworkError::Internal(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn other_create_errors_propagate() {
        let attempts = Mutex::new(0);
        let err = get_or_create(
            || async { Ok(None::<i32>) },
            || async {
                *attempts.lock().unwrap() += 1;
                Err(FieldworkError::Validation("bad row".into()))
            },
        )
        .await
        .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(*attempts.lock().unwrap(), 1);
    }
}
