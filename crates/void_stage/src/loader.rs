//! Unit loading
//!
//! The [`UnitLoader`] trait is the seam to whatever actually loads units
//! (an engine's scene subsystem, a test double). [`load_all`] and
//! [`unload_all`] fan a batch out to it and wait for every request before
//! resolving. Each unit is recorded in the [`UnitLedger`] the moment its
//! request settles, so a barrier dropped part-way still leaves the ledger
//! matching what the backend confirmed.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::error::{LoaderError, NavigationError, NavigationResult};
use crate::Key;

/// Backend that loads and unloads individual units
#[async_trait]
pub trait UnitLoader<U: Key>: Send + Sync {
    /// Load a unit additively, resolving once it is ready
    async fn load(&self, unit: &U) -> Result<(), LoaderError>;

    /// Unload a unit, resolving once it is gone
    async fn unload(&self, unit: &U) -> Result<(), LoaderError>;
}

#[async_trait]
impl<U: Key, L: UnitLoader<U> + ?Sized> UnitLoader<U> for Arc<L> {
    async fn load(&self, unit: &U) -> Result<(), LoaderError> {
        (**self).load(unit).await
    }

    async fn unload(&self, unit: &U) -> Result<(), LoaderError> {
        (**self).unload(unit).await
    }
}

#[async_trait]
impl<U: Key, L: UnitLoader<U> + ?Sized> UnitLoader<U> for Box<L> {
    async fn load(&self, unit: &U) -> Result<(), LoaderError> {
        (**self).load(unit).await
    }

    async fn unload(&self, unit: &U) -> Result<(), LoaderError> {
        (**self).unload(unit).await
    }
}

/// Record of units the backend has confirmed
pub trait UnitLedger<U> {
    /// A load request completed
    fn confirm_loaded(&mut self, unit: &U);

    /// An unload request completed
    fn confirm_unloaded(&mut self, unit: &U);
}

impl<U: Key> UnitLedger<U> for HashSet<U> {
    fn confirm_loaded(&mut self, unit: &U) {
        self.insert(unit.clone());
    }

    fn confirm_unloaded(&mut self, unit: &U) {
        self.remove(unit);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitOp {
    Load,
    Unload,
}

/// Load every unit and wait for all of them
///
/// Each unit is confirmed in `ledger` as soon as its own request completes.
/// If any request fails, the others still run to completion and the first
/// failure to arrive is returned as [`NavigationError::LoadFailure`].
pub async fn load_all<U, L, T>(loader: &L, units: &[U], ledger: &mut T) -> NavigationResult<()>
where
    U: Key,
    L: UnitLoader<U> + ?Sized,
    T: UnitLedger<U> + Send + ?Sized,
{
    run_batch(loader, UnitOp::Load, units, ledger).await
}

/// Unload every unit and wait for all of them
///
/// Each unit is removed from `ledger` as soon as its own request completes.
/// Failures are reported as [`NavigationError::UnloadFailure`].
pub async fn unload_all<U, L, T>(loader: &L, units: &[U], ledger: &mut T) -> NavigationResult<()>
where
    U: Key,
    L: UnitLoader<U> + ?Sized,
    T: UnitLedger<U> + Send + ?Sized,
{
    run_batch(loader, UnitOp::Unload, units, ledger).await
}

async fn run_batch<U, L, T>(
    loader: &L,
    op: UnitOp,
    units: &[U],
    ledger: &mut T,
) -> NavigationResult<()>
where
    U: Key,
    L: UnitLoader<U> + ?Sized,
    T: UnitLedger<U> + Send + ?Sized,
{
    if units.is_empty() {
        return Ok(());
    }

    log::debug!("{:?} barrier: {} unit(s) issued", op, units.len());

    let mut pending: FuturesUnordered<_> = units
        .iter()
        .map(move |unit| async move {
            let result = match op {
                UnitOp::Load => loader.load(unit).await,
                UnitOp::Unload => loader.unload(unit).await,
            };
            (unit, result)
        })
        .collect();

    let mut first_failure: Option<(String, String)> = None;
    let mut failed = 0;

    while let Some((unit, result)) = pending.next().await {
        match result {
            Ok(()) => match op {
                UnitOp::Load => ledger.confirm_loaded(unit),
                UnitOp::Unload => ledger.confirm_unloaded(unit),
            },
            Err(e) => {
                log::error!("{:?} of unit {:?} failed: {}", op, unit, e.reason);
                failed += 1;
                if first_failure.is_none() {
                    first_failure = Some((format!("{:?}", unit), e.reason));
                }
            }
        }
    }

    match first_failure {
        None => Ok(()),
        Some((unit, reason)) => Err(match op {
            UnitOp::Load => NavigationError::LoadFailure { unit, reason, failed },
            UnitOp::Unload => NavigationError::UnloadFailure { unit, reason, failed },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Loader that finishes units in reverse-ish order and can fail some
    #[derive(Default)]
    struct SlowLoader {
        finished: Mutex<Vec<String>>,
        failing: Vec<&'static str>,
    }

    impl SlowLoader {
        async fn finish(&self, unit: &&'static str) -> Result<(), LoaderError> {
            tokio::time::sleep(Duration::from_millis(5 * unit.len() as u64)).await;
            if self.failing.contains(unit) {
                return Err(LoaderError::new(*unit, "broken"));
            }
            self.finished.lock().push(unit.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl UnitLoader<&'static str> for SlowLoader {
        async fn load(&self, unit: &&'static str) -> Result<(), LoaderError> {
            self.finish(unit).await
        }

        async fn unload(&self, unit: &&'static str) -> Result<(), LoaderError> {
            self.finish(unit).await
        }
    }

    #[tokio::test]
    async fn test_empty_batch_resolves() {
        let loader = SlowLoader::default();
        let mut ledger: HashSet<&'static str> = HashSet::new();

        load_all(&loader, &[], &mut ledger).await.unwrap();
        unload_all(&loader, &[], &mut ledger).await.unwrap();

        assert!(loader.finished.lock().is_empty());
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_barrier_waits_for_every_unit() {
        let loader = SlowLoader::default();
        let mut ledger: HashSet<&'static str> = HashSet::new();

        load_all(&loader, &["LongestUnit", "A", "Mid"], &mut ledger)
            .await
            .unwrap();

        assert_eq!(loader.finished.lock().len(), 3);
        assert_eq!(ledger.len(), 3);

        unload_all(&loader, &["A", "Mid"], &mut ledger).await.unwrap();
        assert_eq!(ledger, HashSet::from(["LongestUnit"]));
    }

    #[tokio::test]
    async fn test_failure_keeps_confirmed_units() {
        let loader = SlowLoader {
            failing: vec!["Bad"],
            ..Default::default()
        };
        let mut ledger: HashSet<&'static str> = HashSet::new();

        let err = load_all(&loader, &["Good", "Bad", "Fine"], &mut ledger)
            .await
            .unwrap_err();

        match err {
            NavigationError::LoadFailure { unit, reason, failed } => {
                assert_eq!(unit, "\"Bad\"");
                assert_eq!(reason, "broken");
                assert_eq!(failed, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ledger, HashSet::from(["Good", "Fine"]));
    }

    #[tokio::test]
    async fn test_unload_failure_leaves_unit_in_ledger() {
        let loader = SlowLoader {
            failing: vec!["Stuck"],
            ..Default::default()
        };
        let mut ledger = HashSet::from(["Stuck", "Gone"]);

        let err = unload_all(&loader, &["Stuck", "Gone"], &mut ledger)
            .await
            .unwrap_err();

        assert!(matches!(err, NavigationError::UnloadFailure { failed: 1, .. }));
        assert_eq!(ledger, HashSet::from(["Stuck"]));
    }

    #[tokio::test]
    async fn test_dropped_barrier_keeps_settled_units() {
        let loader = SlowLoader::default();
        let mut ledger: HashSet<&'static str> = HashSet::new();

        // "A" settles after 5ms, the long one after 80ms
        let result = tokio::time::timeout(
            Duration::from_millis(30),
            load_all(&loader, &["A", "SixteenCharsLong"], &mut ledger),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(ledger, HashSet::from(["A"]));
        assert_eq!(loader.finished.lock().as_slice(), &["A".to_string()]);
    }

    #[tokio::test]
    async fn test_shared_loader() {
        let loader = Arc::new(SlowLoader::default());
        let mut ledger: HashSet<&'static str> = HashSet::new();

        load_all(&loader, &["A"], &mut ledger).await.unwrap();
        assert_eq!(loader.finished.lock().as_slice(), &["A".to_string()]);
    }
}
