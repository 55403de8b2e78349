//! Stage navigator
//!
//! Moves between places by unloading the units the target no longer needs,
//! then loading the ones it is missing. Transitions run one at a time:
//! concurrent calls queue up on a fair async lock and execute in call order.
//!
//! Each transition goes through the same steps:
//!
//! 1. resolve the target's units (fails fast on an unknown place)
//! 2. emit `Transitioning(target)`
//! 3. on push, record the place being left in the history
//! 4. unload barrier, then load barrier
//! 5. commit the current place (and, on pop, drop the history entry)
//! 6. emit `Transitioned(target)`
//!
//! If a barrier fails the transition stops there: the current place is left
//! as it was, a push's history entry is taken back, the ledger keeps
//! whatever actually completed, and no `Transitioned` is emitted. A
//! transition future dropped part-way behaves the same.

use std::collections::HashSet;
use std::fmt;

use parking_lot::RwLock;
use tokio::sync::{broadcast, Mutex};

use crate::config::{NavigatorConfig, RegistryConfig};
use crate::diff;
use crate::error::NavigationResult;
use crate::events::{ListenerId, TransitionEvent, TransitionEvents};
use crate::history::NavigationHistory;
use crate::loader::{load_all, unload_all, UnitLedger, UnitLoader};
use crate::registry::PlaceRegistry;
use crate::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Replace,
    Push,
    Pop,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Replace => write!(f, "Replace"),
            Operation::Push => write!(f, "Push"),
            Operation::Pop => write!(f, "Pop"),
        }
    }
}

/// State observers may read between transitions
struct Committed<P, U> {
    current: Option<P>,
    history: NavigationHistory<P>,
    /// Ledger of loaded non-common units
    loaded: HashSet<U>,
}

/// Ledger view that confirms units straight into the committed state
struct CommittedLedger<'a, P, U>(&'a RwLock<Committed<P, U>>);

impl<P, U: Key> UnitLedger<U> for CommittedLedger<'_, P, U> {
    fn confirm_loaded(&mut self, unit: &U) {
        self.0.write().loaded.insert(unit.clone());
    }

    fn confirm_unloaded(&mut self, unit: &U) {
        self.0.write().loaded.remove(unit);
    }
}

/// History entry recorded by a push, taken back unless the push commits
struct PushedEntry<'a, P: Key, U> {
    committed: &'a RwLock<Committed<P, U>>,
    place: Option<P>,
}

impl<'a, P: Key, U> PushedEntry<'a, P, U> {
    fn record(committed: &'a RwLock<Committed<P, U>>) -> Self {
        let mut state = committed.write();
        let place = state.current.clone();
        state.history.push(place.as_ref());
        drop(state);
        Self { committed, place }
    }

    fn keep(mut self) {
        self.place = None;
    }
}

impl<P: Key, U> Drop for PushedEntry<'_, P, U> {
    fn drop(&mut self) {
        // A reset while in flight may already have removed it
        if let Some(place) = self.place.take() {
            self.committed.write().history.discard_top(&place);
        }
    }
}

/// Place navigator
pub struct Navigator<P: Key, U: Key, L> {
    registry: PlaceRegistry<P, U>,
    loader: L,
    config: NavigatorConfig,
    events: TransitionEvents<P>,
    /// Held for a whole transition
    transitions: Mutex<()>,
    committed: RwLock<Committed<P, U>>,
}

impl<P, U, L> Navigator<P, U, L>
where
    P: Key,
    U: Key,
    L: UnitLoader<U>,
{
    /// Create a navigator and load the registry's common units
    pub async fn new(
        registry: PlaceRegistry<P, U>,
        loader: L,
        config: NavigatorConfig,
    ) -> NavigationResult<Self> {
        // Common units live outside the ledger so no diff can ever touch them
        let mut common: HashSet<U> = HashSet::new();
        load_all(&loader, registry.common_units(), &mut common).await?;

        log::info!(
            "Navigator ready: {} place(s), {} common unit(s)",
            registry.len(),
            common.len()
        );

        Ok(Self {
            events: TransitionEvents::new(config.event_capacity),
            committed: RwLock::new(Committed {
                current: None,
                history: NavigationHistory::new(config.empty_pop),
                loaded: HashSet::new(),
            }),
            transitions: Mutex::new(()),
            registry,
            loader,
            config,
        })
    }

    /// Validate a configuration source and create a navigator from it
    pub async fn from_config(
        source: RegistryConfig<P, U>,
        loader: L,
        config: NavigatorConfig,
    ) -> NavigationResult<Self> {
        let registry = PlaceRegistry::from_config(source)?;
        Self::new(registry, loader, config).await
    }

    /// Move to a place without touching the history
    pub async fn replace(&self, place: P) -> NavigationResult<()> {
        let _running = self.transitions.lock().await;
        self.transition(Operation::Replace, place).await
    }

    /// Move to a place, remembering the current one for `pop`
    ///
    /// The place being left shows up in [`history`](Self::history) right
    /// after `Transitioning` is delivered, while units are still loading.
    /// Listeners of `Transitioning` itself still see the old history. If the
    /// push fails or its future is dropped, the entry is taken back; a
    /// [`reset`](Self::reset) issued meanwhile stays in effect.
    pub async fn push(&self, place: P) -> NavigationResult<()> {
        let _running = self.transitions.lock().await;
        self.transition(Operation::Push, place).await
    }

    /// Go back to the most recently pushed place
    ///
    /// Returns the place moved to. With an empty history this fails with
    /// `NoHistory`, or returns `Ok(None)` without doing anything under
    /// [`EmptyPopPolicy::Ignore`](crate::config::EmptyPopPolicy::Ignore).
    /// The entry leaves the history only once the pop commits.
    pub async fn pop(&self) -> NavigationResult<Option<P>> {
        let _running = self.transitions.lock().await;

        let target = {
            let committed = self.committed.read();
            committed.history.peek()?.cloned()
        };

        match target {
            Some(place) => {
                self.transition(Operation::Pop, place.clone()).await?;
                Ok(Some(place))
            }
            None => {
                log::debug!("Pop: no history, nothing to do");
                Ok(None)
            }
        }
    }

    /// Forget the history; current place and loaded units stay as they are
    pub fn reset(&self) {
        self.committed.write().history.clear();
        log::debug!("Reset");
    }

    async fn transition(&self, op: Operation, target: P) -> NavigationResult<()> {
        let required = self.registry.units_for(&target)?;
        let common = self.registry.common_units();

        log::debug!("{}: {:?}", op, target);
        self.events.emit(TransitionEvent::Transitioning(target.clone()));

        let pushed = match op {
            Operation::Push => Some(PushedEntry::record(&self.committed)),
            Operation::Replace | Operation::Pop => None,
        };
        let mut ledger = CommittedLedger(&self.committed);

        let to_unload = {
            let committed = self.committed.read();
            diff::units_to_unload(&committed.loaded, required, common)
        };
        unload_all(&self.loader, &to_unload, &mut ledger).await?;

        let to_load = {
            let committed = self.committed.read();
            diff::units_to_load(&committed.loaded, required, common)
        };
        load_all(&self.loader, &to_load, &mut ledger).await?;

        {
            let mut committed = self.committed.write();
            if op == Operation::Pop {
                committed.history.discard_top(&target);
            }
            committed.current = Some(target.clone());
        }
        if let Some(entry) = pushed {
            entry.keep();
        }

        log::debug!(
            "{} complete: {:?} (-{} +{} units)",
            op,
            target,
            to_unload.len(),
            to_load.len()
        );
        self.events.emit(TransitionEvent::Transitioned(target));
        Ok(())
    }
}

impl<P: Key, U: Key, L> Navigator<P, U, L> {
    /// Current place, `None` before the first transition
    pub fn current(&self) -> Option<P> {
        self.committed.read().current.clone()
    }

    /// History entries, oldest first
    pub fn history(&self) -> Vec<P> {
        self.committed.read().history.entries().to_vec()
    }

    /// Check if `pop` has somewhere to go
    pub fn can_go_back(&self) -> bool {
        !self.committed.read().history.is_empty()
    }

    /// Loaded non-common units
    pub fn loaded_units(&self) -> HashSet<U> {
        self.committed.read().loaded.clone()
    }

    /// Check if a unit is loaded, common units included
    pub fn is_loaded(&self, unit: &U) -> bool {
        self.registry.is_common(unit) || self.committed.read().loaded.contains(unit)
    }

    /// Common units, loaded for the navigator's lifetime
    pub fn common_units(&self) -> &[U] {
        self.registry.common_units()
    }

    /// Check if a transition is running
    pub fn is_transitioning(&self) -> bool {
        self.transitions.try_lock().is_err()
    }

    /// Place registry
    pub fn registry(&self) -> &PlaceRegistry<P, U> {
        &self.registry
    }

    /// Unit loader
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Navigator configuration
    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Transition notifications
    pub fn events(&self) -> &TransitionEvents<P> {
        &self.events
    }

    /// Register a transition callback
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&TransitionEvent<P>) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Remove a transition callback
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Open a transition event stream
    pub fn stream(&self) -> broadcast::Receiver<TransitionEvent<P>> {
        self.events.stream()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmptyPopPolicy;
    use crate::error::{LoaderError, NavigationError};
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;

    #[derive(Default)]
    struct CountingLoader {
        loads: SyncMutex<Vec<&'static str>>,
        unloads: SyncMutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl UnitLoader<&'static str> for CountingLoader {
        async fn load(&self, unit: &&'static str) -> Result<(), LoaderError> {
            self.loads.lock().push(*unit);
            Ok(())
        }

        async fn unload(&self, unit: &&'static str) -> Result<(), LoaderError> {
            self.unloads.lock().push(*unit);
            Ok(())
        }
    }

    fn config() -> RegistryConfig<&'static str, &'static str> {
        RegistryConfig::new()
            .with_common(["Perm"])
            .with_place("First", ["Stage1", "Modal1"])
            .with_place("Second", ["Stage2", "Shared"])
    }

    async fn navigator(
        policy: EmptyPopPolicy,
    ) -> Navigator<&'static str, &'static str, CountingLoader> {
        Navigator::from_config(
            config(),
            CountingLoader::default(),
            NavigatorConfig::default().with_empty_pop(policy),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_common_units_loaded_on_construction() {
        let nav = navigator(EmptyPopPolicy::Error).await;

        assert_eq!(nav.loader().loads.lock().as_slice(), &["Perm"]);
        assert!(nav.is_loaded(&"Perm"));
        assert!(nav.loaded_units().is_empty());
        assert_eq!(nav.current(), None);
        assert!(!nav.is_transitioning());
    }

    #[tokio::test]
    async fn test_replace_to_same_place_issues_nothing() {
        let nav = navigator(EmptyPopPolicy::Error).await;
        nav.replace("First").await.unwrap();

        let loads = nav.loader().loads.lock().len();
        let mut stream = nav.stream();

        nav.replace("First").await.unwrap();

        assert_eq!(nav.loader().loads.lock().len(), loads);
        assert!(nav.loader().unloads.lock().is_empty());
        assert_eq!(stream.try_recv().unwrap(), TransitionEvent::Transitioning("First"));
        assert_eq!(stream.try_recv().unwrap(), TransitionEvent::Transitioned("First"));
    }

    #[tokio::test]
    async fn test_unknown_place_fails_fast() {
        let nav = navigator(EmptyPopPolicy::Error).await;
        let mut stream = nav.stream();

        let err = nav.push("Nowhere").await.unwrap_err();

        assert!(matches!(err, NavigationError::UnknownPlace(_)));
        assert!(stream.try_recv().is_err());
        assert_eq!(nav.current(), None);
        assert!(nav.history().is_empty());
    }

    #[tokio::test]
    async fn test_pop_ignore_policy() {
        let nav = navigator(EmptyPopPolicy::Ignore).await;

        assert_eq!(nav.pop().await.unwrap(), None);
        assert_eq!(nav.current(), None);
        assert_eq!(nav.loader().loads.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_replace_after_push_keeps_history() {
        let nav = navigator(EmptyPopPolicy::Error).await;

        nav.push("First").await.unwrap();
        nav.push("Second").await.unwrap();
        nav.replace("First").await.unwrap();

        assert_eq!(nav.history(), vec!["First"]);
        assert!(nav.can_go_back());
        assert_eq!(nav.current(), Some("First"));
    }

    #[tokio::test]
    async fn test_push_after_replace_records_previous() {
        let nav = navigator(EmptyPopPolicy::Error).await;

        nav.replace("First").await.unwrap();
        nav.push("Second").await.unwrap();

        assert_eq!(nav.history(), vec!["First"]);
        assert_eq!(nav.pop().await.unwrap(), Some("First"));
        assert!(!nav.can_go_back());
    }
}
