//! Navigation history
//!
//! LIFO stack of places that `pop` can return to.

use crate::config::EmptyPopPolicy;
use crate::error::{NavigationError, NavigationResult};

/// Stack of previously visited places
#[derive(Debug, Clone)]
pub struct NavigationHistory<P> {
    /// Bottom of the stack first
    stack: Vec<P>,
    /// Behaviour when popping an empty stack
    policy: EmptyPopPolicy,
}

impl<P: Clone> NavigationHistory<P> {
    /// Create an empty history
    pub fn new(policy: EmptyPopPolicy) -> Self {
        Self {
            stack: Vec::new(),
            policy,
        }
    }

    /// Remember the place being left
    ///
    /// `None` means no place has been established yet (the very first
    /// transition), so there is nothing to remember.
    pub fn push(&mut self, leaving: Option<&P>) {
        if let Some(place) = leaving {
            self.stack.push(place.clone());
        }
    }

    /// Place a pop would return to, without removing it
    ///
    /// `Ok(None)` only under [`EmptyPopPolicy::Ignore`].
    pub fn peek(&self) -> NavigationResult<Option<&P>> {
        match self.stack.last() {
            Some(place) => Ok(Some(place)),
            None => self.on_empty(),
        }
    }

    /// Remove and return the top place
    ///
    /// `Ok(None)` only under [`EmptyPopPolicy::Ignore`].
    pub fn pop(&mut self) -> NavigationResult<Option<P>> {
        match self.stack.pop() {
            Some(place) => Ok(Some(place)),
            None => self.on_empty(),
        }
    }

    fn on_empty<T>(&self) -> NavigationResult<Option<T>> {
        match self.policy {
            EmptyPopPolicy::Error => Err(NavigationError::NoHistory),
            EmptyPopPolicy::Ignore => Ok(None),
        }
    }

    /// Drop the top entry if it is `expected`
    ///
    /// Used when a pop commits, since a `clear` may have run while the
    /// transition was in flight.
    pub fn discard_top(&mut self, expected: &P) -> bool
    where
        P: PartialEq,
    {
        if self.stack.last() == Some(expected) {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    /// Forget every entry
    pub fn clear(&mut self) {
        self.stack.clear();
    }

    /// Entries, bottom of the stack first
    pub fn entries(&self) -> &[P] {
        &self.stack
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Check if there is nowhere to go back to
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Empty-pop policy in effect
    pub fn policy(&self) -> EmptyPopPolicy {
        self.policy
    }
}
