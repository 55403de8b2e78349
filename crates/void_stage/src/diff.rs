//! Unit set diffing
//!
//! Pure computation of which units a transition has to unload and load.
//! Common units never appear on either side.

use std::collections::HashSet;

use crate::Key;

/// Units a transition has to touch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDelta<U> {
    /// Loaded units the target does not require
    pub to_unload: Vec<U>,
    /// Required units not yet loaded, in requirement order
    pub to_load: Vec<U>,
}

impl<U> Default for UnitDelta<U> {
    fn default() -> Self {
        Self {
            to_unload: Vec::new(),
            to_load: Vec::new(),
        }
    }
}

impl<U> UnitDelta<U> {
    /// Check if the transition needs no unit work at all
    pub fn is_empty(&self) -> bool {
        self.to_unload.is_empty() && self.to_load.is_empty()
    }

    /// Number of unit requests the transition will issue
    pub fn request_count(&self) -> usize {
        self.to_unload.len() + self.to_load.len()
    }
}

/// Loaded units that are not required
pub fn units_to_unload<U: Key>(loaded: &HashSet<U>, required: &[U], common: &[U]) -> Vec<U> {
    loaded
        .iter()
        .filter(|unit| !common.contains(*unit) && !required.contains(*unit))
        .cloned()
        .collect()
}

/// Required units that are not loaded
///
/// Call against the ledger as it stands after the unload phase.
pub fn units_to_load<U: Key>(loaded: &HashSet<U>, required: &[U], common: &[U]) -> Vec<U> {
    required
        .iter()
        .filter(|unit| !common.contains(*unit) && !loaded.contains(*unit))
        .cloned()
        .collect()
}

/// Full delta between the loaded set and a target's requirements
pub fn diff<U: Key>(loaded: &HashSet<U>, required: &[U], common: &[U]) -> UnitDelta<U> {
    UnitDelta {
        to_unload: units_to_unload(loaded, required, common),
        to_load: units_to_load(loaded, required, common),
    }
}
