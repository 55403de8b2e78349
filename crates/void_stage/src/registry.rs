//! Place registry
//!
//! Validated, immutable mapping from place to the units it requires.

use std::collections::{HashMap, HashSet};

use crate::config::RegistryConfig;
use crate::error::{ConfigError, NavigationError, NavigationResult};
use crate::Key;

/// Immutable place → units mapping plus the common units
#[derive(Debug, Clone)]
pub struct PlaceRegistry<P: Key, U: Key> {
    /// Units required by each place, deduplicated, in declaration order
    places: HashMap<P, Vec<U>>,
    /// Place declaration order
    order: Vec<P>,
    /// Units loaded for the registry's whole lifetime
    common: Vec<U>,
}

impl<P: Key, U: Key> PlaceRegistry<P, U> {
    /// Build a registry from a configuration source
    ///
    /// Fails if the source declares no places or declares a place twice.
    pub fn from_config(config: RegistryConfig<P, U>) -> Result<Self, ConfigError> {
        if config.places.is_empty() {
            return Err(ConfigError::NoPlaces);
        }

        let mut places = HashMap::with_capacity(config.places.len());
        let mut order = Vec::with_capacity(config.places.len());

        for place in config.places {
            if places.contains_key(&place.name) {
                return Err(ConfigError::DuplicatePlace(format!("{:?}", place.name)));
            }
            order.push(place.name.clone());
            places.insert(place.name, dedup(place.units));
        }

        Ok(Self {
            places,
            order,
            common: dedup(config.common),
        })
    }

    /// Units required by a place
    pub fn units_for(&self, place: &P) -> NavigationResult<&[U]> {
        self.places
            .get(place)
            .map(|units| units.as_slice())
            .ok_or_else(|| NavigationError::UnknownPlace(format!("{:?}", place)))
    }

    /// Check if a place is registered
    pub fn contains(&self, place: &P) -> bool {
        self.places.contains_key(place)
    }

    /// Common units
    pub fn common_units(&self) -> &[U] {
        &self.common
    }

    /// Check if a unit is common
    pub fn is_common(&self, unit: &U) -> bool {
        self.common.contains(unit)
    }

    /// Registered places in declaration order
    pub fn places(&self) -> impl Iterator<Item = &P> {
        self.order.iter()
    }

    /// Number of registered places
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always false once constructed
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<P: Key, U: Key> TryFrom<RegistryConfig<P, U>> for PlaceRegistry<P, U> {
    type Error = ConfigError;

    fn try_from(config: RegistryConfig<P, U>) -> Result<Self, Self::Error> {
        Self::from_config(config)
    }
}

/// Drop repeated units, keeping the first occurrence
fn dedup<U: Key>(units: Vec<U>) -> Vec<U> {
    let mut seen = HashSet::with_capacity(units.len());
    units.into_iter().filter(|u| seen.insert(u.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RegistryConfig<&'static str, &'static str> {
        RegistryConfig::new()
            .with_common(["Perm"])
            .with_place("First", ["Stage1", "Modal1"])
            .with_place("Second", ["Stage2", "Shared"])
    }

    #[test]
    fn test_lookup() {
        let registry = PlaceRegistry::from_config(sample()).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert_eq!(registry.units_for(&"First").unwrap(), &["Stage1", "Modal1"]);
        assert_eq!(registry.common_units(), &["Perm"]);
        assert!(registry.is_common(&"Perm"));
        assert!(!registry.is_common(&"Shared"));
        assert_eq!(registry.places().copied().collect::<Vec<_>>(), vec!["First", "Second"]);
    }

    #[test]
    fn test_unknown_place() {
        let registry = PlaceRegistry::from_config(sample()).unwrap();
        assert!(!registry.contains(&"Nowhere"));
        assert!(matches!(
            registry.units_for(&"Nowhere"),
            Err(NavigationError::UnknownPlace(_))
        ));
    }

    #[test]
    fn test_empty_config_rejected() {
        let config: RegistryConfig<&str, &str> = RegistryConfig::new().with_common(["Perm"]);
        assert!(matches!(
            PlaceRegistry::from_config(config),
            Err(ConfigError::NoPlaces)
        ));
    }

    #[test]
    fn test_duplicate_place_rejected() {
        let config = sample().with_place("First", ["Other"]);
        assert!(matches!(
            PlaceRegistry::try_from(config),
            Err(ConfigError::DuplicatePlace(_))
        ));
    }

    #[test]
    fn test_units_deduplicated_in_order() {
        let config = RegistryConfig::new()
            .with_common(["Perm", "Perm"])
            .with_place("Only", ["B", "A", "B", "C", "A"]);
        let registry = PlaceRegistry::from_config(config).unwrap();

        assert_eq!(registry.units_for(&"Only").unwrap(), &["B", "A", "C"]);
        assert_eq!(registry.common_units(), &["Perm"]);
    }
}
