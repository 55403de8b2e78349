//! Stage configuration
//!
//! Data-driven descriptions of places and the navigator's behaviour.
//!
//! # Example Config File
//!
//! ```toml
//! common = ["Permanent"]
//!
//! [[places]]
//! name = "Title"
//! units = ["TitleStage", "TitleModal"]
//!
//! [[places]]
//! name = "Lobby"
//! units = ["LobbyStage", "Chat"]
//! ```

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// One place and the units it requires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceConfig<P, U> {
    /// Place identifier
    pub name: P,
    /// Units required while the place is current, in load order
    #[serde(default = "Vec::new")]
    pub units: Vec<U>,
}

impl<P, U> PlaceConfig<P, U> {
    /// Create a place entry
    pub fn new(name: P, units: impl IntoIterator<Item = U>) -> Self {
        Self {
            name,
            units: units.into_iter().collect(),
        }
    }
}

/// Registry source: common units plus every place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig<P, U> {
    /// Units loaded once for the navigator's lifetime
    #[serde(default = "Vec::new")]
    pub common: Vec<U>,
    /// Place definitions
    #[serde(default = "Vec::new")]
    pub places: Vec<PlaceConfig<P, U>>,
}

impl<P, U> Default for RegistryConfig<P, U> {
    fn default() -> Self {
        Self {
            common: Vec::new(),
            places: Vec::new(),
        }
    }
}

impl<P, U> RegistryConfig<P, U> {
    /// Create an empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add common units
    pub fn with_common(mut self, units: impl IntoIterator<Item = U>) -> Self {
        self.common.extend(units);
        self
    }

    /// Add a place
    pub fn with_place(mut self, name: P, units: impl IntoIterator<Item = U>) -> Self {
        self.places.push(PlaceConfig::new(name, units));
        self
    }
}

impl<P, U> RegistryConfig<P, U>
where
    P: DeserializeOwned,
    U: DeserializeOwned,
{
    /// Parse from a JSON document
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse from a TOML document
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a `.json` or `.toml` file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::Missing(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            Some("toml") => Self::from_toml_str(&content)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };

        log::info!("Loaded stage config from {}", path.display());
        Ok(config)
    }
}

/// What `pop` does when there is nothing to go back to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPopPolicy {
    /// Fail with `NoHistory`
    #[default]
    Error,
    /// Do nothing
    Ignore,
}

/// Navigator behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Empty-history pop behaviour
    pub empty_pop: EmptyPopPolicy,
    /// Buffered events per stream subscriber before it starts lagging
    pub event_capacity: usize,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            empty_pop: EmptyPopPolicy::Error,
            event_capacity: 64,
        }
    }
}

impl NavigatorConfig {
    /// Set the empty-history pop policy
    pub fn with_empty_pop(mut self, policy: EmptyPopPolicy) -> Self {
        self.empty_pop = policy;
        self
    }

    /// Set the event stream capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}
