//! Error types for stage navigation

use thiserror::Error;

/// Configuration errors
///
/// Every variant surfaces as [`NavigationError::ConfigInvalid`] once it
/// reaches the navigator.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Stage configuration is missing: {0}")]
    Missing(String),

    #[error("Stage configuration requires at least one place")]
    NoPlaces,

    #[error("Duplicate place in stage configuration: {0}")]
    DuplicatePlace(String),

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to parse stage configuration: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failure of a single unit request, reported by the unit backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unit '{unit}': {reason}")]
pub struct LoaderError {
    /// Unit label
    pub unit: String,
    /// Backend-provided reason
    pub reason: String,
}

impl LoaderError {
    /// Create a new loader error for a unit
    pub fn new(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            reason: reason.into(),
        }
    }
}

/// Navigation errors
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Invalid stage configuration: {0}")]
    ConfigInvalid(#[from] ConfigError),

    #[error("Unknown place: {0}")]
    UnknownPlace(String),

    #[error("There is no navigation history to go back to")]
    NoHistory,

    #[error("Failed to load {failed} unit(s), first was '{unit}': {reason}")]
    LoadFailure {
        unit: String,
        reason: String,
        failed: usize,
    },

    #[error("Failed to unload {failed} unit(s), first was '{unit}': {reason}")]
    UnloadFailure {
        unit: String,
        reason: String,
        failed: usize,
    },
}

impl NavigationError {
    /// Check if this error came from a unit request rather than from the caller
    pub fn is_unit_failure(&self) -> bool {
        matches!(self, Self::LoadFailure { .. } | Self::UnloadFailure { .. })
    }
}

pub type NavigationResult<T> = Result<T, NavigationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: NavigationError = ConfigError::NoPlaces.into();
        assert!(matches!(err, NavigationError::ConfigInvalid(ConfigError::NoPlaces)));
        assert!(!err.is_unit_failure());
    }

    #[test]
    fn test_display() {
        let err = NavigationError::LoadFailure {
            unit: "\"Stage1\"".to_string(),
            reason: "missing".to_string(),
            failed: 2,
        };
        assert!(err.is_unit_failure());
        assert_eq!(
            err.to_string(),
            "Failed to load 2 unit(s), first was '\"Stage1\"': missing"
        );

        let loader = LoaderError::new("Modal", "timeout");
        assert_eq!(loader.to_string(), "unit 'Modal': timeout");
    }
}
