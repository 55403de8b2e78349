//! Simulated scene backend
//!
//! Stands in for an engine's scene subsystem: every request takes a fixed
//! amount of time, and selected scenes can be made to fail.

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use void_stage::{LoaderError, UnitLoader};

/// Scene backend with simulated latency
pub struct SimulatedScenes {
    latency: Duration,
    failing: HashSet<String>,
    scenes: Mutex<BTreeSet<String>>,
}

impl SimulatedScenes {
    /// Create a backend where each request takes `latency`
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failing: HashSet::new(),
            scenes: Mutex::new(BTreeSet::new()),
        }
    }

    /// Make requests for these scenes fail
    pub fn with_failing(mut self, scenes: impl IntoIterator<Item = String>) -> Self {
        self.failing.extend(scenes);
        self
    }

    /// Scenes currently loaded, sorted
    pub fn scenes(&self) -> Vec<String> {
        self.scenes.lock().iter().cloned().collect()
    }

    async fn settle(&self, scene: &str) -> Result<(), LoaderError> {
        tokio::time::sleep(self.latency).await;
        if self.failing.contains(scene) {
            return Err(LoaderError::new(scene, "simulated failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl UnitLoader<String> for SimulatedScenes {
    async fn load(&self, unit: &String) -> Result<(), LoaderError> {
        log::debug!("Loading scene '{}'", unit);
        self.settle(unit).await?;
        self.scenes.lock().insert(unit.clone());
        log::info!("Loaded scene '{}'", unit);
        Ok(())
    }

    async fn unload(&self, unit: &String) -> Result<(), LoaderError> {
        log::debug!("Unloading scene '{}'", unit);
        self.settle(unit).await?;
        self.scenes.lock().remove(unit);
        log::info!("Unloaded scene '{}'", unit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_scenes() {
        let backend = SimulatedScenes::new(Duration::from_millis(1))
            .with_failing(["Broken".to_string()]);

        backend.load(&"B".to_string()).await.unwrap();
        backend.load(&"A".to_string()).await.unwrap();
        assert_eq!(backend.scenes(), vec!["A".to_string(), "B".to_string()]);

        backend.unload(&"B".to_string()).await.unwrap();
        assert_eq!(backend.scenes(), vec!["A".to_string()]);

        let err = backend.load(&"Broken".to_string()).await.unwrap_err();
        assert_eq!(err.reason, "simulated failure");
        assert_eq!(backend.scenes(), vec!["A".to_string()]);
    }
}
