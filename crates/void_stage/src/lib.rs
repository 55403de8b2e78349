//! Void Stage - Stage Navigation
//!
//! Moves an application between named places (stages), each of which needs
//! a set of units (scenes) loaded.
//!
//! # Features
//!
//! - Minimal unload/load delta between places; shared units never reload
//! - Common units loaded once and kept for the navigator's lifetime
//! - Replace / push / pop / reset with back-navigation history
//! - Async unit barriers: a phase completes only when every unit has
//! - Serialized transitions, even when callers do not await each call
//! - Transitioning / transitioned notifications via callbacks or streams
//!
//! # Example
//!
//! ```ignore
//! use void_stage::prelude::*;
//!
//! let config = RegistryConfig::load("stages.toml")?;
//! let navigator = Navigator::from_config(config, loader, NavigatorConfig::default()).await?;
//!
//! navigator.subscribe(|event| log::info!("{:?}", event));
//!
//! navigator.replace("Title".to_string()).await?;
//! navigator.push("Lobby".to_string()).await?;
//! navigator.pop().await?;
//! ```

use std::fmt::Debug;
use std::hash::Hash;

pub mod config;
pub mod diff;
pub mod error;
pub mod events;
pub mod handle;
pub mod history;
pub mod loader;
pub mod navigator;
pub mod registry;

/// Identifier usable as a place or unit
pub trait Key: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

// Blanket implementation
impl<T: Clone + Eq + Hash + Debug + Send + Sync + 'static> Key for T {}

pub mod prelude {
    pub use crate::config::{EmptyPopPolicy, NavigatorConfig, PlaceConfig, RegistryConfig};
    pub use crate::diff::UnitDelta;
    pub use crate::error::{ConfigError, LoaderError, NavigationError, NavigationResult};
    pub use crate::events::{ListenerId, TransitionEvent, TransitionEvents};
    pub use crate::handle::{HandleBackend, HandleLoader, RequestState, UnitHandle};
    pub use crate::history::NavigationHistory;
    pub use crate::loader::{UnitLedger, UnitLoader};
    pub use crate::navigator::Navigator;
    pub use crate::registry::PlaceRegistry;
    pub use crate::Key;
}

pub use prelude::*;
