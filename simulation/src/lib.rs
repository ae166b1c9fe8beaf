//! Virtual Pet Simulation Engine
//!
//! Derives a pet's hunger, happiness and health from the last saved snapshot
//! and the wall clock, runs the grace-period death timer and the one-way
//! growth into adulthood, and persists the result on a fixed tick.

pub mod components;
pub mod config;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod names;
pub mod persistence;
pub mod session;
pub mod systems;
pub mod tick_runner;

pub use components::*;
pub use config::SimulationConfig;
pub use error::{PetError, Result};
pub use handle::SessionHandle;
pub use metrics::{MetricsCollector, PetMetrics};
pub use persistence::{JsonFileStore, MemoryStore, PetStore};
pub use session::{InteractionOutcome, LoadOutcome, PetSession, TickReport};
