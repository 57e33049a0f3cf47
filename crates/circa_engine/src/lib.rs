//! # Circa Engine
//!
//! Drives the bio-state forward in virtual time.
//!
//! ## Architecture
//!
//! [`BioEngine`] spawns one background task that owns the store and the
//! [`SimulationClock`]. The task:
//! 1. Ticks on a fixed wall-clock interval while the clock is running
//! 2. Converts each tick's real elapsed time into virtual hours
//! 3. Decays caffeine and refreshes receptor blockage
//! 4. Applies collaborator mutations between ticks
//!
//! Snapshots are published on a `watch` channel, so readers never block the
//! driver.
//!
//! ## Speeds
//!
//! - Real time: 1 simulated second per second
//! - 60x: 1 simulated minute per second
//! - 3600x: 1 simulated hour per second

mod clock;
mod engine;
mod error;

pub use clock::{ClockState, ClockStatus, SimulationClock, SpeedFactor, TickConfig};
pub use engine::{BioEngine, Mutation};
pub use error::EngineError;
