//! Trigger engine: turns button presses into ordered key intents

pub mod engine;
pub mod intents;

pub use engine::{TriggerEngine, TriggerOutcome};
