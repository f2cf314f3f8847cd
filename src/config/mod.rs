//! Configuration management
//!
//! Handles the profile/group/button tree with JSON persistence.
//! Supports multiple profiles, each with named groups of macro buttons,
//! plus grid display preferences and compressed backups.

pub mod backup;
pub mod button;
pub mod preferences;
pub mod profile;

pub use button::{Button, Chord};
pub use preferences::{Preferences, Theme};
pub use profile::{Config, Group, Profile};
