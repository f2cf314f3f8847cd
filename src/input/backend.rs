//! Key injection backend abstraction layer
//!
//! Provides a trait-based interface for delivering key intents to the host.
//! Currently supports:
//! - uinput virtual keyboard (default, requires write access to /dev/uinput)
//! - log-only dry run (no permissions, nothing is typed)

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A single press or release instruction for one key symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "key", rename_all = "lowercase")]
pub enum KeyIntent {
    Press(String),
    Release(String),
}

impl KeyIntent {
    pub fn key(&self) -> &str {
        match self {
            KeyIntent::Press(key) | KeyIntent::Release(key) => key,
        }
    }

    pub fn is_press(&self) -> bool {
        matches!(self, KeyIntent::Press(_))
    }
}

impl std::fmt::Display for KeyIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyIntent::Press(key) => write!(f, "press({})", key),
            KeyIntent::Release(key) => write!(f, "release({})", key),
        }
    }
}

/// Injection backend type selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InjectorBackendType {
    /// Virtual evdev keyboard via /dev/uinput
    #[default]
    Uinput,
    /// Log intents without typing anything
    Log,
}

/// Key injection backend trait
///
/// Implementations execute intents one at a time, in order. A failure part-way
/// through a sequence is not rolled back.
pub trait KeyInjector: Send + Sync {
    /// Deliver one key intent to the host
    fn send(&self, intent: &KeyIntent) -> Result<()>;

    /// Get human-readable backend name
    fn name(&self) -> &'static str;

    /// Deliver a whole intent list, stopping at the first failure
    fn send_all(&self, intents: &[KeyIntent]) -> Result<()> {
        for intent in intents {
            self.send(intent)?;
        }
        Ok(())
    }
}
