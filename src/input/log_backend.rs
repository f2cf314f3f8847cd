//! Dry-run injection backend: logs intents instead of typing them

use anyhow::Result;
use tracing::info;

use crate::input::backend::{KeyIntent, KeyInjector};
use crate::input::keymap::symbol_to_key_code;

pub struct LogInjector;

impl KeyInjector for LogInjector {
    fn send(&self, intent: &KeyIntent) -> Result<()> {
        match symbol_to_key_code(intent.key()) {
            Some(code) => info!(%intent, code = code.code(), "Dry run key event"),
            None => info!(%intent, "Dry run key event (unknown to uinput backend)"),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
