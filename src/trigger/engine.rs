//! Trigger engine: toggle gating and key intent execution
//!
//! Owns the toggle state table (button index -> pressed). The table belongs to
//! one revision of the active group and is rebuilt, every toggle button off,
//! as soon as a newer revision is observed.
//!
//! Toggle policy: a toggle button fires only while its recorded state is on.
//! A request carrying the state produced by the click records it first, so
//! switching a toggle on fires its keys and switching it off never does.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::Button;
use crate::error::{StoreError, StoreResult};
use crate::input::{KeyIntent, KeyInjector};
use crate::store::ActiveView;
use crate::trigger::intents::button_intents;

/// Result of a trigger request that did not fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum TriggerOutcome {
    /// Keys were delivered
    Fired { intents: Vec<KeyIntent> },
    /// Toggle button recorded as off; nothing was sent
    Suppressed,
}

#[derive(Debug, Default)]
struct ToggleTable {
    /// Store revision the table was built for
    revision: Option<u64>,
    states: HashMap<usize, bool>,
}

pub struct TriggerEngine {
    toggles: Mutex<ToggleTable>,
    injector: Arc<dyn KeyInjector>,
    /// Held for a whole intent sequence so concurrent triggers never interleave chords
    delivery: Mutex<()>,
}

impl TriggerEngine {
    pub fn new(injector: Arc<dyn KeyInjector>) -> Self {
        Self {
            toggles: Mutex::new(ToggleTable::default()),
            injector,
            delivery: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ToggleTable> {
        self.toggles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rebuild the toggle table if the active group changed since the last sync
    pub fn sync(&self, view: &ActiveView) {
        let mut table = self.lock();
        if table.revision == Some(view.revision) {
            return;
        }
        reset_table(&mut table, view.revision, &view.buttons);
    }

    /// Record the on/off state of a button, independent of any trigger
    pub fn set_toggle_state(&self, button_id: usize, state: bool) {
        debug!(button = button_id, state, "Recording toggle state");
        self.lock().states.insert(button_id, state);
    }

    /// Recorded state of a button, `false` for unknown ids
    pub fn get_toggle_state(&self, button_id: usize) -> bool {
        self.lock().states.get(&button_id).copied().unwrap_or(false)
    }

    /// Decide whether `button` fires and deliver its keys if it does
    ///
    /// `requested_state` is the toggle state produced by the click, if the caller
    /// sent one; it is recorded before gating. Injection runs without holding
    /// the toggle lock, but sequences from concurrent triggers are delivered
    /// one after another. A delivery failure is reported as `InjectionFailure`
    /// and leaves the table untouched; keys already pressed are not released.
    pub fn evaluate_trigger(
        &self,
        button_id: usize,
        button: &Button,
        requested_state: Option<bool>,
    ) -> StoreResult<TriggerOutcome> {
        if button.is_toggle {
            let mut table = self.lock();
            if let Some(state) = requested_state {
                table.states.insert(button_id, state);
            }
            let recorded = table.states.get(&button_id).copied().unwrap_or(false);
            if !recorded {
                debug!(button = button_id, text = %button.text, "Toggle is off, suppressing keys");
                return Ok(TriggerOutcome::Suppressed);
            }
        }

        let intents = button_intents(button);
        info!(
            button = button_id,
            text = %button.text,
            keys = %button.display_keys(),
            backend = self.injector.name(),
            "Firing button"
        );

        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        self.injector.send_all(&intents).map_err(|e| {
            error!(button = button_id, error = %e, "Key injection failed");
            StoreError::InjectionFailure(format!("{:#}", e))
        })?;

        Ok(TriggerOutcome::Fired { intents })
    }
}

fn reset_table(table: &mut ToggleTable, revision: u64, buttons: &[Button]) {
    table.revision = Some(revision);
    table.states = buttons
        .iter()
        .enumerate()
        .filter(|(_, button)| button.is_toggle)
        .map(|(index, _)| (index, false))
        .collect();
    debug!(revision, toggles = table.states.len(), "Toggle table rebuilt");
}
