//! Request dispatcher over the store and trigger engine
//!
//! Synchronous on purpose: callers on an async runtime run [`ControlSurface::handle`]
//! on a blocking worker, since triggers block for the whole key sequence.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{Button, Chord};
use crate::control::protocol::{ButtonView, DeckSnapshot, ProfileSummary, Request, Response};
use crate::error::{ItemKind, StoreError, StoreResult};
use crate::store::{ActiveView, ConfigStore, Selection};
use crate::trigger::{TriggerEngine, TriggerOutcome};

#[derive(Clone)]
pub struct ControlSurface {
    store: Arc<ConfigStore>,
    engine: Arc<TriggerEngine>,
}

impl ControlSurface {
    pub fn new(store: Arc<ConfigStore>, engine: Arc<TriggerEngine>) -> Self {
        Self { store, engine }
    }

    /// Handle one request; failures come back as `Response::Error`
    pub fn handle(&self, request: Request) -> Response {
        debug!(?request, "Control request");
        match self.dispatch(request) {
            Ok(response) => response,
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Control request failed");
                e.into()
            }
        }
    }

    fn dispatch(&self, request: Request) -> StoreResult<Response> {
        let store = &self.store;
        let response = match request {
            Request::Snapshot => Response::Snapshot(self.snapshot()),
            Request::SetProfile { name } => selection(store.set_active_profile(&name)?),
            Request::SetGroup { name } => selection(store.set_active_group(&name)?),
            Request::Trigger {
                id,
                hotkey,
                sequence,
                is_toggle,
                state,
            } => self.trigger(id, hotkey, sequence, is_toggle, state)?,
            Request::SetButtonState { id, state } => {
                self.engine.sync(&store.active_view());
                self.engine.set_toggle_state(id, state);
                Response::ButtonState { id, state }
            }
            Request::GetButtonState { id } => {
                self.engine.sync(&store.active_view());
                Response::ButtonState {
                    id,
                    state: self.engine.get_toggle_state(id),
                }
            }
            Request::SavePreferences { preferences } => {
                Response::Preferences(store.save_preferences(preferences)?)
            }
            Request::AddProfile { name } => {
                store.add_profile(&name)?;
                Response::Done
            }
            Request::RenameProfile { old, new } => {
                store.rename_profile(&old, &new)?;
                Response::Done
            }
            Request::DeleteProfile { name } => {
                store.delete_profile(&name)?;
                Response::Done
            }
            Request::AddGroup { profile, name } => {
                store.add_group(&profile, &name)?;
                Response::Done
            }
            Request::RenameGroup { profile, old, new } => {
                store.rename_group(&profile, &old, &new)?;
                Response::Done
            }
            Request::DeleteGroup { profile, name } => {
                store.delete_group(&profile, &name)?;
                Response::Done
            }
            Request::AddButton {
                profile,
                group,
                button,
            } => Response::ButtonIndex {
                index: store.add_button(&profile, &group, button)?,
            },
            Request::UpdateButton {
                profile,
                group,
                index,
                button,
            } => {
                store.update_button(&profile, &group, index, button)?;
                Response::Done
            }
            Request::DuplicateButton {
                profile,
                group,
                index,
            } => Response::ButtonIndex {
                index: store.duplicate_button(&profile, &group, index)?,
            },
            Request::DeleteButton {
                profile,
                group,
                index,
            } => {
                store.delete_button(&profile, &group, index)?;
                Response::Done
            }
            Request::Save => {
                store.save()?;
                Response::Done
            }
        };
        Ok(response)
    }

    /// Active group buttons with their toggle states, plus names and preferences
    pub fn snapshot(&self) -> DeckSnapshot {
        let (revision, config) = self.store.versioned_snapshot();
        let view = ActiveView {
            revision,
            buttons: config.active_buttons().to_vec(),
        };
        self.engine.sync(&view);

        let buttons = view
            .buttons
            .into_iter()
            .enumerate()
            .map(|(id, button)| ButtonView {
                id,
                active: button.is_toggle && self.engine.get_toggle_state(id),
                button,
            })
            .collect();

        DeckSnapshot {
            profiles: config
                .profiles
                .iter()
                .map(|p| ProfileSummary {
                    name: p.name.clone(),
                    groups: p.groups.iter().map(|g| g.name.clone()).collect(),
                })
                .collect(),
            active_profile: config.active_profile,
            active_group: config.active_group,
            buttons,
            preferences: config.default_preferences,
        }
    }

    /// Fire the keys a request carries, or the stored keys of button `id`
    fn trigger(
        &self,
        id: usize,
        hotkey: Chord,
        sequence: Vec<Chord>,
        is_toggle: Option<bool>,
        state: Option<bool>,
    ) -> StoreResult<Response> {
        // Config read under the store lock; injection happens after it is released
        let view = self.store.active_view();
        self.engine.sync(&view);
        let stored = view.buttons.get(id);

        let carried = hotkey.iter().chain(sequence.iter().flatten()).next().is_some();
        // A stored button keeps its own toggle flag; only ad-hoc buttons take the request's
        let button = match (stored, carried) {
            (Some(stored), true) => Button {
                hotkey,
                sequence,
                ..stored.clone()
            },
            (Some(stored), false) => stored.clone(),
            (None, true) => Button {
                text: format!("Button {}", id),
                hotkey,
                sequence,
                is_toggle: is_toggle.unwrap_or(false),
                ..Button::default()
            },
            (None, false) => return Err(StoreError::not_found(ItemKind::Button, id.to_string())),
        };

        let response = match self.engine.evaluate_trigger(id, &button, state)? {
            TriggerOutcome::Fired { intents } => Response::Triggered {
                fired: true,
                intents: intents.len(),
            },
            TriggerOutcome::Suppressed => Response::Triggered {
                fired: false,
                intents: 0,
            },
        };
        Ok(response)
    }
}

fn selection(selection: Selection) -> Response {
    Response::Selection {
        active_profile: selection.active_profile,
        active_group: selection.active_group,
    }
}
