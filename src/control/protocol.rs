//! Control surface messages
//!
//! Transport-agnostic request/response contract between a view layer and the
//! store + trigger engine. Serialized as one JSON object per message.

use serde::{Deserialize, Serialize};

use crate::config::{Button, Chord, Preferences};
use crate::error::StoreError;

/// Requests sent from a view layer (web grid, editor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Active buttons, preferences, profile/group names
    Snapshot,
    SetProfile {
        name: String,
    },
    SetGroup {
        name: String,
    },
    /// Fire a button of the active group
    /// Without keys, the keys stored for `id` are used.
    Trigger {
        id: usize,
        #[serde(default)]
        hotkey: Chord,
        #[serde(default)]
        sequence: Vec<Chord>,
        #[serde(default)]
        is_toggle: Option<bool>,
        /// Toggle state produced by the click, recorded before gating
        #[serde(default)]
        state: Option<bool>,
    },
    SetButtonState {
        id: usize,
        state: bool,
    },
    GetButtonState {
        id: usize,
    },
    SavePreferences {
        preferences: Preferences,
    },
    AddProfile {
        name: String,
    },
    RenameProfile {
        old: String,
        new: String,
    },
    DeleteProfile {
        name: String,
    },
    AddGroup {
        profile: String,
        name: String,
    },
    RenameGroup {
        profile: String,
        old: String,
        new: String,
    },
    DeleteGroup {
        profile: String,
        name: String,
    },
    AddButton {
        profile: String,
        group: String,
        button: Button,
    },
    UpdateButton {
        profile: String,
        group: String,
        index: usize,
        button: Button,
    },
    DuplicateButton {
        profile: String,
        group: String,
        index: usize,
    },
    DeleteButton {
        profile: String,
        group: String,
        index: usize,
    },
    /// Commit the in-memory tree to disk
    Save,
}

/// Profile name with the names of its groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub name: String,
    pub groups: Vec<String>,
}

/// A button of the active group as rendered by the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonView {
    pub id: usize,
    #[serde(flatten)]
    pub button: Button,
    /// Recorded toggle state (always false for plain buttons)
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckSnapshot {
    pub active_profile: String,
    pub active_group: String,
    pub profiles: Vec<ProfileSummary>,
    pub buttons: Vec<ButtonView>,
    pub preferences: Preferences,
}

/// Responses sent back to the view layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Snapshot(DeckSnapshot),
    Selection {
        active_profile: String,
        active_group: String,
    },
    Triggered {
        fired: bool,
        intents: usize,
    },
    ButtonState {
        id: usize,
        state: bool,
    },
    Preferences(Preferences),
    /// Index of a created button
    ButtonIndex {
        index: usize,
    },
    Done,
    Error {
        kind: String,
        message: String,
    },
}

impl Response {
    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        Response::Error {
            kind: kind.to_string(),
            message: message.into(),
        }
    }
}

impl From<StoreError> for Response {
    fn from(err: StoreError) -> Self {
        Response::error(err.kind(), err.to_string())
    }
}
