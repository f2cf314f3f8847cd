//! Button definitions and key chord helpers

use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::error::{StoreError, StoreResult};

/// Opaque key name ("ctrl", "c", "f5", "page_up", ...)
pub type KeySymbol = String;

/// Keys pressed together, in press order
pub type Chord = Vec<KeySymbol>;

/// A single grid button
/// Serializes to: {"text", "backgroundColor", "textColor", "image"?, "hotkey", "sequence"?, "isToggle"}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Button {
    pub text: String,

    #[serde(alias = "color", default = "default_background_color")]
    pub background_color: String,

    #[serde(alias = "text_color", default = "default_text_color")]
    pub text_color: String,

    /// Image URL or path rendered behind the label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// First chord fired
    #[serde(default)]
    pub hotkey: Chord,

    /// Additional chords fired in order after `hotkey`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequence: Vec<Chord>,

    #[serde(alias = "is_toggle", default)]
    pub is_toggle: bool,
}

fn default_background_color() -> String {
    defaults::button::BACKGROUND_COLOR.to_string()
}

fn default_text_color() -> String {
    defaults::button::TEXT_COLOR.to_string()
}

impl Default for Button {
    fn default() -> Self {
        Self {
            text: defaults::button::TEXT.to_string(),
            background_color: default_background_color(),
            text_color: default_text_color(),
            image: None,
            hotkey: defaults::button::HOTKEY
                .iter()
                .map(|k| k.to_string())
                .collect(),
            sequence: Vec::new(),
            is_toggle: false,
        }
    }
}

impl Button {
    /// Create a button firing the given chords in order
    pub fn new(text: impl Into<String>, chords: Vec<Chord>) -> Self {
        let mut chords = chords.into_iter();
        Self {
            text: text.into(),
            hotkey: chords.next().unwrap_or_default(),
            sequence: chords.collect(),
            ..Self::default()
        }
    }

    /// All chords in firing order (hotkey first)
    pub fn chords(&self) -> impl Iterator<Item = &Chord> {
        std::iter::once(&self.hotkey)
            .chain(self.sequence.iter())
            .filter(|chord| !chord.is_empty())
    }

    /// Check whether any chord holds at least one key
    pub fn has_keys(&self) -> bool {
        self.chords().next().is_some()
    }

    /// Human-readable summary of every chord, e.g. "ctrl + c, ctrl + v"
    pub fn display_keys(&self) -> String {
        self.chords()
            .map(|chord| display_chord(chord))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Validate and normalize a button coming from an editor
    ///
    /// Trims text, colors and image; blank colors take editor defaults, a blank
    /// image becomes `None`. Empty chords are dropped and, if the hotkey itself
    /// is empty, the first sequence chord is promoted to hotkey.
    pub fn validated(mut self) -> StoreResult<Self> {
        self.text = self.text.trim().to_string();
        if self.text.is_empty() {
            return Err(StoreError::EmptyText);
        }

        self.background_color = non_blank_or(&self.background_color, default_background_color);
        self.text_color = non_blank_or(&self.text_color, default_text_color);
        self.image = self
            .image
            .map(|image| image.trim().to_string())
            .filter(|image| !image.is_empty());

        let mut chords: Vec<Chord> = std::iter::once(self.hotkey)
            .chain(self.sequence)
            .map(|chord| {
                chord
                    .into_iter()
                    .map(|key| key.trim().to_string())
                    .filter(|key| !key.is_empty())
                    .collect::<Chord>()
            })
            .filter(|chord| !chord.is_empty())
            .collect();

        if chords.is_empty() {
            return Err(StoreError::NoKeysDefined);
        }

        self.hotkey = chords.remove(0);
        self.sequence = chords;
        Ok(self)
    }

    /// Deep copy with the duplicate suffix appended to the label
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.text.push_str(defaults::store::COPY_SUFFIX);
        copy
    }
}

fn non_blank_or(value: &str, fallback: fn() -> String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        trimmed.to_string()
    }
}

/// Format a chord for display (e.g. "ctrl + shift + s")
pub fn display_chord(chord: &[KeySymbol]) -> String {
    chord.join(" + ")
}

/// Parse a chord written as "ctrl+shift+s"
/// Whitespace around keys is ignored, empty segments are dropped.
pub fn parse_chord(text: &str) -> Chord {
    text.split('+')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_lowercase)
        .collect()
}
