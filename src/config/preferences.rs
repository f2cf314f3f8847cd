//! Display preferences for the button grid
//!
//! These only affect rendering in the view layer, never trigger semantics.

use serde::{Deserialize, Serialize};

use crate::constants::defaults::preferences as limits;

/// Color scheme of the web grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(alias = "buttons_per_row", default = "default_buttons_per_row")]
    pub buttons_per_row: u32,
    #[serde(alias = "button_height", default = "default_button_height")]
    pub button_height: u32,
    #[serde(alias = "button_width", default = "default_button_width")]
    pub button_width: u32,
}

fn default_buttons_per_row() -> u32 {
    limits::BUTTONS_PER_ROW
}

fn default_button_height() -> u32 {
    limits::BUTTON_HEIGHT
}

fn default_button_width() -> u32 {
    limits::BUTTON_WIDTH
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            buttons_per_row: default_buttons_per_row(),
            button_height: default_button_height(),
            button_width: default_button_width(),
        }
    }
}

impl Preferences {
    /// Clamp every dimension into the range the grid can render
    pub fn clamped(self) -> Self {
        Self {
            theme: self.theme,
            buttons_per_row: self
                .buttons_per_row
                .clamp(limits::BUTTONS_PER_ROW_MIN, limits::BUTTONS_PER_ROW_MAX),
            button_height: self
                .button_height
                .clamp(limits::BUTTON_HEIGHT_MIN, limits::BUTTON_HEIGHT_MAX),
            button_width: self
                .button_width
                .clamp(limits::BUTTON_WIDTH_MIN, limits::BUTTON_WIDTH_MAX),
        }
    }
}
