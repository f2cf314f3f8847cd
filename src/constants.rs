//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Input event constants (from evdev)
pub mod input {
    /// Key release event value
    pub const KEY_RELEASE: i32 = 0;

    /// Key press event value
    pub const KEY_PRESS: i32 = 1;

    /// Name advertised by the virtual keyboard created for injection
    pub const VIRTUAL_DEVICE_NAME: &str = "mobile-deck virtual keyboard";

    /// Key symbols offered by the button editor.
    /// The data model accepts any string; this is only the known vocabulary.
    pub const AVAILABLE_KEYS: &[&str] = &[
        "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m",
        "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
        "0", "1", "2", "3", "4", "5", "6", "7", "8", "9",
        "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12",
        "ctrl", "alt", "shift", "space", "tab", "enter", "backspace", "delete",
        "up", "down", "left", "right", "escape", "home", "end", "page_up", "page_down",
        "insert", "print_screen", "caps_lock", "num_lock", "scroll_lock", "pause",
    ];
}

/// Configuration paths and filenames
pub mod config {
    /// Application directory name under XDG config
    pub const APP_DIR: &str = "mobile-deck";

    /// Configuration filename
    pub const FILENAME: &str = "config.json";

    /// Environment variable overriding the configuration directory
    pub const DIR_ENV_VAR: &str = "MOBILE_DECK_CONFIG_DIR";

    /// Suffix of the scratch file written before the atomic rename
    pub const TEMP_SUFFIX: &str = "tmp";

    /// Suffix of the file a backup is unpacked to and checked in before it replaces the config
    pub const RESTORE_SUFFIX: &str = "restore";

    /// Infix for quarantined unparsable configs (followed by a timestamp)
    pub const CORRUPT_INFIX: &str = "corrupt";

    /// Control socket filename (placed next to the config file)
    pub const SOCKET_FILENAME: &str = "mobile-deck.sock";

    pub mod backup {
        /// Subdirectory holding backup archives
        pub const SUBDIR: &str = "backups";

        /// Automatic backups kept after pruning (manual backups are never pruned)
        pub const AUTO_RETENTION: u32 = 5;

        /// Minimum days between automatic backups
        pub const AUTO_INTERVAL_DAYS: u32 = 1;
    }
}

/// Default configuration values
/// These are used when creating new profiles, groups, buttons or missing config fields
pub mod defaults {
    /// Store structure
    pub mod store {
        /// Name of the profile created for an empty store
        pub const PROFILE_NAME: &str = "Default";

        /// Name of the group created inside every new profile
        pub const GROUP_NAME: &str = "Main";

        /// Text appended to the label of a duplicated button
        pub const COPY_SUFFIX: &str = " (Copy)";
    }

    /// Button editor defaults
    pub mod button {
        /// Label given to a freshly created button
        pub const TEXT: &str = "New Button";

        /// Default background color
        pub const BACKGROUND_COLOR: &str = "#3498db";

        /// Default label color
        pub const TEXT_COLOR: &str = "#ffffff";

        /// Default hotkey chord
        pub const HOTKEY: &[&str] = &["f1"];
    }

    /// Grid display preferences
    pub mod preferences {
        /// Buttons rendered per grid row
        pub const BUTTONS_PER_ROW: u32 = 3;
        pub const BUTTONS_PER_ROW_MIN: u32 = 1;
        pub const BUTTONS_PER_ROW_MAX: u32 = 6;

        /// Button height in CSS pixels
        pub const BUTTON_HEIGHT: u32 = 100;
        pub const BUTTON_HEIGHT_MIN: u32 = 50;
        pub const BUTTON_HEIGHT_MAX: u32 = 300;

        /// Button width in CSS pixels
        pub const BUTTON_WIDTH: u32 = 120;
        pub const BUTTON_WIDTH_MIN: u32 = 50;
        pub const BUTTON_WIDTH_MAX: u32 = 400;
    }
}
