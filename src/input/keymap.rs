//! Key symbol to evdev key code mapping

use evdev::KeyCode;
use std::str::FromStr;

/// Resolve a key symbol ("ctrl", "a", "f5", "page_up") to an evdev key code
///
/// Symbols are matched case-insensitively. Names outside the editor vocabulary
/// fall back to evdev's own `KEY_*` parser, so "KEY_VOLUMEUP" or "volumeup" work too.
pub fn symbol_to_key_code(symbol: &str) -> Option<KeyCode> {
    let name = symbol.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }

    let code = match name.as_str() {
        // Modifiers
        "ctrl" | "ctrl_l" | "control" => KeyCode::KEY_LEFTCTRL,
        "ctrl_r" => KeyCode::KEY_RIGHTCTRL,
        "shift" | "shift_l" => KeyCode::KEY_LEFTSHIFT,
        "shift_r" => KeyCode::KEY_RIGHTSHIFT,
        "alt" | "alt_l" => KeyCode::KEY_LEFTALT,
        "alt_r" | "alt_gr" => KeyCode::KEY_RIGHTALT,
        "cmd" | "cmd_l" | "super" | "win" | "meta" => KeyCode::KEY_LEFTMETA,
        "cmd_r" => KeyCode::KEY_RIGHTMETA,

        // Named control keys
        "space" => KeyCode::KEY_SPACE,
        "tab" => KeyCode::KEY_TAB,
        "enter" | "return" => KeyCode::KEY_ENTER,
        "backspace" => KeyCode::KEY_BACKSPACE,
        "delete" | "del" => KeyCode::KEY_DELETE,
        "escape" | "esc" => KeyCode::KEY_ESC,
        "insert" => KeyCode::KEY_INSERT,
        "home" => KeyCode::KEY_HOME,
        "end" => KeyCode::KEY_END,
        "page_up" | "pageup" => KeyCode::KEY_PAGEUP,
        "page_down" | "pagedown" => KeyCode::KEY_PAGEDOWN,
        "up" => KeyCode::KEY_UP,
        "down" => KeyCode::KEY_DOWN,
        "left" => KeyCode::KEY_LEFT,
        "right" => KeyCode::KEY_RIGHT,
        "print_screen" | "printscreen" => KeyCode::KEY_SYSRQ,
        "caps_lock" => KeyCode::KEY_CAPSLOCK,
        "num_lock" => KeyCode::KEY_NUMLOCK,
        "scroll_lock" => KeyCode::KEY_SCROLLLOCK,
        "pause" => KeyCode::KEY_PAUSE,
        "menu" => KeyCode::KEY_COMPOSE,

        // Media keys
        "media_play_pause" => KeyCode::KEY_PLAYPAUSE,
        "media_next" => KeyCode::KEY_NEXTSONG,
        "media_previous" => KeyCode::KEY_PREVIOUSSONG,
        "media_volume_up" => KeyCode::KEY_VOLUMEUP,
        "media_volume_down" => KeyCode::KEY_VOLUMEDOWN,
        "media_volume_mute" => KeyCode::KEY_MUTE,

        // Punctuation
        "-" => KeyCode::KEY_MINUS,
        "=" => KeyCode::KEY_EQUAL,
        "[" => KeyCode::KEY_LEFTBRACE,
        "]" => KeyCode::KEY_RIGHTBRACE,
        ";" => KeyCode::KEY_SEMICOLON,
        "'" => KeyCode::KEY_APOSTROPHE,
        "`" => KeyCode::KEY_GRAVE,
        "\\" => KeyCode::KEY_BACKSLASH,
        "," => KeyCode::KEY_COMMA,
        "." => KeyCode::KEY_DOT,
        "/" => KeyCode::KEY_SLASH,

        // Letters, digits, function keys ("a" -> KEY_A, "7" -> KEY_7, "f5" -> KEY_F5)
        _ => return linux_name_to_key_code(&name),
    };

    Some(code)
}

/// Parse via evdev's `KEY_*` names, with or without the prefix
fn linux_name_to_key_code(name: &str) -> Option<KeyCode> {
    let upper = name.to_uppercase();
    let linux_name = if upper.starts_with("KEY_") {
        upper
    } else {
        format!("KEY_{}", upper)
    };

    KeyCode::from_str(&linux_name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::input::AVAILABLE_KEYS;

    #[test]
    fn test_every_editor_key_resolves() {
        for key in AVAILABLE_KEYS {
            assert!(
                symbol_to_key_code(key).is_some(),
                "editor key '{}' has no key code",
                key
            );
        }
    }

    #[test]
    fn test_common_symbols() {
        assert_eq!(symbol_to_key_code("ctrl"), Some(KeyCode::KEY_LEFTCTRL));
        assert_eq!(symbol_to_key_code("C"), Some(KeyCode::KEY_C));
        assert_eq!(symbol_to_key_code("7"), Some(KeyCode::KEY_7));
        assert_eq!(symbol_to_key_code("f12"), Some(KeyCode::KEY_F12));
        assert_eq!(symbol_to_key_code("page_down"), Some(KeyCode::KEY_PAGEDOWN));
        assert_eq!(symbol_to_key_code("print_screen"), Some(KeyCode::KEY_SYSRQ));
    }

    #[test]
    fn test_linux_name_fallback() {
        assert_eq!(symbol_to_key_code("KEY_VOLUMEUP"), Some(KeyCode::KEY_VOLUMEUP));
        assert_eq!(symbol_to_key_code("volumedown"), Some(KeyCode::KEY_VOLUMEDOWN));
    }

    #[test]
    fn test_unknown_symbols() {
        assert_eq!(symbol_to_key_code(""), None);
        assert_eq!(symbol_to_key_code("not_a_key"), None);
    }
}
