//! Chord to key-intent expansion

use crate::config::{Button, Chord};
use crate::input::KeyIntent;

/// Expand chords into press/release intents
///
/// Each chord presses its keys in listed order, then releases them in reverse
/// order, before the next chord starts. Empty chords produce nothing.
pub fn chord_intents<'a>(chords: impl IntoIterator<Item = &'a Chord>) -> Vec<KeyIntent> {
    let mut intents = Vec::new();
    for chord in chords {
        intents.extend(chord.iter().cloned().map(KeyIntent::Press));
        intents.extend(chord.iter().rev().cloned().map(KeyIntent::Release));
    }
    intents
}

/// Intents for a button: hotkey chord first, then each sequence chord
pub fn button_intents(button: &Button) -> Vec<KeyIntent> {
    chord_intents(button.chords())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(keys: &[&str]) -> Chord {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn press(key: &str) -> KeyIntent {
        KeyIntent::Press(key.to_string())
    }

    fn release(key: &str) -> KeyIntent {
        KeyIntent::Release(key.to_string())
    }

    #[test]
    fn test_single_chord_releases_in_reverse() {
        let intents = chord_intents(&[chord(&["ctrl", "c"])]);
        assert_eq!(
            intents,
            vec![press("ctrl"), press("c"), release("c"), release("ctrl")]
        );
    }

    #[test]
    fn test_two_chord_sequence() {
        let button = Button::new("Copy Paste", vec![chord(&["ctrl", "c"]), chord(&["ctrl", "v"])]);
        assert_eq!(
            button_intents(&button),
            vec![
                press("ctrl"),
                press("c"),
                release("c"),
                release("ctrl"),
                press("ctrl"),
                press("v"),
                release("v"),
                release("ctrl"),
            ]
        );
    }

    #[test]
    fn test_three_key_chord_and_single_key_step() {
        let intents = chord_intents(&[chord(&["ctrl", "shift", "esc"]), chord(&["enter"])]);
        assert_eq!(
            intents,
            vec![
                press("ctrl"),
                press("shift"),
                press("esc"),
                release("esc"),
                release("shift"),
                release("ctrl"),
                press("enter"),
                release("enter"),
            ]
        );
    }

    #[test]
    fn test_empty_chords_produce_nothing() {
        assert!(chord_intents(&[Vec::new()]).is_empty());

        let mut button = Button::new("Step Only", vec![]);
        button.sequence = vec![chord(&["f5"])];
        assert_eq!(button_intents(&button), vec![press("f5"), release("f5")]);
    }
}
