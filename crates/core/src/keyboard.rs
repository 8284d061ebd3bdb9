//! Keyboard policy for the projector display.
//!
//! Key bindings:
//! - Escape / Backspace: return to the primary menu (secondary mode only)
//! - Space: swallowed while a secondary screen is shown
//! - `0`: toggle sleep mode
//! - any registered trigger key: show that secondary screen
//!
//! Input aimed at a text-entry field is ignored entirely.

use std::sync::Arc;

use serde::Deserialize;

use crate::model::SecondaryScreen;
use crate::screens::TriggerKeyIndex;

/// Key reserved for toggling sleep mode.
pub const SLEEP_TOGGLE_KEY: char = '0';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Backspace,
    Space,
    Char(char),
    Other(String),
}

impl Key {
    /// Parse a host key name (`"Escape"`, `"a"`, `" "`, ...).
    pub fn parse(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Key::Escape,
            "Backspace" => Key::Backspace,
            " " | "Space" | "Spacebar" => Key::Space,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => Key::Other(name.to_string()),
                }
            }
        }
    }
}

/// Where keyboard focus was when the key was pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputTarget {
    #[default]
    Display,
    TextEntry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub target: InputTarget,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            target: InputTarget::Display,
        }
    }

    pub fn in_text_entry(key: Key) -> Self {
        Self {
            key,
            target: InputTarget::TextEntry,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    ReturnToPrimary,
    ShowScreen(Arc<SecondaryScreen>),
    ToggleSleep,
}

/// Result of interpreting a key press.
///
/// `consumed` tells the host to suppress its default handling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyOutcome {
    pub consumed: bool,
    pub action: Option<KeyAction>,
}

impl KeyOutcome {
    fn ignored() -> Self {
        Self::default()
    }

    fn swallowed() -> Self {
        Self {
            consumed: true,
            action: None,
        }
    }

    fn act(action: KeyAction) -> Self {
        Self {
            consumed: true,
            action: Some(action),
        }
    }
}

/// Decide what a key press means in the current mode.
pub fn interpret(event: &KeyEvent, in_secondary: bool, index: &TriggerKeyIndex) -> KeyOutcome {
    if event.target == InputTarget::TextEntry {
        return KeyOutcome::ignored();
    }

    match &event.key {
        Key::Escape | Key::Backspace => {
            if in_secondary {
                KeyOutcome::act(KeyAction::ReturnToPrimary)
            } else {
                KeyOutcome::ignored()
            }
        }
        Key::Space if in_secondary => KeyOutcome::swallowed(),
        Key::Space => KeyOutcome::ignored(),
        Key::Char(c) if *c == SLEEP_TOGGLE_KEY => KeyOutcome::act(KeyAction::ToggleSleep),
        Key::Char(c) => {
            let mut buf = [0u8; 4];
            match index.lookup(c.encode_utf8(&mut buf)) {
                Some(screen) => KeyOutcome::act(KeyAction::ShowScreen(Arc::clone(screen))),
                None => KeyOutcome::ignored(),
            }
        }
        Key::Other(_) => KeyOutcome::ignored(),
    }
}
