//! Keyboard keys delivered to form components.
//!
//! Only the keys components actually react to get their own variant; text
//! entry arrives as whole input values, not per-character keys.

use serde::Deserialize;

/// Key codes, deserialized from DOM key names
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Key {
    // Navigation
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,

    // Special keys
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Space,

    // Unknown key
    Unknown,
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::from_name(&name)
    }
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` name to a key
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowUp" | "Up" => Key::ArrowUp,
            "ArrowDown" | "Down" => Key::ArrowDown,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "Home" => Key::Home,
            "End" => Key::End,
            "Enter" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            "Tab" => Key::Tab,
            "Backspace" => Key::Backspace,
            "Delete" | "Del" => Key::Delete,
            " " | "Space" | "Spacebar" => Key::Space,
            _ => Key::Unknown,
        }
    }

    /// Arrow keys that move a list cursor
    pub fn is_vertical_arrow(&self) -> bool {
        matches!(self, Key::ArrowUp | Key::ArrowDown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dom_names() {
        assert_eq!(Key::from_name("ArrowDown"), Key::ArrowDown);
        assert_eq!(Key::from_name("Esc"), Key::Escape);
        assert_eq!(Key::from_name(" "), Key::Space);
        assert_eq!(Key::from_name("F13"), Key::Unknown);
    }

    #[test]
    fn test_vertical_arrows() {
        assert!(Key::ArrowUp.is_vertical_arrow());
        assert!(Key::ArrowDown.is_vertical_arrow());
        assert!(!Key::ArrowLeft.is_vertical_arrow());
        assert!(!Key::Enter.is_vertical_arrow());
    }
}
