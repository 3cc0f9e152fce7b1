//! Application input events

use serde::{Deserialize, Serialize};

/// Pointer buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Keyboard keys the viewer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Char(char),
    Home,
    Escape,
    Space,
    Enter,
    Left,
    Right,
    Up,
    Down,
    F(u8),
}

/// Modifier keys held while the event was produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    Push(MouseButton),
    Release(MouseButton),
    /// Pointer moved with a button held
    Drag(MouseButton),
    /// Pointer moved with no button held
    Move,
    Scroll { dx: f32, dy: f32 },
    KeyDown(Key),
    KeyUp(Key),
    Resize { width: u32, height: u32 },
    /// Start of a new frame
    Frame,
}

/// An input event as delivered to handlers.
///
/// Coordinates are in pixels relative to the view's lower left corner.
/// `time` is seconds since the application started.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub time: f64,
}

impl Event {
    /// Create an event at the origin with no modifiers
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            x: 0.0,
            y: 0.0,
            modifiers: Modifiers::NONE,
            time: 0.0,
        }
    }

    /// Set the pointer position
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn at_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    /// Button involved in a push, release or drag
    pub fn button(&self) -> Option<MouseButton> {
        match self.kind {
            EventKind::Push(b) | EventKind::Release(b) | EventKind::Drag(b) => Some(b),
            _ => None,
        }
    }

    /// Key involved in a key press or release
    pub fn key(&self) -> Option<Key> {
        match self.kind {
            EventKind::KeyDown(k) | EventKind::KeyUp(k) => Some(k),
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(
            self.kind,
            EventKind::Push(_)
                | EventKind::Release(_)
                | EventKind::Drag(_)
                | EventKind::Move
                | EventKind::Scroll { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let drag = Event::new(EventKind::Drag(MouseButton::Left)).at(10.0, 20.0);
        assert_eq!(drag.button(), Some(MouseButton::Left));
        assert!(drag.key().is_none());
        assert!(drag.is_pointer());
        assert_eq!((drag.x, drag.y), (10.0, 20.0));

        let key = Event::new(EventKind::KeyDown(Key::Char('s'))).with_modifiers(Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        });
        assert_eq!(key.key(), Some(Key::Char('s')));
        assert!(!key.is_pointer());
        assert!(!key.modifiers.is_empty());
    }
}
