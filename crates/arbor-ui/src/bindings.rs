//! Keyboard shortcut handler

use std::collections::HashMap;
use tracing::debug;

use crate::event::{Event, EventKind, Key};
use crate::handler::EventHandler;
use crate::view::View;

type Action = Box<dyn FnMut(&View) + Send>;

/// Maps keys to actions; consumes the key presses it has a binding for
#[derive(Default)]
pub struct KeyBindings {
    actions: HashMap<Key, Action>,
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to `action`, replacing any previous binding
    pub fn bind(mut self, key: Key, action: impl FnMut(&View) + Send + 'static) -> Self {
        self.actions.insert(key, Box::new(action));
        self
    }

    pub fn unbind(&mut self, key: Key) -> bool {
        self.actions.remove(&key).is_some()
    }

    pub fn is_bound(&self, key: Key) -> bool {
        self.actions.contains_key(&key)
    }
}

impl EventHandler for KeyBindings {
    fn handle(&mut self, event: &Event, view: &View) -> bool {
        let EventKind::KeyDown(key) = event.kind else {
            return false;
        };
        match self.actions.get_mut(&key) {
            Some(action) => {
                debug!(view = %view.id, ?key, "Key binding triggered");
                action(view);
                true
            }
            None => false,
        }
    }
}
