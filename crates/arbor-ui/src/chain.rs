//! Ordered handler chain
//!
//! Handlers are offered each event in chain order until one consumes it.
//! [`HandlerChain::push_front`] is the usual way to register: a tool added
//! later takes priority over the defaults installed before it.
//! [`HandlerChain::push_back`] installs a handler below everything else,
//! which suits fallbacks such as camera navigation.

use tracing::trace;

use crate::event::Event;
use crate::handler::EventHandler;
use crate::view::View;

/// Identifier of a registered handler, unique within its chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

/// Result of offering one event to a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The given handler consumed the event
    Consumed(HandlerId),
    /// Every handler passed; the caller applies its default behavior
    Unhandled,
}

impl Dispatch {
    pub fn is_consumed(&self) -> bool {
        matches!(self, Self::Consumed(_))
    }
}

struct Entry {
    id: HandlerId,
    handler: Box<dyn EventHandler>,
}

/// Ordered list of event handlers
#[derive(Default)]
pub struct HandlerChain {
    entries: Vec<Entry>,
    next_id: u64,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Register a handler ahead of every handler already in the chain
    pub fn push_front(&mut self, handler: impl EventHandler + 'static) -> HandlerId {
        let id = self.allocate_id();
        self.entries.insert(
            0,
            Entry {
                id,
                handler: Box::new(handler),
            },
        );
        id
    }

    /// Register a handler behind every handler already in the chain
    pub fn push_back(&mut self, handler: impl EventHandler + 'static) -> HandlerId {
        let id = self.allocate_id();
        self.entries.push(Entry {
            id,
            handler: Box::new(handler),
        });
        id
    }

    /// Unregister a handler, handing it back to the caller
    pub fn remove(&mut self, id: HandlerId) -> Option<Box<dyn EventHandler>> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index).handler)
    }

    /// Handler ids in dispatch order
    pub fn ids(&self) -> Vec<HandlerId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Offer `event` to each handler in order, stopping at the first one that
    /// consumes it. A panicking handler aborts dispatch of this event.
    pub fn dispatch(&mut self, event: &Event, view: &View) -> Dispatch {
        for entry in &mut self.entries {
            if entry.handler.handle(event, view) {
                trace!(handler = %entry.id, view = %view.id, kind = ?event.kind, "Event consumed");
                return Dispatch::Consumed(entry.id);
            }
        }
        trace!(view = %view.id, kind = ?event.kind, "Event unhandled");
        Dispatch::Unhandled
    }
}

impl std::fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerChain")
            .field("handlers", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, Key, MouseButton};
    use crate::view::ViewId;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recorder(log: &Log, name: &'static str, consume: bool) -> impl EventHandler + 'static {
        let log = log.clone();
        move |_event: &Event, _view: &View| {
            log.lock().unwrap().push(name);
            consume
        }
    }

    fn view() -> View {
        View::new(ViewId(0), "main", 800, 600)
    }

    fn click() -> Event {
        Event::new(EventKind::Push(MouseButton::Left)).at(5.0, 5.0)
    }

    #[test]
    fn test_dispatch_stops_at_first_consumer() {
        let log = Log::default();
        let mut chain = HandlerChain::new();
        chain.push_back(recorder(&log, "h1", false));
        let h2 = chain.push_back(recorder(&log, "h2", true));
        chain.push_back(recorder(&log, "h3", false));

        let result = chain.dispatch(&click(), &view());

        assert_eq!(result, Dispatch::Consumed(h2));
        assert_eq!(*log.lock().unwrap(), vec!["h1", "h2"]);
    }

    #[test]
    fn test_unconsumed_event_visits_all_handlers() {
        let log = Log::default();
        let mut chain = HandlerChain::new();
        chain.push_back(recorder(&log, "h1", false));
        chain.push_back(recorder(&log, "h2", false));
        chain.push_back(recorder(&log, "h3", false));

        let result = chain.dispatch(&click(), &view());

        assert_eq!(result, Dispatch::Unhandled);
        assert!(!result.is_consumed());
        assert_eq!(*log.lock().unwrap(), vec!["h1", "h2", "h3"]);
    }

    #[test]
    fn test_empty_chain_is_unhandled() {
        let mut chain = HandlerChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.dispatch(&click(), &view()), Dispatch::Unhandled);
    }

    #[test]
    fn test_push_front_takes_priority() {
        let log = Log::default();
        let mut chain = HandlerChain::new();
        let default = chain.push_front(recorder(&log, "default", true));
        let tool = chain.push_front(recorder(&log, "tool", true));

        assert_eq!(chain.ids(), vec![tool, default]);
        assert_eq!(chain.dispatch(&click(), &view()), Dispatch::Consumed(tool));
        assert_eq!(*log.lock().unwrap(), vec!["tool"]);
    }

    #[test]
    fn test_remove_restores_previous_order() {
        let log = Log::default();
        let mut chain = HandlerChain::new();
        let default = chain.push_front(recorder(&log, "default", true));
        let tool = chain.push_front(recorder(&log, "tool", true));

        assert!(chain.remove(tool).is_some());
        assert!(chain.remove(tool).is_none());
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.dispatch(&click(), &view()), Dispatch::Consumed(default));

        chain.clear();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_handlers_filter_on_event_kind() {
        let mut chain = HandlerChain::new();
        let keys = chain.push_back(|event: &Event, _view: &View| event.key().is_some());
        let pointer = chain.push_back(|event: &Event, _view: &View| event.is_pointer());

        let key = Event::new(EventKind::KeyDown(Key::Escape));
        assert_eq!(chain.dispatch(&key, &view()), Dispatch::Consumed(keys));
        assert_eq!(chain.dispatch(&click(), &view()), Dispatch::Consumed(pointer));
        assert_eq!(
            chain.dispatch(&Event::new(EventKind::Frame), &view()),
            Dispatch::Unhandled
        );
    }

    #[test]
    #[should_panic(expected = "handler failure")]
    fn test_handler_panic_aborts_dispatch() {
        let mut chain = HandlerChain::new();
        chain.push_back(|_event: &Event, _view: &View| -> bool { panic!("handler failure") });
        chain.push_back(|_event: &Event, _view: &View| true);
        chain.dispatch(&click(), &view());
    }
}
