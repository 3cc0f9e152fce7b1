//! The event handler capability

use crate::event::Event;
use crate::view::View;

/// Something that reacts to application events.
///
/// Return `true` when the event was handled and no later handler should see
/// it, `false` to let it continue down the chain. "Not interested" is always
/// `false`, never an error.
pub trait EventHandler: Send {
    fn handle(&mut self, event: &Event, view: &View) -> bool;
}

impl<F> EventHandler for F
where
    F: FnMut(&Event, &View) -> bool + Send,
{
    fn handle(&mut self, event: &Event, view: &View) -> bool {
        self(event, view)
    }
}
