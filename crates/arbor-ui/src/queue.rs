//! Asynchronous per-view event loops
//!
//! A view loop is a tokio task that drains one view's event queue into the
//! router in arrival order, so a handler never sees an event before the one
//! that preceded it (drag sequences depend on this). Events nobody consumes
//! go to the loop's fallback, typically the default camera behavior.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::chain::Dispatch;
use crate::event::Event;
use crate::router::{EventRouter, RouterError};
use crate::view::ViewId;

/// Counters returned when a view loop finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewLoopStats {
    pub consumed: u64,
    pub unhandled: u64,
}

/// Sending half of a view's event queue
#[derive(Debug, Clone)]
pub struct ViewEventSender {
    view: ViewId,
    tx: mpsc::UnboundedSender<Event>,
}

impl ViewEventSender {
    pub fn view(&self) -> ViewId {
        self.view
    }

    /// Queue an event for the view
    pub fn send(&self, event: Event) -> Result<(), RouterError> {
        self.tx
            .send(event)
            .map_err(|_| RouterError::QueueClosed(self.view))
    }
}

/// Spawn the event loop of one view.
///
/// The loop ends once every sender is dropped, or when the view is detached
/// from the router. A panicking handler ends the loop; the panic surfaces
/// through the returned handle.
pub fn spawn_view_loop<F>(
    router: Arc<EventRouter>,
    view: ViewId,
    mut fallback: F,
) -> (ViewEventSender, JoinHandle<ViewLoopStats>)
where
    F: FnMut(&Event) + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

    let handle = tokio::spawn(async move {
        let mut stats = ViewLoopStats::default();
        while let Some(event) = rx.recv().await {
            match router.dispatch(view, &event) {
                Ok(Dispatch::Consumed(_)) => stats.consumed += 1,
                Ok(Dispatch::Unhandled) => {
                    stats.unhandled += 1;
                    fallback(&event);
                }
                Err(e) => {
                    warn!(view = %view, error = %e, "Stopping view event loop");
                    break;
                }
            }
        }
        debug!(view = %view, consumed = stats.consumed, unhandled = stats.unhandled, "View event loop finished");
        stats
    });

    (ViewEventSender { view, tx }, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::HandlerChain;
    use crate::event::{EventKind, Key, MouseButton};
    use crate::view::View;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let router = Arc::new(EventRouter::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let mut chain = HandlerChain::new();
        chain.push_back(move |event: &Event, _view: &View| {
            log.lock().unwrap().push(event.time);
            true
        });
        router.attach(View::new(ViewId(1), "main", 800, 600), chain);

        let (tx, handle) = spawn_view_loop(router.clone(), ViewId(1), |_event: &Event| {});
        for i in 0..50 {
            tx.send(Event::new(EventKind::Move).at_time(i as f64)).unwrap();
        }
        drop(tx);

        let stats = handle.await.unwrap();
        assert_eq!(stats.consumed, 50);
        let expected: Vec<f64> = (0..50).map(|i| i as f64).collect();
        assert_eq!(*seen.lock().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_unhandled_events_reach_fallback() {
        let router = Arc::new(EventRouter::new());
        let mut chain = HandlerChain::new();
        chain.push_back(|event: &Event, _view: &View| event.key().is_some());
        router.attach(View::new(ViewId(2), "main", 800, 600), chain);

        let fallen = Arc::new(Mutex::new(Vec::new()));
        let sink = fallen.clone();
        let (tx, handle) = spawn_view_loop(router, ViewId(2), move |event: &Event| {
            sink.lock().unwrap().push(event.kind);
        });

        tx.send(Event::new(EventKind::KeyDown(Key::Home))).unwrap();
        tx.send(Event::new(EventKind::Push(MouseButton::Right))).unwrap();
        drop(tx);

        let stats = handle.await.unwrap();
        assert_eq!(
            stats,
            ViewLoopStats {
                consumed: 1,
                unhandled: 1
            }
        );
        assert_eq!(
            *fallen.lock().unwrap(),
            vec![EventKind::Push(MouseButton::Right)]
        );
    }

    #[tokio::test]
    async fn test_loop_stops_for_unknown_view() {
        let router = Arc::new(EventRouter::new());
        let (tx, handle) = spawn_view_loop(router, ViewId(7), |_event: &Event| {});
        tx.send(Event::new(EventKind::Frame)).unwrap();

        let stats = handle.await.unwrap();
        assert_eq!(stats, ViewLoopStats::default());
        assert_eq!(
            tx.send(Event::new(EventKind::Frame)),
            Err(RouterError::QueueClosed(ViewId(7)))
        );
    }
}
