//! Per-view event routing
//!
//! Every view owns one handler chain. Each chain sits behind its own lock,
//! so different views dispatch concurrently while the events of a single
//! view are handled one at a time.
//!
//! Handlers may call back into the router while they run. Reading the view
//! works as usual. Chain edits from inside a dispatch go through
//! [`EventRouter::edit_chain`], which queues them until the chain returns.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, ThreadId};
use thiserror::Error;
use tracing::{debug, info};

use crate::chain::{Dispatch, HandlerChain};
use crate::event::{Event, EventKind};
use crate::view::{View, ViewId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("Unknown view: {0}")]
    UnknownView(ViewId),
    #[error("Event queue for {0} is closed")]
    QueueClosed(ViewId),
    #[error("Chain of {0} is dispatching on this thread")]
    Busy(ViewId),
}

type ChainEdit = Box<dyn FnOnce(&mut HandlerChain) + Send>;

struct ViewSlot {
    view: RwLock<View>,
    chain: Mutex<HandlerChain>,
    /// Thread currently running this view's chain
    dispatching: Mutex<Option<ThreadId>>,
    /// Edits requested by handlers during the current dispatch
    pending: Mutex<Vec<ChainEdit>>,
}

impl ViewSlot {
    fn new(view: View, chain: HandlerChain) -> Self {
        Self {
            view: RwLock::new(view),
            chain: Mutex::new(chain),
            dispatching: Mutex::new(None),
            pending: Mutex::new(Vec::new()),
        }
    }

    fn is_dispatching_here(&self) -> bool {
        *self
            .dispatching
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            == Some(thread::current().id())
    }
}

/// Clears the dispatching marker, also when a handler panics
struct DispatchGuard<'a>(&'a Mutex<Option<ThreadId>>);

impl<'a> DispatchGuard<'a> {
    fn enter(marker: &'a Mutex<Option<ThreadId>>) -> Self {
        *marker.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
        Self(marker)
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Routes events to the handler chain of the view they occurred in
#[derive(Default)]
pub struct EventRouter {
    views: RwLock<HashMap<ViewId, Arc<ViewSlot>>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: ViewId) -> Result<Arc<ViewSlot>, RouterError> {
        self.views
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(RouterError::UnknownView(id))
    }

    /// Attach a view with its chain, replacing any chain already attached to
    /// the same view id
    pub fn attach(&self, view: View, chain: HandlerChain) {
        let id = view.id;
        info!(view = %id, name = %view.name, handlers = chain.len(), "View attached");
        self.views
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(ViewSlot::new(view, chain)));
    }

    /// Detach a view. Returns false if it was not attached.
    pub fn detach(&self, id: ViewId) -> bool {
        let removed = self
            .views
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            info!(view = %id, "View detached");
        }
        removed
    }

    /// Attached view ids, sorted
    pub fn views(&self) -> Vec<ViewId> {
        let mut ids: Vec<ViewId> = self
            .views
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    /// Current state of an attached view. Safe to call from a handler.
    pub fn view(&self, id: ViewId) -> Result<View, RouterError> {
        let slot = self.slot(id)?;
        let view = slot.view.read().unwrap_or_else(PoisonError::into_inner);
        Ok(view.clone())
    }

    /// Run `f` on a view's chain right away.
    ///
    /// Fails with [`RouterError::Busy`] when called by a handler of the same
    /// view; use [`edit_chain`](Self::edit_chain) there instead.
    pub fn with_chain<R>(
        &self,
        id: ViewId,
        f: impl FnOnce(&mut HandlerChain) -> R,
    ) -> Result<R, RouterError> {
        let slot = self.slot(id)?;
        if slot.is_dispatching_here() {
            return Err(RouterError::Busy(id));
        }
        let mut chain = slot.chain.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&mut *chain))
    }

    /// Edit a view's chain, e.g. to register a tool while the view is live.
    ///
    /// Applied immediately, unless a handler of the same view is the caller:
    /// then the edit runs once the current dispatch has gone through the chain.
    pub fn edit_chain(
        &self,
        id: ViewId,
        f: impl FnOnce(&mut HandlerChain) + Send + 'static,
    ) -> Result<(), RouterError> {
        let slot = self.slot(id)?;
        if slot.is_dispatching_here() {
            debug!(view = %id, "Chain edit deferred until dispatch returns");
            slot.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Box::new(f));
            return Ok(());
        }
        let mut chain = slot.chain.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *chain);
        Ok(())
    }

    /// Dispatch an event through the chain of the view it belongs to.
    /// Resize events update the view before handlers see them.
    ///
    /// A handler dispatching into its own view gets [`RouterError::Busy`].
    pub fn dispatch(&self, id: ViewId, event: &Event) -> Result<Dispatch, RouterError> {
        let slot = self.slot(id)?;
        if slot.is_dispatching_here() {
            return Err(RouterError::Busy(id));
        }
        let mut chain = slot.chain.lock().unwrap_or_else(PoisonError::into_inner);

        let view = {
            let mut view = slot.view.write().unwrap_or_else(PoisonError::into_inner);
            if let EventKind::Resize { width, height } = event.kind {
                debug!(view = %id, width, height, "View resized");
                view.width = width;
                view.height = height;
            }
            view.clone()
        };

        let result = {
            let _guard = DispatchGuard::enter(&slot.dispatching);
            chain.dispatch(event, &view)
        };

        let edits = std::mem::take(&mut *slot.pending.lock().unwrap_or_else(PoisonError::into_inner));
        for edit in edits {
            edit(&mut *chain);
        }
        Ok(result)
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("views", &self.views())
            .finish()
    }
}
