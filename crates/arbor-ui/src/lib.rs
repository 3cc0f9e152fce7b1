//! Arbor UI - Event routing for interactive views
//!
//! Input events from one or more views are offered to an ordered chain of
//! handlers until one of them consumes the event:
//! - `EventHandler`: the single capability every interactive tool implements
//! - `HandlerChain`: ordered dispatch with consume-or-pass semantics
//! - `EventRouter`: one chain per view, views dispatched concurrently
//! - View event loops: ordered async delivery with a fallback for unhandled events
//! - Stock handlers for orbit camera navigation and keyboard shortcuts

pub mod bindings;
pub mod camera;
pub mod chain;
pub mod event;
pub mod handler;
pub mod queue;
pub mod router;
pub mod view;

pub use bindings::KeyBindings;
pub use camera::{CameraManipulator, CameraSettings};
pub use chain::{Dispatch, HandlerChain, HandlerId};
pub use event::{Event, EventKind, Key, Modifiers, MouseButton};
pub use handler::EventHandler;
pub use queue::{spawn_view_loop, ViewEventSender, ViewLoopStats};
pub use router::{EventRouter, RouterError};
pub use view::{View, ViewId};
