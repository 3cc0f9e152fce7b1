//! Scripted interaction replay
//!
//! Drives two views through the same pointer script, each with its own
//! event loop: a key binding layer in front of orbit camera navigation.
//! Pressing `m` in the first view toggles mesh rendering on the scene.

use anyhow::Result;
use arbor_core::{CircuitScene, SceneContext};
use arbor_ui::{
    spawn_view_loop, CameraManipulator, CameraSettings, Event, EventKind, EventRouter,
    HandlerChain, Key, KeyBindings, MouseButton, View, ViewId,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Outcome of replaying the script on one view
#[derive(Debug, Clone, Serialize)]
pub struct ViewReplay {
    pub view: String,
    pub consumed: u64,
    pub unhandled: u64,
    /// Viewport aspect ratio once the script has run
    pub aspect_ratio: f32,
    pub camera: CameraSettings,
}

/// Pointer script shared by every view
fn pointer_script() -> Vec<Event> {
    let mut events = vec![Event::new(EventKind::Push(MouseButton::Left)).at(400.0, 300.0)];
    for step in 1..=10 {
        let t = step as f32;
        events.push(Event::new(EventKind::Drag(MouseButton::Left)).at(400.0 + 12.0 * t, 300.0 + 4.0 * t));
    }
    events.push(Event::new(EventKind::Release(MouseButton::Left)).at(520.0, 340.0));
    events.push(Event::new(EventKind::Scroll { dx: 0.0, dy: 2.0 }));
    // No handler takes right clicks; they fall through to the view default
    events.push(Event::new(EventKind::Push(MouseButton::Right)).at(10.0, 10.0));
    events.push(Event::new(EventKind::Release(MouseButton::Right)).at(10.0, 10.0));
    events.push(Event::new(EventKind::Frame));

    for (i, event) in events.iter_mut().enumerate() {
        event.time = i as f64 / 60.0;
    }
    events
}

fn toggle_meshes(scene: &CircuitScene, view: &View) {
    let mut attributes = (*scene.attributes()).clone();
    attributes.use_meshes = !attributes.use_meshes;
    info!(view = %view.id, meshes = attributes.use_meshes, "Mesh rendering toggled");
    scene.set_attributes(attributes);
}

/// Replay the script on two views and report per-view results
pub async fn replay(scene: Arc<CircuitScene>) -> Result<Vec<ViewReplay>> {
    let router = Arc::new(EventRouter::new());
    let views = [
        View::new(ViewId(0), "left", 960, 1080),
        View::new(ViewId(1), "right", 960, 1080),
    ];

    let mut cameras = Vec::new();
    let mut loops = Vec::new();
    for view in &views {
        let camera = Arc::new(Mutex::new(CameraSettings::default()));
        let mut chain = HandlerChain::new();
        chain.push_front(CameraManipulator::new(camera.clone()));
        let scene = scene.clone();
        chain.push_front(
            KeyBindings::new().bind(Key::Char('m'), move |view: &View| toggle_meshes(&scene, view)),
        );
        router.attach(view.clone(), chain);

        let id = view.id;
        let (tx, handle) = spawn_view_loop(router.clone(), id, move |event: &Event| {
            debug!(view = %id, kind = ?event.kind, "Event falls through to view default");
        });
        cameras.push(camera);
        loops.push((tx, handle));
    }

    let script = pointer_script();
    for (i, (tx, _)) in loops.iter().enumerate() {
        for event in &script {
            tx.send(*event)?;
        }
        debug!(view = %tx.view(), events = script.len(), "Script queued");
        if i == 0 {
            tx.send(Event::new(EventKind::KeyDown(Key::Char('m'))))?;
            tx.send(Event::new(EventKind::KeyUp(Key::Char('m'))))?;
        }
    }

    let mut results = Vec::new();
    for ((view, camera), (tx, handle)) in views.iter().zip(cameras).zip(loops) {
        drop(tx);
        let stats = handle.await?;
        let aspect_ratio = router.view(view.id)?.aspect_ratio();
        let camera = camera
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        info!(
            view = %view.id,
            consumed = stats.consumed,
            unhandled = stats.unhandled,
            "View replay finished"
        );
        results.push(ViewReplay {
            view: view.name.clone(),
            consumed: stats.consumed,
            unhandled: stats.unhandled,
            aspect_ratio,
            camera,
        });
    }

    Ok(results)
}
