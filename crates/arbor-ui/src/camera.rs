//! Orbit camera navigation handler

use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use std::sync::{Arc, Mutex, PoisonError};

use crate::event::{Event, EventKind, Key, MouseButton};
use crate::handler::EventHandler;
use crate::view::View;

/// Orbit camera parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub distance: f32,
    pub azimuth: f32,
    pub elevation: f32,
    pub target: [f32; 3],
    /// Radians per pixel of drag
    pub sensitivity: f32,
    /// Fraction of the distance covered per scroll step
    pub zoom_speed: f32,
    pub min_distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 1500.0,
            azimuth: 0.8,
            elevation: 0.5,
            target: [0.0; 3],
            sensitivity: 0.005,
            zoom_speed: 0.1,
            min_distance: 10.0,
        }
    }
}

/// Handler turning drags, scrolls and `Home` into orbit camera motion.
///
/// Left drag rotates, scroll zooms towards the target, `Home` restores the
/// settings the manipulator was created with. Everything else passes through.
pub struct CameraManipulator {
    settings: Arc<Mutex<CameraSettings>>,
    home: CameraSettings,
    last_pointer: Option<(f32, f32)>,
}

impl CameraManipulator {
    /// Create a manipulator driving the given shared settings
    pub fn new(settings: Arc<Mutex<CameraSettings>>) -> Self {
        let home = settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Self {
            settings,
            home,
            last_pointer: None,
        }
    }

    fn update(&self, f: impl FnOnce(&mut CameraSettings)) {
        let mut settings = self
            .settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut settings);
    }
}

impl EventHandler for CameraManipulator {
    fn handle(&mut self, event: &Event, _view: &View) -> bool {
        match event.kind {
            EventKind::Push(MouseButton::Left) => {
                self.last_pointer = Some((event.x, event.y));
                true
            }
            EventKind::Drag(MouseButton::Left) => {
                let Some((last_x, last_y)) = self.last_pointer else {
                    // Drag without a push we saw belongs to someone else
                    return false;
                };
                let (dx, dy) = (event.x - last_x, event.y - last_y);
                self.last_pointer = Some((event.x, event.y));
                self.update(|s| {
                    s.azimuth -= dx * s.sensitivity;
                    s.elevation = (s.elevation + dy * s.sensitivity)
                        .clamp(-FRAC_PI_2 + 0.01, FRAC_PI_2 - 0.01);
                });
                true
            }
            EventKind::Release(MouseButton::Left) => self.last_pointer.take().is_some(),
            EventKind::Scroll { dy, .. } if dy != 0.0 => {
                self.update(|s| {
                    let factor = (1.0 - dy * s.zoom_speed).max(0.1);
                    s.distance = (s.distance * factor).max(s.min_distance);
                });
                true
            }
            EventKind::KeyDown(Key::Home) => {
                let home = self.home.clone();
                self.update(|s| *s = home);
                self.last_pointer = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::ViewId;

    fn setup() -> (CameraManipulator, Arc<Mutex<CameraSettings>>, View) {
        let settings = Arc::new(Mutex::new(CameraSettings::default()));
        let manipulator = CameraManipulator::new(settings.clone());
        (manipulator, settings, View::new(ViewId(0), "main", 800, 600))
    }

    #[test]
    fn test_drag_rotates() {
        let (mut camera, settings, view) = setup();
        let start = settings.lock().unwrap().clone();

        assert!(camera.handle(&Event::new(EventKind::Push(MouseButton::Left)).at(100.0, 100.0), &view));
        assert!(camera.handle(&Event::new(EventKind::Drag(MouseButton::Left)).at(140.0, 120.0), &view));
        assert!(camera.handle(&Event::new(EventKind::Release(MouseButton::Left)).at(140.0, 120.0), &view));

        let s = settings.lock().unwrap();
        assert!((s.azimuth - (start.azimuth - 40.0 * start.sensitivity)).abs() < 1e-6);
        assert!((s.elevation - (start.elevation + 20.0 * start.sensitivity)).abs() < 1e-6);
        assert_eq!(s.distance, start.distance);
    }

    #[test]
    fn test_drag_without_push_passes_through() {
        let (mut camera, settings, view) = setup();
        let drag = Event::new(EventKind::Drag(MouseButton::Left)).at(10.0, 10.0);
        assert!(!camera.handle(&drag, &view));
        assert!(!camera.handle(&Event::new(EventKind::Release(MouseButton::Left)), &view));
        assert_eq!(*settings.lock().unwrap(), CameraSettings::default());
    }

    #[test]
    fn test_scroll_zoom_is_clamped() {
        let (mut camera, settings, view) = setup();
        let scroll = Event::new(EventKind::Scroll { dx: 0.0, dy: 1.0 });
        assert!(camera.handle(&scroll, &view));
        assert!((settings.lock().unwrap().distance - 1350.0).abs() < 1e-3);

        for _ in 0..200 {
            camera.handle(&scroll, &view);
        }
        assert_eq!(settings.lock().unwrap().distance, 10.0);
    }

    #[test]
    fn test_home_resets_and_other_events_ignored() {
        let (mut camera, settings, view) = setup();
        camera.handle(&Event::new(EventKind::Scroll { dx: 0.0, dy: 2.0 }), &view);
        assert!(camera.handle(&Event::new(EventKind::KeyDown(Key::Home)), &view));
        assert_eq!(*settings.lock().unwrap(), CameraSettings::default());

        assert!(!camera.handle(&Event::new(EventKind::Push(MouseButton::Right)), &view));
        assert!(!camera.handle(&Event::new(EventKind::KeyDown(Key::Char('a'))), &view));
        assert!(!camera.handle(&Event::new(EventKind::Frame), &view));
    }
}
