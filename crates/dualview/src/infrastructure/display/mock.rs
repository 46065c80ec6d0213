//! Recording display backend for tests.
//!
//! Clones share one log, so a test can keep a handle while the event loop
//! owns the backend.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dualview_core::{Point, Scrollbars, Screen};

use super::{DisplayBackend, DisplayError, SurfaceBinding, SurfaceRequest};

/// Everything the mock backend was asked to do.
#[derive(Debug, Default)]
pub struct DisplayLog {
    pub surfaces: Vec<(Screen, SurfaceRequest)>,
    pub released: Vec<Screen>,
    pub origins: Vec<(Screen, Point, Scrollbars)>,
    pub presents: Vec<Screen>,
    pub backlight: bool,
    pub keyboard_visible: bool,
    /// Reject every surface request.
    pub fail_surfaces: bool,
    /// Fail every present.
    pub fail_present: bool,
}

/// A recording [`DisplayBackend`].
#[derive(Clone)]
pub struct MockDisplay {
    log: Arc<Mutex<DisplayLog>>,
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDisplay {
    /// A backend with the backlight on and the keyboard hidden.
    pub fn new() -> Self {
        let log = DisplayLog {
            backlight: true,
            ..DisplayLog::default()
        };
        Self {
            log: Arc::new(Mutex::new(log)),
        }
    }

    /// Locks the shared log for inspection or fault injection.
    pub fn log(&self) -> MutexGuard<'_, DisplayLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of surfaces created for `screen`.
    pub fn surface_count(&self, screen: Screen) -> usize {
        self.log().surfaces.iter().filter(|(s, _)| *s == screen).count()
    }

    /// The most recent surface request for `screen`.
    pub fn last_surface(&self, screen: Screen) -> Option<SurfaceRequest> {
        self.log()
            .surfaces
            .iter()
            .rev()
            .find(|(s, _)| *s == screen)
            .map(|(_, r)| *r)
    }

    /// The most recent view origin set for `screen`.
    pub fn last_origin(&self, screen: Screen) -> Option<Point> {
        self.log()
            .origins
            .iter()
            .rev()
            .find(|(s, _, _)| *s == screen)
            .map(|(_, o, _)| *o)
    }
}

impl DisplayBackend for MockDisplay {
    fn create_surface(
        &mut self,
        screen: Screen,
        request: &SurfaceRequest,
    ) -> Result<SurfaceBinding, DisplayError> {
        let mut log = self.log();
        if log.fail_surfaces {
            return Err(DisplayError::SurfaceCreation {
                screen,
                width: request.spec.content.width,
                height: request.spec.content.height,
                reason: "injected failure".to_string(),
            });
        }
        log.surfaces.push((screen, *request));
        let generation = log.surfaces.iter().filter(|(s, _)| *s == screen).count() as u32;
        Ok(SurfaceBinding {
            screen,
            generation,
            size: request.spec.content,
            stride: request.spec.content.width,
            depth: request.depth,
        })
    }

    fn release_surface(&mut self, screen: Screen) {
        self.log().released.push(screen);
    }

    fn set_view_origin(&mut self, screen: Screen, origin: Point, scrollbars: Scrollbars) {
        self.log().origins.push((screen, origin, scrollbars));
    }

    fn present(&mut self, screen: Screen) -> Result<(), DisplayError> {
        let mut log = self.log();
        if log.fail_present {
            return Err(DisplayError::Present {
                screen,
                reason: "injected failure".to_string(),
            });
        }
        log.presents.push(screen);
        Ok(())
    }

    fn backlight(&self) -> bool {
        self.log().backlight
    }

    fn set_backlight(&mut self, on: bool) {
        self.log().backlight = on;
    }

    fn keyboard_visible(&self) -> bool {
        self.log().keyboard_visible
    }

    fn set_keyboard_visible(&mut self, visible: bool) {
        self.log().keyboard_visible = visible;
    }
}
