//! Display backend without any output.
//!
//! Surfaces are bookkeeping only. Used by the shipped binary until a platform
//! backend is wired in, and handy for running telemetry without a screen.

use dualview_core::{Point, Scrollbars, Screen};
use tracing::debug;

use super::{DisplayBackend, DisplayError, SurfaceBinding, SurfaceRequest};

/// A [`DisplayBackend`] that draws nothing.
#[derive(Debug)]
pub struct HeadlessDisplay {
    generations: [u32; 2],
    surfaces: [Option<SurfaceBinding>; 2],
    backlight: bool,
    keyboard_visible: bool,
}

impl Default for HeadlessDisplay {
    fn default() -> Self {
        Self {
            generations: [0; 2],
            surfaces: [None; 2],
            backlight: true,
            keyboard_visible: false,
        }
    }
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// The surface currently bound to `screen`.
    pub fn surface(&self, screen: Screen) -> Option<SurfaceBinding> {
        self.surfaces[screen.index()]
    }
}

impl DisplayBackend for HeadlessDisplay {
    fn create_surface(
        &mut self,
        screen: Screen,
        request: &SurfaceRequest,
    ) -> Result<SurfaceBinding, DisplayError> {
        let generation = &mut self.generations[screen.index()];
        *generation = generation.wrapping_add(1);
        let binding = SurfaceBinding {
            screen,
            generation: *generation,
            size: request.spec.content,
            stride: request.spec.content.width,
            depth: request.depth,
        };
        debug!(%screen, ?binding, fit = ?request.spec.fit, "headless surface created");
        self.surfaces[screen.index()] = Some(binding);
        Ok(binding)
    }

    fn release_surface(&mut self, screen: Screen) {
        self.surfaces[screen.index()] = None;
    }

    fn set_view_origin(&mut self, _screen: Screen, _origin: Point, _scrollbars: Scrollbars) {}

    fn present(&mut self, _screen: Screen) -> Result<(), DisplayError> {
        Ok(())
    }

    fn backlight(&self) -> bool {
        self.backlight
    }

    fn set_backlight(&mut self, on: bool) {
        self.backlight = on;
    }

    fn keyboard_visible(&self) -> bool {
        self.keyboard_visible
    }

    fn set_keyboard_visible(&mut self, visible: bool) {
        self.keyboard_visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualview_core::{Size, SurfaceSpec};

    #[test]
    fn test_headless_surface_generations_and_release() {
        // Arrange
        let mut display = HeadlessDisplay::new();
        let request = SurfaceRequest {
            spec: SurfaceSpec {
                content: Size::new(640, 480),
                fit: None,
                scale: 1.0,
                origin: Point::ORIGIN,
                scrollbars: Scrollbars::default(),
            },
            depth: 16,
        };

        // Act
        display.create_surface(Screen::Bottom, &request).unwrap();
        let second = display.create_surface(Screen::Bottom, &request).unwrap();

        // Assert
        assert_eq!(second.generation, 2);
        assert_eq!(display.surface(Screen::Bottom), Some(second));
        display.release_surface(Screen::Bottom);
        assert_eq!(display.surface(Screen::Bottom), None);
        assert!(display.backlight());
    }
}
