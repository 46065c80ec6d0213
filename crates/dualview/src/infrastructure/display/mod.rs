//! Display backend seam.
//!
//! The backend owns the two physical displays. Sessions ask it for a surface
//! whenever their framebuffer geometry or scale mode changes, move the view
//! window while panning, and present once per loop tick. It also controls
//! the bottom backlight and the local on-screen keyboard.

use dualview_core::{Point, Scrollbars, Screen, Size, SurfaceSpec};
use thiserror::Error;

pub mod headless;
pub mod mock;

/// A surface to create for one screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRequest {
    pub spec: SurfaceSpec,
    /// Bits per pixel.
    pub depth: u8,
}

/// A created surface, handed to the remote connection as its frame sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceBinding {
    pub screen: Screen,
    /// Increments with every surface created for the screen.
    pub generation: u32,
    pub size: Size,
    /// Row length in pixels; may exceed `size.width` when rows are padded.
    pub stride: u32,
    pub depth: u8,
}

/// Errors raised by a display backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DisplayError {
    #[error("cannot create {width}x{height} surface on {screen} screen: {reason}")]
    SurfaceCreation {
        screen: Screen,
        width: u32,
        height: u32,
        reason: String,
    },

    #[error("failed to present {screen} screen: {reason}")]
    Present { screen: Screen, reason: String },
}

/// Trait abstracting the local display hardware.
pub trait DisplayBackend {
    /// (Re)creates the surface of `screen`, replacing any previous one.
    fn create_surface(
        &mut self,
        screen: Screen,
        request: &SurfaceRequest,
    ) -> Result<SurfaceBinding, DisplayError>;

    /// Drops the surface of `screen`, if any.
    fn release_surface(&mut self, screen: Screen);

    /// Moves the visible window of a panned surface.
    fn set_view_origin(&mut self, screen: Screen, origin: Point, scrollbars: Scrollbars);

    /// Shows the current surface contents.
    fn present(&mut self, screen: Screen) -> Result<(), DisplayError>;

    fn backlight(&self) -> bool;

    fn set_backlight(&mut self, on: bool);

    fn keyboard_visible(&self) -> bool;

    fn set_keyboard_visible(&mut self, visible: bool);
}
