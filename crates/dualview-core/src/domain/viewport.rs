//! Per-session viewport: the transform between a fixed physical display area
//! and a remote framebuffer of arbitrary size.
//!
//! Two scale modes exist:
//!
//! - **Fit**: the whole framebuffer is scaled uniformly onto the display. The
//!   origin is pinned at `(0, 0)` and no scrollbars are shown.
//! - **Pan**: the framebuffer is shown 1:1 through a window the size of the
//!   display minus any scrollbars. The window origin is a signed offset into
//!   the framebuffer, always within `[visible - content, 0]` on each axis.
//!   Content smaller than the window is centred instead.
//!
//! The origin is expressed the way the display backend consumes it: the
//! position of the framebuffer's top-left corner relative to the display, so
//! panning right makes it more negative.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Framebuffer dimension above which surfaces are refused.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Thickness of a scrollbar in pixels.
pub const DEFAULT_SCROLLBAR_WIDTH: u32 = 2;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A signed pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in framebuffer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// The rectangle covering a whole framebuffer of `size`.
    pub fn covering(size: Size) -> Self {
        Self {
            x: 0,
            y: 0,
            width: size.width,
            height: size.height,
        }
    }
}

/// How remote content is mapped onto the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleMode {
    Fit,
    Pan,
}

impl ScaleMode {
    pub fn from_scaling(scaling: bool) -> Self {
        if scaling {
            ScaleMode::Fit
        } else {
            ScaleMode::Pan
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ScaleMode::Fit => ScaleMode::Pan,
            ScaleMode::Pan => ScaleMode::Fit,
        }
    }
}

/// Which axis limits the uniform scale factor in fit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitAxis {
    Width,
    Height,
}

/// Scrollbar visibility.
///
/// A horizontal bar appears when content is wider than the display and takes
/// `scrollbar_width` rows from the visible height; a vertical bar appears when
/// content is taller and takes columns from the visible width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scrollbars {
    pub horizontal: bool,
    pub vertical: bool,
}

/// Surface the display backend must create after a resize or mode change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSpec {
    /// Framebuffer size; the surface always holds the full framebuffer.
    pub content: Size,
    /// `Some` when the backend must scale the surface onto the display.
    pub fit: Option<FitAxis>,
    /// Uniform scale factor (`1.0` unless fitting oversized content).
    pub scale: f64,
    /// Initial view origin.
    pub origin: Point,
    pub scrollbars: Scrollbars,
}

/// Errors raised when the remote side announces a new framebuffer geometry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResizeError {
    #[error("framebuffer {width}x{height} exceeds the {max}px limit")]
    TooLarge { width: u32, height: u32, max: u32 },

    #[error("framebuffer has a zero dimension ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// Sub-pixel pointer position in framebuffer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DevicePointer {
    pub x: f64,
    pub y: f64,
}

impl DevicePointer {
    /// Integer device coordinate sent to the remote session.
    pub fn position(&self) -> Point {
        Point::new(self.x as i32, self.y as i32)
    }

    /// Places the pointer at an integer position.
    pub fn set(&mut self, position: Point) {
        self.x = f64::from(position.x);
        self.y = f64::from(position.y);
    }
}

/// Result of applying a relative pointer movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerUpdate {
    /// New integer device coordinate.
    pub position: Point,
    /// New view origin when the pointer left the visible window.
    pub origin_moved: Option<Point>,
}

/// Viewport state of one session.
#[derive(Debug, Clone)]
pub struct Viewport {
    display: Size,
    scrollbar_width: u32,
    max_dimension: u32,
    mode: ScaleMode,
    content: Size,
    origin: Point,
    scale: f64,
    scrollbars: Scrollbars,
}

impl Viewport {
    /// Creates a viewport for a display of `display` pixels with no content yet.
    pub fn new(display: Size, mode: ScaleMode) -> Self {
        Self {
            display,
            scrollbar_width: DEFAULT_SCROLLBAR_WIDTH,
            max_dimension: DEFAULT_MAX_DIMENSION,
            mode,
            content: Size::default(),
            origin: Point::ORIGIN,
            scale: 1.0,
            scrollbars: Scrollbars::default(),
        }
    }

    /// Overrides the scrollbar thickness and framebuffer size cap.
    pub fn with_limits(mut self, scrollbar_width: u32, max_dimension: u32) -> Self {
        self.scrollbar_width = scrollbar_width;
        self.max_dimension = max_dimension;
        self
    }

    pub fn display(&self) -> Size {
        self.display
    }

    pub fn content(&self) -> Size {
        self.content
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn mode(&self) -> ScaleMode {
        self.mode
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn scrollbars(&self) -> Scrollbars {
        self.scrollbars
    }

    /// Size of the window through which content is seen.
    pub fn visible(&self) -> Size {
        let bar = self.scrollbar_width;
        Size {
            width: if self.scrollbars.vertical {
                self.display.width.saturating_sub(bar)
            } else {
                self.display.width
            },
            height: if self.scrollbars.horizontal {
                self.display.height.saturating_sub(bar)
            } else {
                self.display.height
            },
        }
    }

    /// Adopts a new framebuffer geometry.
    ///
    /// In pan mode the view recentres on `pointer`. Geometry beyond the size
    /// cap is refused and leaves the viewport unchanged.
    pub fn on_resize(&mut self, content: Size, pointer: Point) -> Result<SurfaceSpec, ResizeError> {
        if content.width > self.max_dimension || content.height > self.max_dimension {
            return Err(ResizeError::TooLarge {
                width: content.width,
                height: content.height,
                max: self.max_dimension,
            });
        }
        if content.is_empty() {
            return Err(ResizeError::Empty {
                width: content.width,
                height: content.height,
            });
        }
        self.content = content;
        Ok(self.relayout(pointer))
    }

    /// Switches between fit and pan mode and returns the surface to recreate.
    ///
    /// Returns `None` while no framebuffer geometry is known.
    pub fn toggle_mode(&mut self, pointer: Point) -> Option<SurfaceSpec> {
        self.mode = self.mode.toggled();
        if self.content.is_empty() {
            return None;
        }
        Some(self.relayout(pointer))
    }

    /// The surface matching the current state.
    pub fn surface_spec(&self) -> SurfaceSpec {
        SurfaceSpec {
            content: self.content,
            fit: self.fit_axis(),
            scale: self.scale,
            origin: self.origin,
            scrollbars: self.scrollbars,
        }
    }

    fn relayout(&mut self, pointer: Point) -> SurfaceSpec {
        match self.mode {
            ScaleMode::Fit => {
                self.scrollbars = Scrollbars::default();
                self.origin = Point::ORIGIN;
                self.scale = fit_scale(self.content, self.display);
            }
            ScaleMode::Pan => {
                self.scrollbars = Scrollbars {
                    horizontal: self.content.width > self.display.width,
                    vertical: self.content.height > self.display.height,
                };
                self.scale = 1.0;
                let visible = self.visible();
                let centred = Point::new(
                    -pointer.x + visible.width as i32 / 2,
                    -pointer.y + visible.height as i32 / 2,
                );
                self.origin = self.clamp_origin(centred);
            }
        }
        self.surface_spec()
    }

    fn fit_axis(&self) -> Option<FitAxis> {
        if self.mode != ScaleMode::Fit || !exceeds(self.content, self.display) {
            return None;
        }
        let c = self.content;
        let d = self.display;
        if u64::from(c.width) * u64::from(d.height) > u64::from(c.height) * u64::from(d.width) {
            Some(FitAxis::Width)
        } else {
            Some(FitAxis::Height)
        }
    }

    /// Clamps `origin` into the valid range for the current geometry.
    ///
    /// Idempotent: `clamp_origin(clamp_origin(o)) == clamp_origin(o)`.
    pub fn clamp_origin(&self, origin: Point) -> Point {
        if self.mode == ScaleMode::Fit {
            return Point::ORIGIN;
        }
        let visible = self.visible();
        Point::new(
            clamp_axis(origin.x, self.content.width, visible.width),
            clamp_axis(origin.y, self.content.height, visible.height),
        )
    }

    /// Moves the view, clamped. Returns `true` if the origin changed.
    pub fn set_origin(&mut self, origin: Point) -> bool {
        let clamped = self.clamp_origin(origin);
        let changed = clamped != self.origin;
        self.origin = clamped;
        changed
    }

    /// Applies a relative pointer movement to `pointer`.
    ///
    /// In pan mode deltas are stretched by `display / content` on axes where
    /// content is smaller than the display, so the pointer still spans the
    /// whole framebuffer. The pointer is clamped to `[0, content]`; if it
    /// leaves the visible window the origin follows by exactly the overflow.
    pub fn apply_pointer_delta(&mut self, pointer: &mut DevicePointer, dx: f64, dy: f64) -> PointerUpdate {
        let (fx, fy) = match self.mode {
            ScaleMode::Fit => (1.0, 1.0),
            ScaleMode::Pan => (
                stretch(self.content.width, self.display.width),
                stretch(self.content.height, self.display.height),
            ),
        };
        pointer.x = (pointer.x + dx * fx).clamp(0.0, f64::from(self.content.width));
        pointer.y = (pointer.y + dy * fy).clamp(0.0, f64::from(self.content.height));
        let position = pointer.position();

        let mut origin_moved = None;
        if self.mode == ScaleMode::Pan {
            let visible = self.visible();
            let mut origin = self.origin;
            origin.x = follow(origin.x, position.x, visible.width);
            origin.y = follow(origin.y, position.y, visible.height);
            if self.set_origin(origin) {
                origin_moved = Some(self.origin);
            }
        }
        PointerUpdate {
            position,
            origin_moved,
        }
    }

    /// Maps an absolute display position (e.g. a touch) to a framebuffer coordinate.
    pub fn screen_to_content(&self, screen: Point) -> Point {
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        let x = f64::from(screen.x - self.origin.x) / scale;
        let y = f64::from(screen.y - self.origin.y) / scale;
        Point::new(
            (x as i32).clamp(0, self.content.width as i32),
            (y as i32).clamp(0, self.content.height as i32),
        )
    }
}

fn exceeds(content: Size, display: Size) -> bool {
    content.width > display.width || content.height > display.height
}

fn fit_scale(content: Size, display: Size) -> f64 {
    if !exceeds(content, display) {
        return 1.0;
    }
    let sx = f64::from(display.width) / f64::from(content.width);
    let sy = f64::from(display.height) / f64::from(content.height);
    sx.min(sy)
}

fn stretch(content: u32, display: u32) -> f64 {
    if content > 0 && content < display {
        f64::from(display) / f64::from(content)
    } else {
        1.0
    }
}

fn clamp_axis(origin: i32, content: u32, visible: u32) -> i32 {
    let content = content as i32;
    let visible = visible as i32;
    if content > visible {
        origin.clamp(visible - content, 0)
    } else {
        (visible - content) / 2
    }
}

/// Shifts `origin` so that `pos` lies inside a window of `visible` pixels.
fn follow(origin: i32, pos: i32, visible: u32) -> i32 {
    let visible = visible as i32;
    if pos < -origin {
        -pos
    } else if pos > -origin + visible {
        -pos + visible
    } else {
        origin
    }
}
