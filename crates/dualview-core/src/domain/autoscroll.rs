//! Edge auto-scroll for a panned session driven by absolute (touch) input.
//!
//! While the pointer sits in a margin band along an edge of the display and
//! the content extends past that edge, the view scrolls with a velocity
//! proportional to how deep the pointer is in the band. A real press or
//! motion starts scrolling; after that the caller keeps it going by
//! re-injecting a synthetic pointer event once per tick while the touch is
//! held. Scrolling stops, and the accumulator is discarded, as soon as the
//! pointer leaves every band.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::viewport::{Point, ScaleMode, Viewport};

/// Tuning constants of the auto-scroller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoScrollConfig {
    /// Width of the edge band in display pixels.
    pub margin: u32,
    /// Scroll speed in pixels per second at full penetration.
    pub max_speed: f64,
    /// Loop ticks per second, used to turn speed into a per-tick step.
    ///
    /// The event loop paces itself to this rate while a re-injection is
    /// pending, so the step matches wall-clock speed only during scrolling.
    pub tick_rate: f64,
}

impl AutoScrollConfig {
    /// Minimum duration of one tick while scrolling; zero when unpaced.
    pub fn tick_period(&self) -> Duration {
        if self.tick_rate > 0.0 && self.tick_rate.is_finite() {
            Duration::from_secs_f64(1.0 / self.tick_rate)
        } else {
            Duration::ZERO
        }
    }
}

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            margin: 20,
            max_speed: 200.0,
            tick_rate: 50.0,
        }
    }
}

/// Where a pointer event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    /// Produced by the user.
    Real,
    /// Re-injected by the auto-scroller.
    Synthetic,
}

/// Outcome of one auto-scroll step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollStep {
    /// New view origin, when it changed.
    pub origin_moved: Option<Point>,
    /// The caller must schedule one synthetic pointer event for the next tick.
    pub reinject: bool,
}

/// Penetration-proportional edge scroller.
#[derive(Debug, Clone)]
pub struct EdgeScroller {
    config: AutoScrollConfig,
    scrolling: bool,
    acc_x: f64,
    acc_y: f64,
}

impl EdgeScroller {
    pub fn new(config: AutoScrollConfig) -> Self {
        Self {
            config,
            scrolling: false,
            acc_x: 0.0,
            acc_y: 0.0,
        }
    }

    pub fn config(&self) -> &AutoScrollConfig {
        &self.config
    }

    pub fn is_scrolling(&self) -> bool {
        self.scrolling
    }

    /// Signed depth of `screen` into the edge bands, in display pixels.
    ///
    /// Positive values move the origin up/left (revealing content to the
    /// left/top), negative values move it down/right. An axis is zero when the
    /// pointer is outside its bands, when the view already touches that edge,
    /// or when the viewport is in fit mode.
    pub fn penetration(&self, viewport: &Viewport, screen: Point) -> (f64, f64) {
        if viewport.mode() == ScaleMode::Fit {
            return (0.0, 0.0);
        }
        let margin = self.config.margin as i32;
        let display = viewport.display();
        let content = viewport.content();
        let visible = viewport.visible();
        let origin = viewport.origin();

        let x = if content.width > display.width {
            axis_penetration(
                screen.x,
                origin.x,
                display.width as i32,
                visible.width as i32 - content.width as i32,
                margin,
            )
        } else {
            0
        };
        let y = if content.height > display.height {
            axis_penetration(
                screen.y,
                origin.y,
                display.height as i32,
                visible.height as i32 - content.height as i32,
                margin,
            )
        } else {
            0
        };
        (f64::from(x), f64::from(y))
    }

    /// Per-tick origin velocity for a pointer at `screen`.
    pub fn velocity(&self, viewport: &Viewport, screen: Point) -> (f64, f64) {
        let (px, py) = self.penetration(viewport, screen);
        (self.scale_velocity(px), self.scale_velocity(py))
    }

    fn scale_velocity(&self, penetration: f64) -> f64 {
        if penetration == 0.0 || self.config.margin == 0 || self.config.tick_rate <= 0.0 {
            return 0.0;
        }
        penetration / f64::from(self.config.margin) * self.config.max_speed / self.config.tick_rate
    }

    /// Advances the scroller for a pointer event at display position `screen`.
    ///
    /// `held` reports whether the touch is still down; only then is a
    /// synthetic re-injection requested.
    pub fn step(
        &mut self,
        viewport: &mut Viewport,
        screen: Point,
        source: PointerSource,
        held: bool,
    ) -> ScrollStep {
        let (vx, vy) = self.velocity(viewport, screen);
        if vx == 0.0 && vy == 0.0 {
            self.reset();
            return ScrollStep::default();
        }

        if !self.scrolling {
            let origin = viewport.origin();
            self.acc_x = f64::from(origin.x);
            self.acc_y = f64::from(origin.y);
            if source == PointerSource::Real {
                self.scrolling = true;
            }
        }

        let mut origin = viewport.origin();
        if vx != 0.0 {
            self.acc_x += vx;
            origin.x = self.acc_x as i32;
        }
        if vy != 0.0 {
            self.acc_y += vy;
            origin.y = self.acc_y as i32;
        }
        let origin_moved = viewport.set_origin(origin).then(|| viewport.origin());

        ScrollStep {
            origin_moved,
            reinject: self.scrolling && held,
        }
    }

    /// Stops scrolling and discards the accumulated sub-pixel position.
    pub fn reset(&mut self) {
        self.scrolling = false;
        self.acc_x = 0.0;
        self.acc_y = 0.0;
    }
}

fn axis_penetration(pos: i32, origin: i32, display: i32, min_origin: i32, margin: i32) -> i32 {
    if pos >= display - margin && origin > min_origin {
        -(pos - (display - 1) + margin)
    } else if pos < margin && origin < 0 {
        margin - pos
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::viewport::Size;

    const BOTTOM: Size = Size::new(320, 240);

    fn panned(content: Size) -> Viewport {
        let mut vp = Viewport::new(BOTTOM, ScaleMode::Pan);
        vp.on_resize(content, Point::ORIGIN).unwrap();
        vp
    }

    #[test]
    fn test_tick_period_follows_tick_rate() {
        let config = AutoScrollConfig::default();
        assert_eq!(config.tick_period(), Duration::from_millis(20));

        let unpaced = AutoScrollConfig {
            tick_rate: 0.0,
            ..config
        };
        assert_eq!(unpaced.tick_period(), Duration::ZERO);
    }

    #[test]
    fn test_no_penetration_in_the_middle_of_the_display() {
        let scroller = EdgeScroller::new(AutoScrollConfig::default());
        let vp = panned(Size::new(640, 480));
        assert_eq!(scroller.velocity(&vp, Point::new(160, 120)), (0.0, 0.0));
    }

    #[test]
    fn test_right_edge_penetration_scales_velocity() {
        // Arrange
        let scroller = EdgeScroller::new(AutoScrollConfig::default());
        let vp = panned(Size::new(640, 200));

        // Act: last column of the display is full penetration (20px).
        let (vx, vy) = scroller.velocity(&vp, Point::new(319, 100));

        // Assert: 20/20 * 200 px/s / 50 ticks/s = 4 px per tick.
        assert_eq!(vx, -4.0);
        assert_eq!(vy, 0.0);
    }

    #[test]
    fn test_left_edge_ignored_when_view_already_at_left() {
        let scroller = EdgeScroller::new(AutoScrollConfig::default());
        let vp = panned(Size::new(640, 200));
        assert_eq!(vp.origin().x, 0);
        assert_eq!(scroller.penetration(&vp, Point::new(0, 100)), (0.0, 0.0));
    }

    #[test]
    fn test_fit_mode_never_scrolls() {
        let scroller = EdgeScroller::new(AutoScrollConfig::default());
        let mut vp = Viewport::new(BOTTOM, ScaleMode::Fit);
        vp.on_resize(Size::new(640, 480), Point::ORIGIN).unwrap();
        assert_eq!(scroller.velocity(&vp, Point::new(319, 239)), (0.0, 0.0));
    }

    #[test]
    fn test_real_event_starts_scrolling_and_requests_reinjection() {
        // Arrange
        let mut scroller = EdgeScroller::new(AutoScrollConfig::default());
        let mut vp = panned(Size::new(640, 200));

        // Act
        let step = scroller.step(&mut vp, Point::new(319, 100), PointerSource::Real, true);

        // Assert
        assert!(scroller.is_scrolling());
        assert!(step.reinject);
        assert_eq!(step.origin_moved, Some(Point::new(-4, vp.origin().y)));
    }

    #[test]
    fn test_synthetic_event_does_not_start_scrolling() {
        let mut scroller = EdgeScroller::new(AutoScrollConfig::default());
        let mut vp = panned(Size::new(640, 200));
        let step = scroller.step(&mut vp, Point::new(319, 100), PointerSource::Synthetic, true);
        assert!(!scroller.is_scrolling());
        assert!(!step.reinject);
    }

    #[test]
    fn test_released_touch_scrolls_without_reinjection() {
        let mut scroller = EdgeScroller::new(AutoScrollConfig::default());
        let mut vp = panned(Size::new(640, 200));
        let step = scroller.step(&mut vp, Point::new(319, 100), PointerSource::Real, false);
        assert!(step.origin_moved.is_some());
        assert!(!step.reinject);
    }

    #[test]
    fn test_leaving_band_stops_and_resets_accumulator() {
        // Arrange: scroll for a few ticks.
        let mut scroller = EdgeScroller::new(AutoScrollConfig::default());
        let mut vp = panned(Size::new(640, 200));
        for _ in 0..3 {
            scroller.step(&mut vp, Point::new(319, 100), PointerSource::Real, true);
        }
        let scrolled_to = vp.origin();

        // Act
        let step = scroller.step(&mut vp, Point::new(160, 100), PointerSource::Real, true);

        // Assert
        assert!(!scroller.is_scrolling());
        assert_eq!(step, ScrollStep::default());
        assert_eq!(vp.origin(), scrolled_to);

        // Re-entry continues from the current origin, not a stale accumulator.
        let step = scroller.step(&mut vp, Point::new(310, 100), PointerSource::Real, true);
        let expected = scrolled_to.x + (-(310 - 319 + 20) as f64 / 20.0 * 4.0) as i32;
        assert_eq!(step.origin_moved.map(|o| o.x), Some(expected));
    }

    #[test]
    fn test_scrolling_stops_at_content_edge() {
        let mut scroller = EdgeScroller::new(AutoScrollConfig::default());
        let mut vp = panned(Size::new(330, 200));
        for _ in 0..20 {
            scroller.step(&mut vp, Point::new(319, 100), PointerSource::Real, true);
        }
        assert_eq!(vp.origin().x, 320 - 330);
        assert_eq!(scroller.velocity(&vp, Point::new(319, 100)), (0.0, 0.0));
    }
}
