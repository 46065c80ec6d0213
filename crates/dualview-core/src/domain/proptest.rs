//! Property-based tests for the viewport engine and the edge auto-scroller.
//!
//! These tests use proptest to verify:
//! - Origin clamping is idempotent
//! - Fit mode keeps the origin at (0, 0) for any pointer input
//! - Pan mode keeps the device pointer inside the framebuffer
//! - Auto-scroll velocity is zero whenever penetration is zero

#![cfg(test)]

use proptest::prelude::*;

use crate::domain::autoscroll::{AutoScrollConfig, EdgeScroller, PointerSource};
use crate::domain::viewport::{DevicePointer, Point, ScaleMode, Size, Viewport};

// =============================================================================
// Arbitrary Generators
// =============================================================================

prop_compose! {
    fn arb_content()(
        width in 1u32..=1024,
        height in 1u32..=1024,
    ) -> Size {
        Size::new(width, height)
    }
}

prop_compose! {
    fn arb_display()(
        width in prop_oneof![Just(400u32), Just(320u32), 64u32..=800],
        height in prop_oneof![Just(240u32), 64u32..=600],
    ) -> Size {
        Size::new(width, height)
    }
}

fn arb_mode() -> impl Strategy<Value = ScaleMode> {
    prop_oneof![Just(ScaleMode::Fit), Just(ScaleMode::Pan)]
}

fn arb_point() -> impl Strategy<Value = Point> {
    (-5000i32..5000, -5000i32..5000).prop_map(|(x, y)| Point::new(x, y))
}

fn arb_deltas() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-600.0f64..600.0, -600.0f64..600.0), 0..64)
}

fn viewport(display: Size, mode: ScaleMode, content: Size, pointer: Point) -> Viewport {
    let mut vp = Viewport::new(display, mode);
    vp.on_resize(content, pointer)
        .expect("generated content is within the cap");
    vp
}

// =============================================================================
// Viewport Properties
// =============================================================================

proptest! {
    #[test]
    fn clamp_origin_is_idempotent(
        display in arb_display(),
        content in arb_content(),
        mode in arb_mode(),
        origin in arb_point(),
    ) {
        let vp = viewport(display, mode, content, Point::ORIGIN);
        let once = vp.clamp_origin(origin);
        prop_assert_eq!(vp.clamp_origin(once), once);
    }

    #[test]
    fn fit_mode_origin_is_always_zero(
        display in arb_display(),
        content in arb_content(),
        deltas in arb_deltas(),
    ) {
        let mut vp = viewport(display, ScaleMode::Fit, content, Point::ORIGIN);
        let mut pointer = DevicePointer::default();
        prop_assert_eq!(vp.origin(), Point::ORIGIN);
        for (dx, dy) in deltas {
            let update = vp.apply_pointer_delta(&mut pointer, dx, dy);
            prop_assert_eq!(update.origin_moved, None);
            prop_assert_eq!(vp.origin(), Point::ORIGIN);
        }
    }

    #[test]
    fn pan_mode_pointer_stays_inside_content(
        display in arb_display(),
        content in arb_content(),
        start in arb_point(),
        deltas in arb_deltas(),
    ) {
        let mut vp = viewport(display, ScaleMode::Pan, content, start);
        let mut pointer = DevicePointer::default();
        for (dx, dy) in deltas {
            let update = vp.apply_pointer_delta(&mut pointer, dx, dy);
            prop_assert!(update.position.x >= 0 && update.position.x <= content.width as i32);
            prop_assert!(update.position.y >= 0 && update.position.y <= content.height as i32);
            prop_assert_eq!(vp.clamp_origin(vp.origin()), vp.origin());
        }
    }
}

// =============================================================================
// Auto-scroll Properties
// =============================================================================

proptest! {
    #[test]
    fn velocity_is_zero_without_penetration(
        content in arb_content(),
        mode in arb_mode(),
        history in prop::collection::vec((0i32..320, 0i32..240, any::<bool>()), 0..32),
        probe in (0i32..320, 0i32..240),
    ) {
        let display = Size::new(320, 240);
        let mut vp = viewport(display, mode, content, Point::ORIGIN);
        let mut scroller = EdgeScroller::new(AutoScrollConfig::default());

        // Drive the scroller through an arbitrary prior state.
        for (x, y, held) in history {
            scroller.step(&mut vp, Point::new(x, y), PointerSource::Real, held);
        }

        let probe = Point::new(probe.0, probe.1);
        if scroller.penetration(&vp, probe) == (0.0, 0.0) {
            prop_assert_eq!(scroller.velocity(&vp, probe), (0.0, 0.0));
            let step = scroller.step(&mut vp, probe, PointerSource::Real, true);
            prop_assert_eq!(step.origin_moved, None);
            prop_assert!(!step.reinject);
            prop_assert!(!scroller.is_scrolling());
        }
    }
}
