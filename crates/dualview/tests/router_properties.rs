//! Property tests for input routing.
//!
//! - Axis motion produces balanced press/release edges.
//! - Reserved control codes never leave the router as key events.

use dualview::application::route_input::{InputRouter, RouteContext, RoutedAction};
use dualview::infrastructure::input_capture::RawInputEvent;
use dualview_core::keymap::keysym::{XK_LEFT, XK_RIGHT};
use dualview_core::{
    AutoScrollConfig, BindingTable, Point, PointerSource, ResolvedCode, ScaleMode, Size, Viewport,
};
use proptest::prelude::*;

const DEAD_ZONE: i16 = 16384;

fn viewports() -> (Viewport, Viewport) {
    let mut top = Viewport::new(Size::new(400, 240), ScaleMode::Pan);
    top.on_resize(Size::new(800, 600), Point::ORIGIN).unwrap();
    let mut bottom = Viewport::new(Size::new(320, 240), ScaleMode::Pan);
    bottom.on_resize(Size::new(640, 480), Point::ORIGIN).unwrap();
    (top, bottom)
}

fn arb_event() -> impl Strategy<Value = RawInputEvent> {
    prop_oneof![
        (0u8..12, any::<bool>()).prop_map(|(index, pressed)| RawInputEvent::JoyButton { index, pressed }),
        (0u8..5, any::<i16>()).prop_map(|(axis, value)| RawInputEvent::JoyAxis { axis, value }),
        (0u8..16).prop_map(|value| RawInputEvent::JoyHat { value }),
        (0u32..64, any::<bool>()).prop_map(|(sym, pressed)| RawInputEvent::Key { sym, pressed }),
        (0i32..320, 0i32..240, -20i32..20, -20i32..20).prop_map(|(x, y, dx, dy)| {
            RawInputEvent::PointerMotion {
                x,
                y,
                dx,
                dy,
                source: PointerSource::Real,
            }
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn axis_edges_balance(values in prop::collection::vec(any::<i16>(), 0..64)) {
        let mut router = InputRouter::new(BindingTable::default(), DEAD_ZONE, AutoScrollConfig::default());
        let (mut top, _) = viewports();
        let mut ctx = RouteContext::new([Some(&mut top), None], false);

        let mut balance = [0i32; 2];
        for value in &values {
            for action in router.route(RawInputEvent::JoyAxis { axis: 0, value: *value }, &mut ctx) {
                if let RoutedAction::Key { keysym, pressed, .. } = action {
                    let slot = match keysym {
                        XK_RIGHT => 0,
                        XK_LEFT => 1,
                        other => panic!("unexpected keysym {other:#x}"),
                    };
                    balance[slot] += if pressed { 1 } else { -1 };
                    prop_assert!((0..=1).contains(&balance[slot]));
                }
            }
        }

        let last = values.last().copied().unwrap_or(0);
        prop_assert_eq!(balance[0], i32::from(last > DEAD_ZONE));
        prop_assert_eq!(balance[1], i32::from(last < -DEAD_ZONE));
    }

    #[test]
    fn control_codes_never_sent_as_keys(events in prop::collection::vec(arb_event(), 0..128)) {
        let mut router = InputRouter::new(BindingTable::default(), DEAD_ZONE, AutoScrollConfig::default());
        let (mut top, mut bottom) = viewports();
        let mut ctx = RouteContext::new([Some(&mut top), Some(&mut bottom)], false);

        for event in events {
            for action in router.route(event, &mut ctx) {
                if let RoutedAction::Key { keysym, .. } = action {
                    prop_assert_eq!(ResolvedCode::from_raw(keysym), ResolvedCode::KeySym(keysym));
                }
            }
        }
    }
}
