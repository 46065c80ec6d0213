//! RouteInput use case: turns raw backend input into session actions.
//!
//! Four raw source families are normalized into pad-button edges first:
//! emulated joystick buttons map directly, analog axes become press/release
//! edges when they cross the dead zone, and hat values are edge-detected per
//! direction bit. Every edge is then resolved through the [`BindingTable`]
//! in the layer that was active when the input went down.
//!
//! Resolved control codes are handled here and never reach a session. Key
//! symbols and pointer buttons go to the *effective target*: the selected
//! screen if its session is live, otherwise whichever session is.
//!
//! Pointer/touch input is interpreted per target:
//!
//! - **bottom**: the touch display shows the bottom session, so positions are
//!   absolute and drive the edge auto-scroller.
//! - **top**: the touch display acts as a touchpad; relative motion moves
//!   the top session's pointer through its [`Viewport`].
//!
//! # Architecture
//!
//! The router owns all cross-tick input state ([`InputFrameState`]) and only
//! borrows the session viewports for the duration of one call through
//! [`RouteContext`]. It performs no I/O: the event loop dispatches the returned
//! [`RoutedAction`]s.

use dualview_core::{
    AutoScrollConfig, BindingTable, ControlCode, DevicePointer, EdgeScroller, InputSample,
    PadButton, Point, PointerSource, ResolvedCode, Screen, Scrollbars, Viewport,
};
use tracing::{debug, trace};

use crate::infrastructure::input_capture::RawInputEvent;

/// Pointer buttons 4 and 5 (wheel) are momentary.
const WHEEL_MASK: u8 = 0b1_1000;

/// Number of analog axes reported by the pad.
const AXIS_COUNT: usize = 4;

/// A side effect requested by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutedAction {
    /// Forward a key event to a session.
    Key {
        screen: Screen,
        keysym: u32,
        pressed: bool,
    },
    /// Forward the pointer state to a session.
    Pointer {
        screen: Screen,
        position: Point,
        buttons: u8,
    },
    /// The visible window of a panned session moved.
    MoveViewport {
        screen: Screen,
        origin: Point,
        scrollbars: Scrollbars,
    },
    /// Switch a session between fit and pan mode.
    ToggleScaling { screen: Screen },
    /// The event target switched to `target`.
    TargetChanged { target: Screen },
    ToggleBacklight,
    ToggleKeyboard,
    /// End every session on user request.
    Disconnect,
    /// The backend asked to exit.
    Quit,
}

/// Live session viewports, borrowed for one routing call.
pub struct RouteContext<'a> {
    /// Indexed by [`Screen::index`]; `None` when that session is not live.
    pub viewports: [Option<&'a mut Viewport>; 2],
    /// Whether the touch display is currently held.
    pub touch_held: bool,
}

impl<'a> RouteContext<'a> {
    pub fn new(viewports: [Option<&'a mut Viewport>; 2], touch_held: bool) -> Self {
        Self {
            viewports,
            touch_held,
        }
    }

    fn is_live(&self, screen: Screen) -> bool {
        self.viewports[screen.index()].is_some()
    }
}

/// Input state carried across ticks.
#[derive(Debug, Clone)]
pub struct InputFrameState {
    pointers: [DevicePointer; 2],
    buttons: u8,
    meta_active: bool,
    target: Screen,
    scroller: EdgeScroller,
    scheduled: Option<RawInputEvent>,
    /// Code each held pad input resolved to when it went down.
    pressed_codes: [Option<ResolvedCode>; PadButton::ALL.len()],
    /// Bit `2a` is axis `a` past `+dead_zone`, bit `2a + 1` past `-dead_zone`.
    axis_bits: u8,
    hat: u8,
    held: u32,
    axes: [i16; AXIS_COUNT],
    touch: Option<[u16; 2]>,
}

impl InputFrameState {
    fn new(autoscroll: AutoScrollConfig) -> Self {
        Self {
            pointers: [DevicePointer::default(); 2],
            buttons: 0,
            meta_active: false,
            target: Screen::Top,
            scroller: EdgeScroller::new(autoscroll),
            scheduled: None,
            pressed_codes: [None; PadButton::ALL.len()],
            axis_bits: 0,
            hat: 0,
            held: 0,
            axes: [0; AXIS_COUNT],
            touch: None,
        }
    }
}

/// The input router.
pub struct InputRouter {
    bindings: BindingTable,
    dead_zone: i16,
    state: InputFrameState,
}

impl InputRouter {
    pub fn new(bindings: BindingTable, dead_zone: i16, autoscroll: AutoScrollConfig) -> Self {
        Self {
            bindings,
            dead_zone: dead_zone.max(0),
            state: InputFrameState::new(autoscroll),
        }
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Selected target; see [`effective_target`](Self::effective_target).
    pub fn target(&self) -> Screen {
        self.state.target
    }

    pub fn set_target(&mut self, target: Screen) {
        self.state.target = target;
    }

    pub fn meta_active(&self) -> bool {
        self.state.meta_active
    }

    /// Held pointer-button mask (bit `n - 1` for button `n`).
    pub fn buttons(&self) -> u8 {
        self.state.buttons
    }

    /// Current device coordinate of the pointer on `screen`.
    pub fn pointer(&self, screen: Screen) -> Point {
        self.state.pointers[screen.index()].position()
    }

    pub fn is_scrolling(&self) -> bool {
        self.state.scroller.is_scrolling()
    }

    /// The screen that receives key and pointer input.
    pub fn effective_target(&self, ctx: &RouteContext<'_>) -> Option<Screen> {
        let selected = self.state.target;
        if ctx.is_live(selected) {
            Some(selected)
        } else if ctx.is_live(selected.other()) {
            Some(selected.other())
        } else {
            None
        }
    }

    /// Removes the synthetic event scheduled by the auto-scroller, if any.
    pub fn take_scheduled(&mut self) -> Option<RawInputEvent> {
        self.state.scheduled.take()
    }

    pub fn has_scheduled(&self) -> bool {
        self.state.scheduled.is_some()
    }

    /// Discards every piece of per-session input state: pointers, held
    /// inputs, the meta layer, the target and any pending scroll.
    pub fn reset(&mut self) {
        let autoscroll = *self.state.scroller.config();
        self.state = InputFrameState::new(autoscroll);
    }

    /// Snapshot of the pad for telemetry. `motion` is filled in by the caller.
    pub fn sample(&self, timestamp_us: u64) -> InputSample {
        let axes = self.state.axes;
        InputSample {
            timestamp_us,
            buttons: self.state.held,
            circle_pad: [axes[0], axes[1]],
            c_stick: [axes[2], axes[3]],
            touch: self.state.touch,
            motion: None,
        }
    }

    /// Routes one raw event.
    pub fn route(&mut self, event: RawInputEvent, ctx: &mut RouteContext<'_>) -> Vec<RoutedAction> {
        trace!(?event, "routing");
        let mut actions = Vec::new();
        match event {
            RawInputEvent::JoyButton { index, pressed } => match PadButton::from_joystick_button(index) {
                Some(button) => self.pad_edge(button, pressed, ctx, &mut actions),
                None => debug!(index, "unmapped joystick button"),
            },
            RawInputEvent::JoyAxis { axis, value } => self.axis_motion(axis, value, ctx, &mut actions),
            RawInputEvent::JoyHat { value } => self.hat_motion(value, ctx, &mut actions),
            RawInputEvent::Key { sym, pressed } => {
                let code = ResolvedCode::from_raw(sym);
                self.dispatch_code(code, pressed, ctx, &mut actions);
            }
            RawInputEvent::PointerMotion {
                x,
                y,
                dx,
                dy,
                source,
            } => {
                if source == PointerSource::Real && self.state.touch.is_some() {
                    self.state.touch = Some(touch_point(x, y));
                }
                self.pointer_motion(Point::new(x, y), dx, dy, source, ctx, &mut actions);
            }
            RawInputEvent::PointerButton {
                button,
                pressed,
                x,
                y,
            } => {
                if button == 1 {
                    self.state.touch = pressed.then(|| touch_point(x, y));
                }
                if let Some(Screen::Bottom) = self.effective_target(ctx) {
                    self.absolute_pointer(Point::new(x, y), PointerSource::Real, ctx, &mut actions);
                }
                self.pointer_button(button, pressed, ctx, &mut actions);
            }
            RawInputEvent::Quit => actions.push(RoutedAction::Quit),
        }
        actions
    }

    // ── Pad normalization ─────────────────────────────────────────────────────

    fn pad_edge(
        &mut self,
        button: PadButton,
        pressed: bool,
        ctx: &mut RouteContext<'_>,
        actions: &mut Vec<RoutedAction>,
    ) {
        let slot = button as usize;
        let code = if pressed {
            self.state.held |= button.bit();
            let code = self.bindings.resolve(button, self.state.meta_active);
            self.state.pressed_codes[slot] = Some(code);
            code
        } else {
            self.state.held &= !button.bit();
            self.state.pressed_codes[slot]
                .take()
                .unwrap_or_else(|| self.bindings.resolve(button, self.state.meta_active))
        };
        trace!(%button, pressed, ?code, "pad edge");
        self.dispatch_code(code, pressed, ctx, actions);
    }

    fn axis_motion(
        &mut self,
        axis: u8,
        value: i16,
        ctx: &mut RouteContext<'_>,
        actions: &mut Vec<RoutedAction>,
    ) {
        let Some((positive, negative)) = PadButton::for_axis(axis) else {
            debug!(axis, "unmapped joystick axis");
            return;
        };
        self.state.axes[usize::from(axis)] = value;

        let pos_bit = 1u8 << (2 * axis);
        let neg_bit = pos_bit << 1;
        let mut bits = self.state.axis_bits & !(pos_bit | neg_bit);
        if value > self.dead_zone {
            bits |= pos_bit;
        } else if value < -self.dead_zone {
            bits |= neg_bit;
        }
        let changed = bits ^ self.state.axis_bits;
        self.state.axis_bits = bits;

        for (bit, button) in [(pos_bit, positive), (neg_bit, negative)] {
            if changed & bit != 0 {
                self.pad_edge(button, bits & bit != 0, ctx, actions);
            }
        }
    }

    fn hat_motion(&mut self, value: u8, ctx: &mut RouteContext<'_>, actions: &mut Vec<RoutedAction>) {
        let changed = (value ^ self.state.hat) & 0x0F;
        self.state.hat = value & 0x0F;
        for bit in [0x01u8, 0x02, 0x04, 0x08] {
            if changed & bit == 0 {
                continue;
            }
            if let Some(button) = PadButton::for_hat_bit(bit) {
                self.pad_edge(button, value & bit != 0, ctx, actions);
            }
        }
    }

    // ── Resolved codes ────────────────────────────────────────────────────────

    fn dispatch_code(
        &mut self,
        code: ResolvedCode,
        pressed: bool,
        ctx: &mut RouteContext<'_>,
        actions: &mut Vec<RoutedAction>,
    ) {
        match code {
            ResolvedCode::Unbound => {}
            ResolvedCode::Control(control) => self.control(control, pressed, ctx, actions),
            ResolvedCode::PointerButton(button) => self.pointer_button(button, pressed, ctx, actions),
            ResolvedCode::KeySym(keysym) => {
                if let Some(screen) = self.effective_target(ctx) {
                    actions.push(RoutedAction::Key {
                        screen,
                        keysym,
                        pressed,
                    });
                }
            }
        }
    }

    fn control(
        &mut self,
        control: ControlCode,
        pressed: bool,
        ctx: &mut RouteContext<'_>,
        actions: &mut Vec<RoutedAction>,
    ) {
        if control == ControlCode::Meta {
            self.state.meta_active = pressed;
            return;
        }
        if !pressed {
            return;
        }
        debug!(?control, "control code");
        match control {
            ControlCode::Meta => {}
            ControlCode::ToggleKeyboard => actions.push(RoutedAction::ToggleKeyboard),
            ControlCode::Disconnect => actions.push(RoutedAction::Disconnect),
            ControlCode::ToggleBacklight => actions.push(RoutedAction::ToggleBacklight),
            ControlCode::ToggleScaling => {
                if let Some(screen) = self.effective_target(ctx) {
                    actions.push(RoutedAction::ToggleScaling { screen });
                }
            }
            ControlCode::ToggleTarget => {
                if ctx.is_live(Screen::Top) && ctx.is_live(Screen::Bottom) {
                    self.state.target = self.state.target.other();
                    self.state.scroller.reset();
                    actions.push(RoutedAction::TargetChanged {
                        target: self.state.target,
                    });
                }
            }
        }
    }

    // ── Pointer ───────────────────────────────────────────────────────────────

    fn pointer_button(
        &mut self,
        button: u8,
        pressed: bool,
        ctx: &mut RouteContext<'_>,
        actions: &mut Vec<RoutedAction>,
    ) {
        if !(1..=8).contains(&button) {
            debug!(button, "pointer button out of range");
            return;
        }
        let bit = 1u8 << (button - 1);
        if pressed {
            self.state.buttons |= bit;
        } else {
            self.state.buttons &= !bit;
        }
        if let Some(screen) = self.effective_target(ctx) {
            self.emit_pointer(screen, actions);
        }
    }

    fn pointer_motion(
        &mut self,
        screen_pos: Point,
        dx: i32,
        dy: i32,
        source: PointerSource,
        ctx: &mut RouteContext<'_>,
        actions: &mut Vec<RoutedAction>,
    ) {
        match self.effective_target(ctx) {
            Some(Screen::Bottom) => {
                self.absolute_pointer(screen_pos, source, ctx, actions);
                self.emit_pointer(Screen::Bottom, actions);
            }
            Some(Screen::Top) => {
                if source == PointerSource::Synthetic {
                    return;
                }
                let Some(viewport) = ctx.viewports[Screen::Top.index()].as_deref_mut() else {
                    return;
                };
                let pointer = &mut self.state.pointers[Screen::Top.index()];
                let update = viewport.apply_pointer_delta(pointer, f64::from(dx), f64::from(dy));
                if let Some(origin) = update.origin_moved {
                    actions.push(RoutedAction::MoveViewport {
                        screen: Screen::Top,
                        origin,
                        scrollbars: viewport.scrollbars(),
                    });
                }
                self.emit_pointer(Screen::Top, actions);
            }
            None => {}
        }
    }

    /// Maps an absolute touch position onto the bottom session, auto-scrolling
    /// first when it sits in an edge band.
    fn absolute_pointer(
        &mut self,
        screen_pos: Point,
        source: PointerSource,
        ctx: &mut RouteContext<'_>,
        actions: &mut Vec<RoutedAction>,
    ) {
        let Some(viewport) = ctx.viewports[Screen::Bottom.index()].as_deref_mut() else {
            return;
        };
        let step = self
            .state
            .scroller
            .step(viewport, screen_pos, source, ctx.touch_held);
        if let Some(origin) = step.origin_moved {
            actions.push(RoutedAction::MoveViewport {
                screen: Screen::Bottom,
                origin,
                scrollbars: viewport.scrollbars(),
            });
        }
        if step.reinject {
            self.state.scheduled = Some(RawInputEvent::PointerMotion {
                x: screen_pos.x,
                y: screen_pos.y,
                dx: 0,
                dy: 0,
                source: PointerSource::Synthetic,
            });
        }
        let position = viewport.screen_to_content(screen_pos);
        self.state.pointers[Screen::Bottom.index()].set(position);
    }

    fn emit_pointer(&mut self, screen: Screen, actions: &mut Vec<RoutedAction>) {
        actions.push(RoutedAction::Pointer {
            screen,
            position: self.pointer(screen),
            buttons: self.state.buttons,
        });
        self.state.buttons &= !WHEEL_MASK;
    }
}

fn touch_point(x: i32, y: i32) -> [u16; 2] {
    [
        x.clamp(0, i32::from(u16::MAX)) as u16,
        y.clamp(0, i32::from(u16::MAX)) as u16,
    ]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
