//! Raw input events from the display/input backend.
//!
//! The backend reports four families of input: emulated joystick buttons,
//! joystick axis and hat motion, keyboard keys (from the on-screen keyboard)
//! and pointer/touch motion and buttons. Each family is one variant of
//! [`RawInputEvent`]; the input router normalizes them.
//!
//! # Testability
//!
//! The [`InputSource`] trait allows tests to inject synthetic events through
//! [`mock::MockInputSource`] without a real backend.

use dualview_core::PointerSource;

pub mod mock;

/// A raw input event as polled from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInputEvent {
    /// An emulated joystick button changed state.
    JoyButton {
        /// Joystick button index (`0` START ... `9` ZR).
        index: u8,
        pressed: bool,
    },
    /// An analog axis moved.
    JoyAxis {
        /// `0`/`1` circle pad X/Y, `2`/`3` C-stick X/Y.
        axis: u8,
        value: i16,
    },
    /// The D-pad hat changed; `value` is the full bitmask of held directions.
    JoyHat { value: u8 },
    /// A key of the local keyboard. `sym` is already a resolved code.
    Key { sym: u32, pressed: bool },
    /// The pointer moved.
    PointerMotion {
        /// Absolute position on the touch display.
        x: i32,
        y: i32,
        /// Relative movement since the previous motion event.
        dx: i32,
        dy: i32,
        source: PointerSource,
    },
    /// A pointer button changed state at a touch display position.
    PointerButton {
        /// Button `1..=5`.
        button: u8,
        pressed: bool,
        x: i32,
        y: i32,
    },
    /// The backend asked the application to exit.
    Quit,
}

/// Trait abstracting the backend's input queue.
pub trait InputSource {
    /// Returns the next pending event without blocking.
    fn poll_event(&mut self) -> Option<RawInputEvent>;

    /// Whether the touch screen is currently held down.
    fn touch_held(&self) -> bool;
}

/// An [`InputSource`] that never reports anything, for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl InputSource for NoInput {
    fn poll_event(&mut self) -> Option<RawInputEvent> {
        None
    }

    fn touch_held(&self) -> bool {
        false
    }
}
