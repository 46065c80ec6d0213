//! # dualview-core
//!
//! Platform-independent core of the DualView remote-display viewer: the key
//! binding table, the viewport/scroll engine and the telemetry datagram
//! codec.
//!
//! This crate is used by the `dualview` application crate. It has no
//! dependencies on OS APIs, display backends or network sockets.
//!
//! # Architecture overview
//!
//! DualView drives up to two remote-framebuffer sessions at once, one per
//! physical screen of a dual-screen handheld. Local input from buttons,
//! sticks and the touch screen is turned into remote key and pointer events
//! for whichever session is the current target.
//!
//! - **`keymap`** – Named pad inputs and the two-layer binding table that
//!   resolves them to remote KeySyms, pointer buttons or local control codes.
//!
//! - **`domain`** – The [`Viewport`]: how a framebuffer of any size is fitted
//!   or panned on a fixed display, and the [`EdgeScroller`] that scrolls a
//!   panned view while the pointer rests near an edge.
//!
//! - **`protocol`** – The small datagram format spoken by the telemetry
//!   services.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::autoscroll::{AutoScrollConfig, EdgeScroller, PointerSource, ScrollStep};
pub use domain::screen::Screen;
pub use domain::viewport::{
    DevicePointer, FitAxis, Point, PointerUpdate, Rect, ResizeError, ScaleMode, Scrollbars,
    Size, SurfaceSpec, Viewport,
};
pub use keymap::{BindingEntry, BindingTable, ControlCode, Layer, PadButton, ResolvedCode};
pub use protocol::codec::{decode_datagram, encode_datagram, CodecError};
pub use protocol::messages::{InputSample, MotionSample, TelemetryMessage};
