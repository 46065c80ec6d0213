//! Pure viewport logic for DualView.
//!
//! Nothing here touches sockets, surfaces or the clock, so every rule about
//! how remote content is placed on a physical display can be tested in
//! isolation.

/// Edge auto-scroll for the touch-driven session.
pub mod autoscroll;

/// Top and bottom display identifiers.
pub mod screen;

/// Per-session coordinate transform and scroll state.
///
/// See [`viewport::Viewport`] for the main type.
pub mod viewport;

mod proptest;
