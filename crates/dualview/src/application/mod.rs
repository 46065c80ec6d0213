//! Application layer use cases.
//!
//! Use cases orchestrate the domain types from `dualview_core` and talk to
//! the outside world only through traits, so each one is testable with the
//! recording mocks under `infrastructure`.
//!
//! # Sub-modules
//!
//! - **`route_input`** – Normalizes raw input into key, pointer and control
//!   actions for the current event target. Runs for every input event.
//!
//! - **`manage_sessions`** – Owns the top and bottom remote sessions, their
//!   viewports and the resize path into the display backend.
//!
//! - **`telemetry`** – Steps the auxiliary UDP services once per tick.
//!
//! - **`event_loop`** – The single-threaded loop tying the above together.

pub mod event_loop;
pub mod manage_sessions;
pub mod route_input;
pub mod telemetry;
