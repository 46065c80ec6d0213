//! Infrastructure layer: adapters behind the application's seams.
//!
//! - **`input_capture`** – raw input events from the backend.
//! - **`display`** – surfaces, presentation, backlight and local keyboard.
//! - **`remote`** – remote-framebuffer connectors.
//! - **`network`** – UDP telemetry services.
//! - **`storage`** – TOML configuration and key binding files.
//!
//! Each adapter module carries a `mock` sibling used by the tests.

pub mod display;
pub mod input_capture;
pub mod network;
pub mod remote;
pub mod storage;
