//! Storage infrastructure: configuration and key binding files.
//!
//! - `config` reads and writes the TOML configuration file from the
//!   platform-appropriate directory, with defaults on first run.
//! - `keymap_file` finds the binding file for a saved entry and writes the
//!   default table when none exists.

pub mod config;
pub mod keymap_file;
