//! The two physical displays of the device.

use serde::{Deserialize, Serialize};

/// A physical display, and the session slot that renders on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Screen {
    Top,
    Bottom,
}

impl Screen {
    pub const ALL: [Screen; 2] = [Screen::Top, Screen::Bottom];

    /// Slot index (`0` top, `1` bottom).
    pub fn index(self) -> usize {
        match self {
            Screen::Top => 0,
            Screen::Bottom => 1,
        }
    }

    pub fn other(self) -> Screen {
        match self {
            Screen::Top => Screen::Bottom,
            Screen::Bottom => Screen::Top,
        }
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Screen::Top => "top",
            Screen::Bottom => "bottom",
        })
    }
}
