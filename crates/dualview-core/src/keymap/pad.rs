//! Physical input sources of the handheld: face buttons, shoulders, and the
//! three directional clusters (circle pad, D-pad, C-stick).
//!
//! Every source has a stable textual name used by the key binding file and a
//! bit position used in the held-buttons mask of telemetry samples.

/// A named physical input on the device.
///
/// Directional clusters are split into one source per direction so that an
/// analog stick or a hat behaves exactly like four independent buttons once
/// it has been normalized by the input router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PadButton {
    A,
    B,
    X,
    Y,
    L,
    R,
    Zl,
    Zr,
    Start,
    Select,
    CpadUp,
    CpadDown,
    CpadLeft,
    CpadRight,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
    CstickUp,
    CstickDown,
    CstickLeft,
    CstickRight,
}

impl PadButton {
    /// All sources in binding-file order.
    pub const ALL: [PadButton; 22] = [
        PadButton::A,
        PadButton::B,
        PadButton::X,
        PadButton::Y,
        PadButton::L,
        PadButton::R,
        PadButton::Zl,
        PadButton::Zr,
        PadButton::Start,
        PadButton::Select,
        PadButton::CpadUp,
        PadButton::CpadDown,
        PadButton::CpadLeft,
        PadButton::CpadRight,
        PadButton::DpadUp,
        PadButton::DpadDown,
        PadButton::DpadLeft,
        PadButton::DpadRight,
        PadButton::CstickUp,
        PadButton::CstickDown,
        PadButton::CstickLeft,
        PadButton::CstickRight,
    ];

    /// The name used for this source in the key binding file.
    pub fn name(self) -> &'static str {
        match self {
            PadButton::A => "A",
            PadButton::B => "B",
            PadButton::X => "X",
            PadButton::Y => "Y",
            PadButton::L => "L",
            PadButton::R => "R",
            PadButton::Zl => "ZL",
            PadButton::Zr => "ZR",
            PadButton::Start => "START",
            PadButton::Select => "SELECT",
            PadButton::CpadUp => "CPAD_UP",
            PadButton::CpadDown => "CPAD_DOWN",
            PadButton::CpadLeft => "CPAD_LEFT",
            PadButton::CpadRight => "CPAD_RIGHT",
            PadButton::DpadUp => "DPAD_UP",
            PadButton::DpadDown => "DPAD_DOWN",
            PadButton::DpadLeft => "DPAD_LEFT",
            PadButton::DpadRight => "DPAD_RIGHT",
            PadButton::CstickUp => "CSTCK_UP",
            PadButton::CstickDown => "CSTCK_DOWN",
            PadButton::CstickLeft => "CSTCK_LEFT",
            PadButton::CstickRight => "CSTCK_RIGHT",
        }
    }

    /// Looks a source up by its binding-file name. Matching is exact.
    pub fn from_name(name: &str) -> Option<PadButton> {
        PadButton::ALL.iter().copied().find(|b| b.name() == name)
    }

    /// Bit position of this source in a held-buttons mask.
    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Maps an emulated joystick button index to its pad source.
    ///
    /// Returns `None` for indices the device does not report.
    pub fn from_joystick_button(index: u8) -> Option<PadButton> {
        match index {
            0 => Some(PadButton::Start),
            1 => Some(PadButton::A),
            2 => Some(PadButton::B),
            3 => Some(PadButton::X),
            4 => Some(PadButton::Y),
            5 => Some(PadButton::L),
            6 => Some(PadButton::R),
            7 => Some(PadButton::Select),
            8 => Some(PadButton::Zl),
            9 => Some(PadButton::Zr),
            _ => None,
        }
    }

    /// Directional sources driven by an analog axis half.
    ///
    /// `axis` 0/1 are the circle pad X/Y, 2/3 the C-stick X/Y. The first
    /// element is the positive half (right/down), the second the negative one.
    pub fn for_axis(axis: u8) -> Option<(PadButton, PadButton)> {
        match axis {
            0 => Some((PadButton::CpadRight, PadButton::CpadLeft)),
            1 => Some((PadButton::CpadDown, PadButton::CpadUp)),
            2 => Some((PadButton::CstickRight, PadButton::CstickLeft)),
            3 => Some((PadButton::CstickDown, PadButton::CstickUp)),
            _ => None,
        }
    }

    /// D-pad source for one bit of a hat value (`1` up, `2` right, `4` down, `8` left).
    pub fn for_hat_bit(bit: u8) -> Option<PadButton> {
        match bit {
            0x01 => Some(PadButton::DpadUp),
            0x02 => Some(PadButton::DpadRight),
            0x04 => Some(PadButton::DpadDown),
            0x08 => Some(PadButton::DpadLeft),
            _ => None,
        }
    }
}

impl std::fmt::Display for PadButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
