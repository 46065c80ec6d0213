//! Key binding table: maps physical pad inputs to remote key codes.
//!
//! Every [`PadButton`] owns one [`BindingEntry`] with two resolved codes: one
//! for the base layer and one for the *meta* layer, which is active while the
//! input bound to [`ControlCode::Meta`] is held.
//!
//! # Resolved-code numbering
//!
//! Binding files store plain integers. They are interpreted as follows:
//!
//! | Raw value  | Meaning                                             |
//! |------------|-----------------------------------------------------|
//! | `0`        | unbound                                             |
//! | `1..=6`    | local control code, never sent to a remote session  |
//! | `7..=15`   | reserved, treated as unbound                        |
//! | `16..=20`  | pointer button 1..5 (left, middle, right, wheel)    |
//! | other      | X11 KeySym forwarded verbatim                       |
//!
//! # Binding file format
//!
//! One binding per line, `<name> <hexcode>`. Base-layer names are the pad
//! names (`A`, `CPAD_UP`, ...); meta-layer names carry a `META_` prefix
//! (`META_A`). Lines starting with `#` and lines that do not parse are
//! skipped, and names that match no entry are ignored.

pub mod keysym;
pub mod pad;

pub use pad::PadButton;

use keysym::*;
use tracing::debug;

/// Prefix that addresses the meta layer in a binding file.
pub const META_PREFIX: &str = "META_";

/// First raw value of the pointer-button band.
const POINTER_BUTTON_BASE: u32 = 16;

/// Number of pointer buttons addressable from a binding.
pub const POINTER_BUTTON_COUNT: u8 = 5;

/// Local actions intercepted by the input router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ControlCode {
    /// Hold to resolve subsequent inputs through the meta layer.
    Meta = 1,
    /// Show or hide the local on-screen keyboard.
    ToggleKeyboard = 2,
    /// End the running sessions.
    Disconnect = 3,
    /// Switch the targeted session between fit and pan mode.
    ToggleScaling = 4,
    /// Switch the secondary display backlight.
    ToggleBacklight = 5,
    /// Send input to the other session.
    ToggleTarget = 6,
}

impl ControlCode {
    /// Returns the control code for a raw value in the reserved band.
    pub fn from_raw(raw: u32) -> Option<ControlCode> {
        match raw {
            1 => Some(ControlCode::Meta),
            2 => Some(ControlCode::ToggleKeyboard),
            3 => Some(ControlCode::Disconnect),
            4 => Some(ControlCode::ToggleScaling),
            5 => Some(ControlCode::ToggleBacklight),
            6 => Some(ControlCode::ToggleTarget),
            _ => None,
        }
    }
}

/// What a pad input does once resolved through the binding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolvedCode {
    /// Nothing happens.
    Unbound,
    /// A local control action.
    Control(ControlCode),
    /// Pointer button `1..=5`.
    PointerButton(u8),
    /// An X11 KeySym for the remote session.
    KeySym(u32),
}

impl ResolvedCode {
    /// Interprets a raw binding value.
    pub fn from_raw(raw: u32) -> ResolvedCode {
        if let Some(code) = ControlCode::from_raw(raw) {
            return ResolvedCode::Control(code);
        }
        match raw {
            0..=15 => ResolvedCode::Unbound,
            POINTER_BUTTON_BASE..=20 => {
                ResolvedCode::PointerButton((raw - POINTER_BUTTON_BASE + 1) as u8)
            }
            _ => ResolvedCode::KeySym(raw),
        }
    }

    /// The raw value written to a binding file.
    pub fn to_raw(self) -> u32 {
        match self {
            ResolvedCode::Unbound => 0,
            ResolvedCode::Control(code) => code as u32,
            ResolvedCode::PointerButton(n) => POINTER_BUTTON_BASE + u32::from(n) - 1,
            ResolvedCode::KeySym(sym) => sym,
        }
    }
}

/// Which layer of the binding table a lookup uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Base,
    Meta,
}

/// One row of the binding table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingEntry {
    pub button: PadButton,
    pub base: ResolvedCode,
    pub meta: ResolvedCode,
}

impl BindingEntry {
    /// Binding-file name of the entry (base layer).
    pub fn name(&self) -> &'static str {
        self.button.name()
    }
}

/// Outcome of applying a binding file on top of a table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OverrideReport {
    /// Bindings that replaced a table value.
    pub applied: usize,
    /// Well-formed lines whose name matched no entry.
    pub ignored: Vec<String>,
}

/// The full binding table, one entry per [`PadButton`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTable {
    entries: Vec<BindingEntry>,
}

impl Default for BindingTable {
    fn default() -> Self {
        let entries = PadButton::ALL
            .iter()
            .map(|&button| {
                let (base, meta) = default_binding(button);
                BindingEntry {
                    button,
                    base: ResolvedCode::from_raw(base),
                    meta: ResolvedCode::from_raw(meta),
                }
            })
            .collect();
        Self { entries }
    }
}

impl BindingTable {
    /// Resolves a pad input through the base or meta layer.
    pub fn resolve(&self, button: PadButton, meta_active: bool) -> ResolvedCode {
        let entry = self.entry(button);
        if meta_active {
            entry.meta
        } else {
            entry.base
        }
    }

    /// Returns the entry for `button`.
    pub fn entry(&self, button: PadButton) -> &BindingEntry {
        // Entries are built from PadButton::ALL, whose order matches the enum discriminants.
        &self.entries[button as usize]
    }

    /// All entries in binding-file order.
    pub fn entries(&self) -> &[BindingEntry] {
        &self.entries
    }

    /// Replaces one binding.
    pub fn set(&mut self, button: PadButton, layer: Layer, code: ResolvedCode) {
        let entry = &mut self.entries[button as usize];
        match layer {
            Layer::Base => entry.base = code,
            Layer::Meta => entry.meta = code,
        }
    }

    /// Looks up a binding-file name, returning the pad input and layer it addresses.
    pub fn lookup_name(name: &str) -> Option<(PadButton, Layer)> {
        if let Some(rest) = name.strip_prefix(META_PREFIX) {
            return PadButton::from_name(rest).map(|b| (b, Layer::Meta));
        }
        PadButton::from_name(name).map(|b| (b, Layer::Base))
    }

    /// Overlays the bindings found in `text` (binding-file syntax) on this table.
    ///
    /// Entries not mentioned keep their current value; unknown names are
    /// reported in [`OverrideReport::ignored`] and otherwise skipped.
    pub fn apply_overrides(&mut self, text: &str) -> OverrideReport {
        let mut report = OverrideReport::default();
        for (name, raw) in text.lines().filter_map(parse_line) {
            match Self::lookup_name(&name) {
                Some((button, layer)) => {
                    self.set(button, layer, ResolvedCode::from_raw(raw));
                    report.applied += 1;
                }
                None => {
                    debug!(name = %name, "ignoring binding for unknown input");
                    report.ignored.push(name);
                }
            }
        }
        report
    }

    /// Renders the table in binding-file syntax, with an explanatory header.
    pub fn to_file_string(&self) -> String {
        let mut out = String::from(FILE_HEADER);
        for entry in &self.entries {
            out.push_str(&format!("{}\t0x{:04X}\n", entry.name(), entry.base.to_raw()));
        }
        for entry in &self.entries {
            out.push_str(&format!(
                "{META_PREFIX}{}\t0x{:04X}\n",
                entry.name(),
                entry.meta.to_raw()
            ));
        }
        out
    }
}

const FILE_HEADER: &str = "\
# mappings as per X11/keysymdef.h (remote key symbols)
# 0 = unbound
# 1 = meta (hold for the META_ layer)
# 2 = toggle keyboard
# 3 = disconnect
# 4 = toggle scaling
# 5 = toggle bottom screen backlight
# 6 = toggle touch/button events target (top or bottom)
# 16-20 = mouse button 1-5 (1=left, 2=middle, 3=right, 4=wheelup, 5=wheeldown)
";

/// Parses one `<name> <hexcode>` line.
///
/// The hex value may carry a `0x` prefix; a leading `-` is accepted and its
/// absolute value used. Comments and malformed lines yield `None`.
pub fn parse_line(line: &str) -> Option<(String, u32)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut parts = line.split_whitespace();
    let name = parts.next()?;
    let value = parts.next()?;
    let digits = value.strip_prefix('-').unwrap_or(value);
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    let raw = u32::from_str_radix(digits, 16).ok()?;
    Some((name.to_string(), raw))
}

/// Default `(base, meta)` raw codes for each pad input.
fn default_binding(button: PadButton) -> (u32, u32) {
    const META: u32 = ControlCode::Meta as u32;
    const KEYBOARD: u32 = ControlCode::ToggleKeyboard as u32;
    const DISCONNECT: u32 = ControlCode::Disconnect as u32;
    const SCALING: u32 = ControlCode::ToggleScaling as u32;
    const BACKLIGHT: u32 = ControlCode::ToggleBacklight as u32;
    const TARGET: u32 = ControlCode::ToggleTarget as u32;
    const LEFT_CLICK: u32 = POINTER_BUTTON_BASE;
    const RIGHT_CLICK: u32 = POINTER_BUTTON_BASE + 2;
    const WHEEL_UP: u32 = POINTER_BUTTON_BASE + 3;
    const WHEEL_DOWN: u32 = POINTER_BUTTON_BASE + 4;

    match button {
        PadButton::A => (XK_A, XK_UPPER_A),
        PadButton::B => (XK_B, XK_UPPER_B),
        PadButton::X => (XK_X, XK_UPPER_X),
        PadButton::Y => (XK_Y, XK_UPPER_Y),
        PadButton::L => (XK_Q, LEFT_CLICK),
        PadButton::R => (XK_W, RIGHT_CLICK),
        PadButton::Zl => (XK_1, WHEEL_UP),
        PadButton::Zr => (XK_2, WHEEL_DOWN),
        PadButton::Start => (DISCONNECT, XK_ESCAPE),
        PadButton::Select => (META, META),
        PadButton::CpadUp => (XK_UP, XK_PAGE_UP),
        PadButton::CpadDown => (XK_DOWN, XK_PAGE_DOWN),
        PadButton::CpadLeft => (XK_LEFT, XK_HOME),
        PadButton::CpadRight => (XK_RIGHT, XK_END),
        PadButton::DpadUp => (XK_T, SCALING),
        PadButton::DpadDown => (XK_G, BACKLIGHT),
        PadButton::DpadLeft => (XK_F, KEYBOARD),
        PadButton::DpadRight => (XK_H, TARGET),
        PadButton::CstickUp => (XK_I, XK_TAB),
        PadButton::CstickDown => (XK_K, XK_RETURN),
        PadButton::CstickLeft => (XK_J, XK_BACKSPACE),
        PadButton::CstickRight => (XK_L, XK_SPACE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Resolved-code numbering ───────────────────────────────────────────────

    #[test]
    fn test_from_raw_zero_is_unbound() {
        assert_eq!(ResolvedCode::from_raw(0), ResolvedCode::Unbound);
    }

    #[test]
    fn test_from_raw_reserved_band_maps_to_control_codes() {
        assert_eq!(
            ResolvedCode::from_raw(1),
            ResolvedCode::Control(ControlCode::Meta)
        );
        assert_eq!(
            ResolvedCode::from_raw(6),
            ResolvedCode::Control(ControlCode::ToggleTarget)
        );
    }

    #[test]
    fn test_from_raw_gap_between_bands_is_unbound() {
        for raw in 7..=15 {
            assert_eq!(ResolvedCode::from_raw(raw), ResolvedCode::Unbound);
        }
    }

    #[test]
    fn test_from_raw_pointer_band_maps_to_buttons_one_to_five() {
        assert_eq!(ResolvedCode::from_raw(16), ResolvedCode::PointerButton(1));
        assert_eq!(ResolvedCode::from_raw(20), ResolvedCode::PointerButton(5));
        assert_eq!(ResolvedCode::from_raw(21), ResolvedCode::KeySym(21));
    }

    #[test]
    fn test_to_raw_inverts_from_raw_outside_unbound_gap() {
        for raw in [0u32, 1, 3, 6, 16, 18, 20, 0x61, 0xFF1B] {
            assert_eq!(ResolvedCode::from_raw(raw).to_raw(), raw);
        }
    }

    // ── Default table ─────────────────────────────────────────────────────────

    #[test]
    fn test_default_table_has_one_entry_per_pad_input() {
        let table = BindingTable::default();
        assert_eq!(table.entries().len(), PadButton::ALL.len());
        for (entry, button) in table.entries().iter().zip(PadButton::ALL) {
            assert_eq!(entry.button, button);
        }
    }

    #[test]
    fn test_default_a_resolves_to_lowercase_a() {
        let table = BindingTable::default();
        assert_eq!(
            table.resolve(PadButton::A, false),
            ResolvedCode::KeySym(XK_A)
        );
        assert_eq!(
            table.resolve(PadButton::A, true),
            ResolvedCode::KeySym(XK_UPPER_A)
        );
    }

    #[test]
    fn test_default_meta_input_stays_meta_in_both_layers() {
        let table = BindingTable::default();
        let meta = ResolvedCode::Control(ControlCode::Meta);
        assert_eq!(table.resolve(PadButton::Select, false), meta);
        assert_eq!(table.resolve(PadButton::Select, true), meta);
    }

    // ── Overrides ─────────────────────────────────────────────────────────────

    #[test]
    fn test_override_rebinds_base_layer_only() {
        // Arrange
        let mut table = BindingTable::default();

        // Act
        let report = table.apply_overrides("A 0x62\n");

        // Assert
        assert_eq!(report.applied, 1);
        assert_eq!(table.resolve(PadButton::A, false), ResolvedCode::KeySym(0x62));
        assert_eq!(
            table.resolve(PadButton::A, true),
            ResolvedCode::KeySym(XK_UPPER_A),
            "meta layer keeps its own default"
        );
    }

    #[test]
    fn test_override_with_meta_prefix_rebinds_meta_layer() {
        let mut table = BindingTable::default();
        table.apply_overrides("META_B 0x0003");
        assert_eq!(
            table.resolve(PadButton::B, true),
            ResolvedCode::Control(ControlCode::Disconnect)
        );
        assert_eq!(table.resolve(PadButton::B, false), ResolvedCode::KeySym(XK_B));
    }

    #[test]
    fn test_override_ignores_unknown_names_and_comments() {
        // Arrange
        let mut table = BindingTable::default();
        let text = "# comment A 0x10\nHOME 0x20\nnot-a-line\n\nY\t0xff1b\n";

        // Act
        let report = table.apply_overrides(text);

        // Assert
        assert_eq!(report.applied, 1);
        assert_eq!(report.ignored, vec!["HOME".to_string()]);
        assert_eq!(
            table.resolve(PadButton::Y, false),
            ResolvedCode::KeySym(XK_ESCAPE)
        );
    }

    #[test]
    fn test_parse_line_accepts_negative_and_unprefixed_hex() {
        assert_eq!(parse_line("L\t-0x0003"), Some(("L".to_string(), 3)));
        assert_eq!(parse_line("R ff0d"), Some(("R".to_string(), 0xFF0D)));
        assert_eq!(parse_line("R zz"), None);
    }

    #[test]
    fn test_file_string_reloads_to_identical_table() {
        // Arrange
        let mut original = BindingTable::default();
        original.set(PadButton::Zl, Layer::Meta, ResolvedCode::KeySym(0xFFBE));
        let text = original.to_file_string();

        // Act
        let mut reloaded = BindingTable::default();
        let report = reloaded.apply_overrides(&text);

        // Assert
        assert_eq!(report.applied, 2 * PadButton::ALL.len());
        assert!(report.ignored.is_empty());
        assert_eq!(reloaded, original);
    }

    #[test]
    fn test_file_string_starts_with_comment_header() {
        let text = BindingTable::default().to_file_string();
        assert!(text.starts_with("# mappings"));
        assert!(text.contains("START\t0x0003\n"));
        assert!(text.contains("META_SELECT\t0x0001\n"));
    }
}
