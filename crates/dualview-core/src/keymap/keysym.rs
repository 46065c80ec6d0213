//! X11 KeySym values used by the default binding table.
//!
//! Remote-framebuffer key events carry X11 KeySyms, so these are the codes
//! that end up on the wire. Values follow `X11/keysymdef.h`.
//!
//! Latin-1 letters and digits use their ASCII value (`XK_a` is `0x61`), while
//! editing and cursor keys live in the `0xFF00` page.

pub const XK_SPACE: u32 = 0x0020;
pub const XK_1: u32 = 0x0031;
pub const XK_2: u32 = 0x0032;
pub const XK_UPPER_A: u32 = 0x0041;
pub const XK_UPPER_B: u32 = 0x0042;
pub const XK_UPPER_X: u32 = 0x0058;
pub const XK_UPPER_Y: u32 = 0x0059;
pub const XK_A: u32 = 0x0061;
pub const XK_B: u32 = 0x0062;
pub const XK_F: u32 = 0x0066;
pub const XK_G: u32 = 0x0067;
pub const XK_H: u32 = 0x0068;
pub const XK_I: u32 = 0x0069;
pub const XK_J: u32 = 0x006A;
pub const XK_K: u32 = 0x006B;
pub const XK_L: u32 = 0x006C;
pub const XK_Q: u32 = 0x0071;
pub const XK_T: u32 = 0x0074;
pub const XK_W: u32 = 0x0077;
pub const XK_X: u32 = 0x0078;
pub const XK_Y: u32 = 0x0079;

pub const XK_BACKSPACE: u32 = 0xFF08;
pub const XK_TAB: u32 = 0xFF09;
pub const XK_RETURN: u32 = 0xFF0D;
pub const XK_ESCAPE: u32 = 0xFF1B;
pub const XK_HOME: u32 = 0xFF50;
pub const XK_LEFT: u32 = 0xFF51;
pub const XK_UP: u32 = 0xFF52;
pub const XK_RIGHT: u32 = 0xFF53;
pub const XK_DOWN: u32 = 0xFF54;
pub const XK_PAGE_UP: u32 = 0xFF55;
pub const XK_PAGE_DOWN: u32 = 0xFF56;
pub const XK_END: u32 = 0xFF57;

/// Human-readable name of a KeySym, for diagnostics.
///
/// Printable Latin-1 values render as the character itself; the handful of
/// function keys above render by their `keysymdef.h` name without the `XK_`
/// prefix. Everything else returns `None`.
pub fn describe(keysym: u32) -> Option<String> {
    let named = match keysym {
        XK_SPACE => Some("space"),
        XK_BACKSPACE => Some("BackSpace"),
        XK_TAB => Some("Tab"),
        XK_RETURN => Some("Return"),
        XK_ESCAPE => Some("Escape"),
        XK_HOME => Some("Home"),
        XK_LEFT => Some("Left"),
        XK_UP => Some("Up"),
        XK_RIGHT => Some("Right"),
        XK_DOWN => Some("Down"),
        XK_PAGE_UP => Some("Page_Up"),
        XK_PAGE_DOWN => Some("Page_Down"),
        XK_END => Some("End"),
        _ => None,
    };
    if let Some(name) = named {
        return Some(name.to_string());
    }
    match keysym {
        0x21..=0x7E => char::from_u32(keysym).map(|c| c.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_letters_render_as_characters() {
        assert_eq!(describe(XK_A).as_deref(), Some("a"));
        assert_eq!(describe(XK_UPPER_A).as_deref(), Some("A"));
    }

    #[test]
    fn test_describe_function_keys_use_keysymdef_names() {
        assert_eq!(describe(XK_ESCAPE).as_deref(), Some("Escape"));
        assert_eq!(describe(XK_PAGE_DOWN).as_deref(), Some("Page_Down"));
    }

    #[test]
    fn test_describe_unknown_returns_none() {
        assert_eq!(describe(0xFFBE), None);
    }
}
