//! Key-name parsing and virtual-key code constants.
//!
//! Maps human-readable key names (as used in script files and the CLI) to
//! Win32 virtual-key codes, carrying the extended-key flag for keys on the
//! navigation cluster.

use crate::error::{Result, WidError};
use crate::events::KeyEvent;

/// A resolved virtual key: the code plus whether it is an extended key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualKey {
    pub code: u16,
    pub extended: bool,
}

impl VirtualKey {
    fn basic(code: u16) -> Self {
        Self {
            code,
            extended: false,
        }
    }

    fn extended(code: u16) -> Self {
        Self {
            code,
            extended: true,
        }
    }

    /// A press-and-release [`KeyEvent`] for this key.
    pub fn typed(self) -> KeyEvent {
        KeyEvent::typed(self.code).with_extended(self.extended)
    }
}

/// Common virtual-key codes.
pub mod vk {
    pub const BACKSPACE: u16 = 0x08;
    pub const TAB: u16 = 0x09;
    pub const RETURN: u16 = 0x0D;
    pub const SHIFT: u16 = 0x10;
    pub const CONTROL: u16 = 0x11;
    pub const ALT: u16 = 0x12;
    pub const ESCAPE: u16 = 0x1B;
    pub const SPACE: u16 = 0x20;
    pub const PAGE_UP: u16 = 0x21;
    pub const PAGE_DOWN: u16 = 0x22;
    pub const END: u16 = 0x23;
    pub const HOME: u16 = 0x24;
    pub const LEFT: u16 = 0x25;
    pub const UP: u16 = 0x26;
    pub const RIGHT: u16 = 0x27;
    pub const DOWN: u16 = 0x28;
    pub const INSERT: u16 = 0x2D;
    pub const DELETE: u16 = 0x2E;

    // '0'-'9' are 0x30-0x39, 'A'-'Z' are 0x41-0x5A.
    pub const KEY_0: u16 = 0x30;
    pub const KEY_A: u16 = 0x41;

    pub const F1: u16 = 0x70;
}

/// Resolve a key name to a [`VirtualKey`].
///
/// Accepts single characters (`"a"`, `"7"`), function keys (`"f1"`..`"f12"`),
/// and the named specials used throughout script files. Names are
/// case-insensitive.
pub fn lookup(name: &str) -> Result<VirtualKey> {
    let normalized = name.trim().to_lowercase();

    if normalized.is_empty() {
        return Err(WidError::invalid_key(name, "empty key name"));
    }

    if normalized.len() == 1 {
        let c = normalized.chars().next().unwrap_or('\0');
        if c.is_ascii_lowercase() {
            return Ok(VirtualKey::basic(vk::KEY_A + (c as u16 - 'a' as u16)));
        }
        if c.is_ascii_digit() {
            return Ok(VirtualKey::basic(vk::KEY_0 + (c as u16 - '0' as u16)));
        }
    }

    // Function keys F1..F12
    if let Some(n) = normalized.strip_prefix('f') {
        if let Ok(n) = n.parse::<u16>() {
            if (1..=12).contains(&n) {
                return Ok(VirtualKey::basic(vk::F1 + n - 1));
            }
        }
    }

    let key = match normalized.as_str() {
        "space" => VirtualKey::basic(vk::SPACE),
        "enter" | "return" => VirtualKey::basic(vk::RETURN),
        "tab" => VirtualKey::basic(vk::TAB),
        "escape" | "esc" => VirtualKey::basic(vk::ESCAPE),
        "backspace" => VirtualKey::basic(vk::BACKSPACE),
        "ctrl" | "control" => VirtualKey::basic(vk::CONTROL),
        "shift" => VirtualKey::basic(vk::SHIFT),
        "alt" => VirtualKey::basic(vk::ALT),

        // Navigation cluster keys are extended keys.
        "delete" => VirtualKey::extended(vk::DELETE),
        "insert" => VirtualKey::extended(vk::INSERT),
        "home" => VirtualKey::extended(vk::HOME),
        "end" => VirtualKey::extended(vk::END),
        "pageup" => VirtualKey::extended(vk::PAGE_UP),
        "pagedown" => VirtualKey::extended(vk::PAGE_DOWN),
        "up" | "arrowup" => VirtualKey::extended(vk::UP),
        "down" | "arrowdown" => VirtualKey::extended(vk::DOWN),
        "left" | "arrowleft" => VirtualKey::extended(vk::LEFT),
        "right" | "arrowright" => VirtualKey::extended(vk::RIGHT),

        _ => return Err(WidError::invalid_key(name, "unknown key name")),
    };

    Ok(key)
}
