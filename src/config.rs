//! Configuration for Plinth
//!
//! All tunables live in one value built at startup and handed to the window
//! manager. There is no configuration file; the defaults are the policy.

use x11rb::protocol::xproto::{KeyButMask, ModMask};

/// `XK_Return`
pub const XK_RETURN: u32 = 0xff0d;

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Command run on Mod1+Return
    pub terminal: Vec<String>,

    /// Commands launched once after the screens are acquired, in order
    pub startup_programs: Vec<Vec<String>>,

    /// Handler faults tolerated before the loop gives up
    pub max_faults: u32,

    /// Border width forced onto every honored configure request
    pub border_width: u32,

    /// Modifier that must be held for the terminal hotkey
    pub hotkey_modifier: u16,

    /// Release-only modifier bit stripped from the hotkey grab mask
    ///
    /// One above `AnyModifier`, so it never overlaps a real modifier.
    pub release_modifier: u32,

    /// Keysym bound to the terminal hotkey
    pub hotkey_keysym: u32,

    /// Pointer button that raises and drags windows
    pub drag_button: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            terminal: vec!["/usr/bin/xterm".to_string()],
            startup_programs: vec![vec!["/usr/games/xphoon".to_string()]],
            max_faults: 25,
            border_width: 3,
            hotkey_modifier: u16::from(ModMask::M1),
            release_modifier: u32::from(u16::from(ModMask::ANY)) << 1,
            hotkey_keysym: XK_RETURN,
            drag_button: 3,
        }
    }
}

impl Config {
    /// Modifier mask used when grabbing the hotkey
    pub fn hotkey_grab_mask(&self) -> u16 {
        (u32::from(self.hotkey_modifier) & !self.release_modifier) as u16
    }

    /// Motion state bit reported while the drag button is held
    pub fn drag_motion_mask(&self) -> u16 {
        let mask = match self.drag_button {
            1 => KeyButMask::BUTTON1,
            2 => KeyButMask::BUTTON2,
            4 => KeyButMask::BUTTON4,
            5 => KeyButMask::BUTTON5,
            _ => KeyButMask::BUTTON3,
        };
        u16::from(mask)
    }
}
