//! Keyboard Module
//!
//! Keycode table, hotkey resolution, and passive grab installation for the
//! hotkey on root windows and the drag button on client windows.

use std::collections::BTreeSet;

use tracing::debug;
use x11rb::protocol::xproto::{Keycode, Window};

use crate::error::WmError;
use crate::wm::conn::XConn;

/// Cached keycode to keysym table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keymap {
    pub min_keycode: Keycode,
    pub keysyms_per_keycode: u8,
    pub keysyms: Vec<u32>,
}

impl Keymap {
    /// Every keycode that produces `keysym` in any column, ascending
    pub fn keycodes_for(&self, keysym: u32) -> Vec<Keycode> {
        let per = usize::from(self.keysyms_per_keycode);
        if per == 0 {
            return Vec::new();
        }

        let codes: BTreeSet<Keycode> = self
            .keysyms
            .chunks(per)
            .enumerate()
            .filter(|(_, syms)| syms.contains(&keysym))
            .filter_map(|(i, _)| u8::try_from(usize::from(self.min_keycode) + i).ok())
            .collect();

        codes.into_iter().collect()
    }
}

/// Keycodes currently bound to the terminal hotkey
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hotkey {
    pub keysym: u32,
    pub codes: Vec<Keycode>,
}

impl Hotkey {
    pub fn resolve(keymap: &Keymap, keysym: u32) -> Self {
        let codes = keymap.keycodes_for(keysym);
        debug!("Keysym 0x{:x} maps to keycodes {:?}", keysym, codes);
        Self { keysym, codes }
    }

    pub fn matches(&self, keycode: Keycode) -> bool {
        self.codes.contains(&keycode)
    }
}

/// Install the hotkey grab on a root window for every hotkey keycode
pub fn grab_hotkey<C: XConn>(
    conn: &C,
    root: Window,
    hotkey: &Hotkey,
    modifiers: u16,
) -> Result<(), WmError> {
    for &code in &hotkey.codes {
        conn.grab_key(root, code, modifiers)?;
    }
    Ok(())
}

/// Drop the old hotkey grabs on a root window and install the current ones
pub fn regrab_hotkey<C: XConn>(
    conn: &C,
    root: Window,
    hotkey: &Hotkey,
    modifiers: u16,
) -> Result<(), WmError> {
    conn.ungrab_keys(root)?;
    grab_hotkey(conn, root, hotkey, modifiers)
}

/// Make a client window raisable and draggable with the drag button
pub fn grab_drag_button<C: XConn>(conn: &C, window: Window, button: u8) -> Result<(), WmError> {
    debug!("Grabbing button {} on window {}", button, window);
    conn.grab_button(window, button, 0)
}
