//! Connection Module
//!
//! The protocol surface the window manager core needs. `Display` implements
//! it over x11rb; tests implement it with a recording mock.

use x11rb::protocol::xproto::{Keycode, Window};

use crate::error::WmError;
use crate::wm::configure::WindowChanges;
use crate::wm::events::WmEvent;
use crate::wm::keyboard::Keymap;

/// Operations on an open display connection
#[allow(async_fn_in_trait)]
pub trait XConn {
    /// Root window of every screen, indexed by screen number
    fn roots(&self) -> Vec<Window>;

    /// Select substructure redirection on a root window.
    ///
    /// Returns `Ok(false)` when the server answers with an access error,
    /// meaning another window manager already owns the screen.
    fn redirect_substructure(&self, root: Window) -> Result<bool, WmError>;

    /// Direct children of a window
    fn children(&self, window: Window) -> Result<Vec<Window>, WmError>;

    /// Current keycode to keysym table
    fn keyboard_mapping(&self) -> Result<Keymap, WmError>;

    fn grab_key(&self, root: Window, keycode: Keycode, modifiers: u16) -> Result<(), WmError>;

    /// Release every key grab held on `root`
    fn ungrab_keys(&self, root: Window) -> Result<(), WmError>;

    fn grab_button(&self, window: Window, button: u8, modifiers: u16) -> Result<(), WmError>;

    /// Top-left corner of a window relative to its parent
    fn position(&self, window: Window) -> Result<(i32, i32), WmError>;

    fn configure(&self, window: Window, changes: &WindowChanges) -> Result<(), WmError>;

    fn map(&self, window: Window) -> Result<(), WmError>;

    fn flush(&self) -> Result<(), WmError>;

    /// Wait for the next event.
    ///
    /// A closed connection is reported as `WmError::Shutdown`.
    async fn next_event(&mut self) -> Result<WmEvent, WmError>;
}
