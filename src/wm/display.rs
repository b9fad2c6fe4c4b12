//! Display Module
//!
//! The x11rb-backed connection: bootstrap, screen roots, and the requests
//! the window manager issues.

use std::sync::Arc;

use tracing::{info, warn};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::protocol::ErrorKind;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::error::{Shutdown, StartupError, WmError};
use crate::wm::configure::WindowChanges;
use crate::wm::conn::XConn;
use crate::wm::events::WmEvent;
use crate::wm::keyboard::Keymap;
use crate::x11_async::X11EventStream;

/// Open display connection
pub struct Display {
    conn: Arc<RustConnection>,
    events: X11EventStream,
    roots: Vec<Window>,
}

impl Display {
    /// Connect to the display named by `name`, or `$DISPLAY` if `None`
    pub fn connect(name: Option<&str>) -> Result<Self, WmError> {
        let (conn, screen_num) =
            x11rb::connect(name).map_err(|e| StartupError::Connect(e.to_string()))?;
        let conn = Arc::new(conn);

        let roots: Vec<Window> = conn.setup().roots.iter().map(|s| s.root).collect();
        info!(
            "Connected to X server, {} screen(s), default screen {}",
            roots.len(),
            screen_num
        );

        let events = X11EventStream::new(conn.clone())
            .map_err(|e| StartupError::Connect(e.to_string()))?;

        Ok(Self {
            conn,
            events,
            roots,
        })
    }
}

impl XConn for Display {
    fn roots(&self) -> Vec<Window> {
        self.roots.clone()
    }

    fn redirect_substructure(&self, root: Window) -> Result<bool, WmError> {
        let aux = ChangeWindowAttributesAux::new().event_mask(EventMask::SUBSTRUCTURE_REDIRECT);
        match self.conn.change_window_attributes(root, &aux)?.check() {
            Ok(()) => Ok(true),
            Err(ReplyError::X11Error(e)) if e.error_kind == ErrorKind::Access => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn children(&self, window: Window) -> Result<Vec<Window>, WmError> {
        Ok(self.conn.query_tree(window)?.reply()?.children)
    }

    fn keyboard_mapping(&self) -> Result<Keymap, WmError> {
        let setup = self.conn.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let reply = self
            .conn
            .get_keyboard_mapping(min, max - min + 1)?
            .reply()?;

        Ok(Keymap {
            min_keycode: min,
            keysyms_per_keycode: reply.keysyms_per_keycode,
            keysyms: reply.keysyms,
        })
    }

    fn grab_key(&self, root: Window, keycode: Keycode, modifiers: u16) -> Result<(), WmError> {
        self.conn.grab_key(
            true,
            root,
            ModMask::from(modifiers),
            keycode,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
        )?;
        Ok(())
    }

    fn ungrab_keys(&self, root: Window) -> Result<(), WmError> {
        self.conn.ungrab_key(Grab::ANY, root, ModMask::ANY)?;
        Ok(())
    }

    fn grab_button(&self, window: Window, button: u8, modifiers: u16) -> Result<(), WmError> {
        self.conn.grab_button(
            true,
            window,
            EventMask::BUTTON_MOTION | EventMask::BUTTON_RELEASE | EventMask::BUTTON_PRESS,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            ButtonIndex::from(button),
            ModMask::from(modifiers),
        )?;
        Ok(())
    }

    fn position(&self, window: Window) -> Result<(i32, i32), WmError> {
        let geom = self.conn.get_geometry(window)?.reply()?;
        Ok((i32::from(geom.x), i32::from(geom.y)))
    }

    fn configure(&self, window: Window, changes: &WindowChanges) -> Result<(), WmError> {
        let aux = ConfigureWindowAux::new()
            .x(changes.x)
            .y(changes.y)
            .width(changes.width)
            .height(changes.height)
            .border_width(changes.border_width)
            .sibling(changes.sibling)
            .stack_mode(changes.stack_mode);
        self.conn.configure_window(window, &aux)?;
        Ok(())
    }

    fn map(&self, window: Window) -> Result<(), WmError> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), WmError> {
        self.conn.flush()?;
        Ok(())
    }

    async fn next_event(&mut self) -> Result<WmEvent, WmError> {
        self.events
            .next_event()
            .await
            .map(WmEvent::from)
            .map_err(connection_lost)
    }
}

/// Any failure while waiting for events means the server is gone
fn connection_lost(err: ConnectionError) -> WmError {
    warn!("Display connection lost: {}", err);
    WmError::Shutdown(Shutdown::ConnectionClosed)
}
