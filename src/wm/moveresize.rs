//! MoveResize Module
//!
//! Interactive window dragging. Position tracking is relative: the offset
//! between the window corner and the pointer is captured when the drag
//! starts, so the window never jumps to the pointer.

use tracing::debug;
use x11rb::protocol::xproto::Window;

use crate::error::WmError;
use crate::wm::configure::WindowChanges;
use crate::wm::conn::XConn;
use crate::wm::events::MotionEvent;

/// The one active drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub window: Window,
    /// Window top-left minus pointer root position at drag start
    pub offset: (i32, i32),
}

/// Drag state machine
#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Handle pointer motion.
    ///
    /// Motion without `drag_mask` in its state is ignored. The first qualifying
    /// motion starts a session on the event window; later ones move the
    /// session window.
    pub fn on_motion<C: XConn>(
        &mut self,
        conn: &C,
        event: &MotionEvent,
        drag_mask: u16,
    ) -> Result<(), WmError> {
        if event.state & drag_mask == 0 {
            return Ok(());
        }

        let pointer = (i32::from(event.root_x), i32::from(event.root_y));

        match self.session {
            None => {
                let (x, y) = conn.position(event.window)?;
                let offset = (x - pointer.0, y - pointer.1);
                debug!("Starting drag of window {} with offset {:?}", event.window, offset);
                self.session = Some(DragSession {
                    window: event.window,
                    offset,
                });
            }
            Some(session) => {
                conn.configure(
                    session.window,
                    &WindowChanges::position(session.offset.0 + pointer.0, session.offset.1 + pointer.1),
                )?;
            }
        }

        Ok(())
    }

    /// End the drag, whichever button or window the release came from
    pub fn on_release(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Drag of window {} ended", session.window);
        }
    }
}
