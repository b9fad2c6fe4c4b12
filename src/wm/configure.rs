//! Configure Module
//!
//! Arbitration of client configure requests. The policy is pass-through:
//! whatever fields the client asked for are granted, and the border width is
//! always forced to the configured value.

use x11rb::protocol::xproto::{ConfigWindow, StackMode, Window};

use crate::wm::events::ConfigureRequest;

/// Subset-field geometry and stacking update
///
/// `None` leaves the corresponding attribute untouched on the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowChanges {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub border_width: Option<u32>,
    pub sibling: Option<Window>,
    pub stack_mode: Option<StackMode>,
}

impl WindowChanges {
    /// Move to an absolute position, size unchanged
    pub fn position(x: i32, y: i32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Restack above siblings
    pub fn raise() -> Self {
        Self {
            stack_mode: Some(StackMode::ABOVE),
            ..Self::default()
        }
    }
}

/// Build the update granted for a configure request
pub fn arbitrate(request: &ConfigureRequest, border_width: u32) -> WindowChanges {
    let has = |field: ConfigWindow| request.value_mask & u16::from(field) != 0;

    WindowChanges {
        x: has(ConfigWindow::X).then_some(i32::from(request.x)),
        y: has(ConfigWindow::Y).then_some(i32::from(request.y)),
        width: has(ConfigWindow::WIDTH).then_some(u32::from(request.width)),
        height: has(ConfigWindow::HEIGHT).then_some(u32::from(request.height)),
        border_width: Some(border_width),
        sibling: has(ConfigWindow::SIBLING).then_some(request.sibling),
        stack_mode: has(ConfigWindow::STACK_MODE).then(|| StackMode::from(request.stack_mode)),
    }
}
