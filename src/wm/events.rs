//! Events Module
//!
//! The closed set of events the window manager reacts to, translated from
//! x11rb's protocol events. Everything else collapses into `Unhandled`.

use std::fmt;

use x11rb::protocol::Event;
use x11rb::protocol::xproto::{Mapping, Window};
use x11rb::x11_utils::X11Error;

/// Event routed by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WmEvent {
    KeyPress(KeyEvent),
    KeyRelease(KeyEvent),
    ButtonPress(ButtonEvent),
    ButtonRelease(ButtonEvent),
    MapRequest { window: Window },
    MappingNotify { request: MappingKind },
    MotionNotify(MotionEvent),
    ConfigureRequest(ConfigureRequest),
    /// Asynchronous error from an unchecked request
    Error(ProtocolError),
    /// Any other event kind, with a description for logging
    Unhandled(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub window: Window,
    pub detail: u8,
    pub state: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub window: Window,
    pub detail: u8,
    pub state: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionEvent {
    pub window: Window,
    pub state: u16,
    pub root_x: i16,
    pub root_y: i16,
}

/// A client's request to change its own geometry or stacking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigureRequest {
    pub window: Window,
    /// `ConfigWindow` bits of the fields the client set
    pub value_mask: u16,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub border_width: u16,
    pub sibling: Window,
    pub stack_mode: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingKind {
    Modifier,
    Keyboard,
    Pointer,
}

/// Protocol error delivered through the event queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    pub kind: String,
    pub error_code: u8,
    pub sequence: u16,
    pub bad_value: u32,
    pub major_opcode: u8,
    pub minor_opcode: u16,
    pub request: Option<&'static str>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (code {}) in {} (major {}, minor {}), bad value 0x{:x}, sequence {}",
            self.kind,
            self.error_code,
            self.request.unwrap_or("unknown request"),
            self.major_opcode,
            self.minor_opcode,
            self.bad_value,
            self.sequence,
        )
    }
}

impl From<X11Error> for ProtocolError {
    fn from(e: X11Error) -> Self {
        Self {
            kind: format!("{:?}", e.error_kind),
            error_code: e.error_code,
            sequence: e.sequence,
            bad_value: e.bad_value,
            major_opcode: e.major_opcode,
            minor_opcode: e.minor_opcode,
            request: e.request_name,
        }
    }
}

impl From<Event> for WmEvent {
    fn from(event: Event) -> Self {
        match event {
            Event::KeyPress(e) => Self::KeyPress(KeyEvent {
                window: e.event,
                detail: e.detail,
                state: u16::from(e.state),
            }),
            Event::KeyRelease(e) => Self::KeyRelease(KeyEvent {
                window: e.event,
                detail: e.detail,
                state: u16::from(e.state),
            }),
            Event::ButtonPress(e) => Self::ButtonPress(ButtonEvent {
                window: e.event,
                detail: e.detail,
                state: u16::from(e.state),
            }),
            Event::ButtonRelease(e) => Self::ButtonRelease(ButtonEvent {
                window: e.event,
                detail: e.detail,
                state: u16::from(e.state),
            }),
            Event::MapRequest(e) => Self::MapRequest { window: e.window },
            Event::MappingNotify(e) => Self::MappingNotify {
                request: if e.request == Mapping::MODIFIER {
                    MappingKind::Modifier
                } else if e.request == Mapping::KEYBOARD {
                    MappingKind::Keyboard
                } else {
                    MappingKind::Pointer
                },
            },
            Event::MotionNotify(e) => Self::MotionNotify(MotionEvent {
                window: e.event,
                state: u16::from(e.state),
                root_x: e.root_x,
                root_y: e.root_y,
            }),
            Event::ConfigureRequest(e) => Self::ConfigureRequest(ConfigureRequest {
                window: e.window,
                value_mask: u16::from(e.value_mask),
                x: e.x,
                y: e.y,
                width: e.width,
                height: e.height,
                border_width: e.border_width,
                sibling: e.sibling,
                stack_mode: u32::from(e.stack_mode),
            }),
            Event::Error(e) => Self::Error(ProtocolError::from(e)),
            other => Self::Unhandled(format!("{:?}", other)),
        }
    }
}

impl WmEvent {
    /// Short name used in routing logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::KeyPress(_) => "KeyPress",
            Self::KeyRelease(_) => "KeyRelease",
            Self::ButtonPress(_) => "ButtonPress",
            Self::ButtonRelease(_) => "ButtonRelease",
            Self::MapRequest { .. } => "MapRequest",
            Self::MappingNotify { .. } => "MappingNotify",
            Self::MotionNotify(_) => "MotionNotify",
            Self::ConfigureRequest(_) => "ConfigureRequest",
            Self::Error(_) => "Error",
            Self::Unhandled(_) => "Unhandled",
        }
    }
}
