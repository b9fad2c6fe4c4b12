//! Test doubles for the connection and the process launcher.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};

use x11rb::protocol::xproto::{Keycode, StackMode, Window};

use crate::config::XK_RETURN;
use crate::error::{Shutdown, SpawnError, WmError};
use crate::wm::configure::WindowChanges;
use crate::wm::conn::XConn;
use crate::wm::events::WmEvent;
use crate::wm::keyboard::Keymap;
use crate::wm::startup::ProcessLauncher;

/// Keycode the default mock keymap assigns to Return
pub const RETURN_KEYCODE: Keycode = 36;

/// Root window id of screen `index`
pub fn root(index: usize) -> Window {
    1000 * (index as Window + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub border_width: u32,
}

/// Side effects recorded by `MockConn`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Redirect { root: Window },
    GrabKey { root: Window, keycode: Keycode, modifiers: u16 },
    UngrabKeys { root: Window },
    GrabButton { window: Window, button: u8, modifiers: u16 },
    Configure { window: Window, changes: WindowChanges },
    Map { window: Window },
    KeyboardMapping,
}

/// Scripted in-memory display
pub struct MockConn {
    roots: Vec<Window>,
    owned_elsewhere: HashSet<Window>,
    children: HashMap<Window, Vec<Window>>,
    geometry: RefCell<HashMap<Window, Geometry>>,
    stack: RefCell<Vec<Window>>,
    keymap: RefCell<Keymap>,
    vanished: HashSet<Window>,
    panic_on_map: bool,
    events: VecDeque<WmEvent>,
    calls: RefCell<Vec<Call>>,
    flushes: Cell<usize>,
}

impl MockConn {
    pub fn new(screens: usize) -> Self {
        Self {
            roots: (0..screens).map(root).collect(),
            owned_elsewhere: HashSet::new(),
            children: HashMap::new(),
            geometry: RefCell::new(HashMap::new()),
            stack: RefCell::new(Vec::new()),
            keymap: RefCell::new(keymap_with_return_at(RETURN_KEYCODE)),
            vanished: HashSet::new(),
            panic_on_map: false,
            events: VecDeque::new(),
            calls: RefCell::new(Vec::new()),
            flushes: Cell::new(0),
        }
    }

    /// Another window manager already redirects screen `index`
    pub fn owned_by_other(mut self, index: usize) -> Self {
        self.owned_elsewhere.insert(root(index));
        self
    }

    pub fn with_window(self, window: Window, (x, y, width, height): (i32, i32, u32, u32)) -> Self {
        self.geometry.borrow_mut().insert(
            window,
            Geometry {
                x,
                y,
                width,
                height,
                border_width: 0,
            },
        );
        self.stack.borrow_mut().push(window);
        self
    }

    /// Pre-existing top-level windows of screen `index`
    pub fn with_children(mut self, index: usize, windows: &[Window]) -> Self {
        self.children.insert(root(index), windows.to_vec());
        self
    }

    /// Requests on `window` fail as if it was destroyed
    pub fn with_vanished(mut self, window: Window) -> Self {
        self.vanished.insert(window);
        self
    }

    pub fn with_panic_on_map(mut self) -> Self {
        self.panic_on_map = true;
        self
    }

    pub fn with_events(mut self, events: impl IntoIterator<Item = WmEvent>) -> Self {
        self.events.extend(events);
        self
    }

    /// Replace the keyboard table, as a layout switch would
    pub fn set_keymap(&self, keymap: Keymap) {
        *self.keymap.borrow_mut() = keymap;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn geometry(&self, window: Window) -> Option<Geometry> {
        self.geometry.borrow().get(&window).copied()
    }

    /// Bottom to top
    pub fn stacking(&self) -> Vec<Window> {
        self.stack.borrow().clone()
    }

    pub fn flushes(&self) -> usize {
        self.flushes.get()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn check_alive(&self, window: Window) -> Result<(), WmError> {
        if self.vanished.contains(&window) {
            return Err(WmError::Protocol(format!("BadWindow for window {}", window)));
        }
        Ok(())
    }
}

impl XConn for MockConn {
    fn roots(&self) -> Vec<Window> {
        self.roots.clone()
    }

    fn redirect_substructure(&self, root: Window) -> Result<bool, WmError> {
        self.record(Call::Redirect { root });
        Ok(!self.owned_elsewhere.contains(&root))
    }

    fn children(&self, window: Window) -> Result<Vec<Window>, WmError> {
        Ok(self.children.get(&window).cloned().unwrap_or_default())
    }

    fn keyboard_mapping(&self) -> Result<Keymap, WmError> {
        self.record(Call::KeyboardMapping);
        Ok(self.keymap.borrow().clone())
    }

    fn grab_key(&self, root: Window, keycode: Keycode, modifiers: u16) -> Result<(), WmError> {
        self.record(Call::GrabKey { root, keycode, modifiers });
        Ok(())
    }

    fn ungrab_keys(&self, root: Window) -> Result<(), WmError> {
        self.record(Call::UngrabKeys { root });
        Ok(())
    }

    fn grab_button(&self, window: Window, button: u8, modifiers: u16) -> Result<(), WmError> {
        self.check_alive(window)?;
        self.record(Call::GrabButton { window, button, modifiers });
        Ok(())
    }

    fn position(&self, window: Window) -> Result<(i32, i32), WmError> {
        self.check_alive(window)?;
        self.geometry(window)
            .map(|g| (g.x, g.y))
            .ok_or_else(|| WmError::Protocol(format!("BadDrawable for window {}", window)))
    }

    fn configure(&self, window: Window, changes: &WindowChanges) -> Result<(), WmError> {
        self.check_alive(window)?;
        self.record(Call::Configure {
            window,
            changes: *changes,
        });

        if let Some(g) = self.geometry.borrow_mut().get_mut(&window) {
            g.x = changes.x.unwrap_or(g.x);
            g.y = changes.y.unwrap_or(g.y);
            g.width = changes.width.unwrap_or(g.width);
            g.height = changes.height.unwrap_or(g.height);
            g.border_width = changes.border_width.unwrap_or(g.border_width);
        }

        if changes.stack_mode == Some(StackMode::ABOVE) && changes.sibling.is_none() {
            let mut stack = self.stack.borrow_mut();
            stack.retain(|&w| w != window);
            stack.push(window);
        }

        Ok(())
    }

    fn map(&self, window: Window) -> Result<(), WmError> {
        if self.panic_on_map {
            panic!("map exploded for window {}", window);
        }
        self.check_alive(window)?;
        self.record(Call::Map { window });
        Ok(())
    }

    fn flush(&self) -> Result<(), WmError> {
        self.flushes.set(self.flushes.get() + 1);
        Ok(())
    }

    async fn next_event(&mut self) -> Result<WmEvent, WmError> {
        self.events
            .pop_front()
            .ok_or(WmError::Shutdown(Shutdown::ConnectionClosed))
    }
}

/// Single-column keymap starting at keycode 8 with Return at `keycode`
pub fn keymap_with_return_at(keycode: Keycode) -> Keymap {
    let mut keysyms = vec![0; 248];
    keysyms[usize::from(keycode - 8)] = XK_RETURN;
    Keymap {
        min_keycode: 8,
        keysyms_per_keycode: 1,
        keysyms,
    }
}

/// Launcher that records argv instead of forking
#[derive(Default)]
pub struct RecordingLauncher {
    launched: RefCell<Vec<Vec<String>>>,
    fail: bool,
}

impl RecordingLauncher {
    pub fn failing() -> Self {
        Self {
            launched: RefCell::new(Vec::new()),
            fail: true,
        }
    }

    pub fn launched(&self) -> Vec<Vec<String>> {
        self.launched.borrow().clone()
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn launch_detached(&self, argv: &[String]) -> Result<(), SpawnError> {
        self.launched.borrow_mut().push(argv.to_vec());
        if self.fail {
            return Err(SpawnError::EmptyCommand);
        }
        Ok(())
    }
}
