//! Window Manager Module
//!
//! Screen ownership, input grabs, and the per-event policy: raise on
//! right-click, drag on right-button motion, terminal on Mod1+Return,
//! and pass-through configure requests.

pub mod configure;
pub mod conn;
pub mod dispatch;
pub mod display;
pub mod events;
pub mod keyboard;
pub mod moveresize;
pub mod screen;
pub mod startup;
pub mod xerror;

#[cfg(test)]
pub mod testing;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{StartupError, WmError};
use crate::wm::configure::WindowChanges;
use crate::wm::conn::XConn;
use crate::wm::events::{ButtonEvent, KeyEvent, MappingKind, WmEvent};
use crate::wm::keyboard::Hotkey;
use crate::wm::moveresize::DragController;
use crate::wm::screen::ManagedScreens;
use crate::wm::startup::ProcessLauncher;

/// Right mouse button
const RAISE_BUTTON: u8 = 3;

pub struct WindowManager<C: XConn, L: ProcessLauncher> {
    conn: C,
    launcher: L,
    config: Config,
    screens: ManagedScreens,
    hotkey: Hotkey,
    drag: DragController,
}

impl<C: XConn, L: ProcessLauncher> WindowManager<C, L> {
    /// Acquire screens and run the startup programs.
    ///
    /// Fails if no screen could be acquired; nothing is launched then.
    pub fn start(conn: C, launcher: L, config: Config) -> Result<Self, WmError> {
        let keymap = conn
            .keyboard_mapping()
            .map_err(StartupError::during_startup)?;
        let hotkey = Hotkey::resolve(&keymap, config.hotkey_keysym);
        let screens =
            screen::acquire(&conn, &config, &hotkey).map_err(StartupError::during_startup)?;
        conn.flush().map_err(StartupError::during_startup)?;

        info!("Managing {} screen(s): {:?}", screens.len(), screens.indices());

        startup::run_startup_programs(&launcher, &config.startup_programs);

        Ok(Self {
            conn,
            launcher,
            config,
            screens,
            hotkey,
            drag: DragController::new(),
        })
    }

    pub fn conn(&self) -> &C {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[cfg(test)]
    pub fn screens(&self) -> &ManagedScreens {
        &self.screens
    }

    #[cfg(test)]
    pub fn hotkey(&self) -> &Hotkey {
        &self.hotkey
    }

    #[cfg(test)]
    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    #[cfg(test)]
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Route one event to its handler
    pub fn handle_event(&mut self, event: WmEvent) -> Result<(), WmError> {
        match event {
            WmEvent::KeyPress(e) => self.handle_key_press(e),
            WmEvent::KeyRelease(_) => Ok(()),
            WmEvent::ButtonPress(e) => self.handle_button_press(e),
            WmEvent::ButtonRelease(_) => {
                self.drag.on_release();
                Ok(())
            }
            WmEvent::MapRequest { window } => {
                debug!("MapRequest: window {}", window);
                self.conn.map(window)?;
                keyboard::grab_drag_button(&self.conn, window, self.config.drag_button)
            }
            WmEvent::MappingNotify { request } => self.handle_mapping_notify(request),
            WmEvent::MotionNotify(e) => {
                let mask = self.config.drag_motion_mask();
                self.drag.on_motion(&self.conn, &e, mask)
            }
            WmEvent::ConfigureRequest(req) => {
                debug!(
                    "ConfigureRequest: window {}, mask 0x{:x}, requested border {}",
                    req.window, req.value_mask, req.border_width
                );
                let changes = configure::arbitrate(&req, self.config.border_width);
                self.conn.configure(req.window, &changes)
            }
            WmEvent::Error(e) => {
                xerror::report(&e);
                Ok(())
            }
            WmEvent::Unhandled(description) => {
                info!("Unhandled event: {}", description);
                Ok(())
            }
        }
    }

    fn handle_key_press(&mut self, e: KeyEvent) -> Result<(), WmError> {
        debug!("KeyPress: keycode {} state 0x{:x} on window {}", e.detail, e.state, e.window);
        if e.state & self.config.hotkey_modifier != 0 && self.hotkey.matches(e.detail) {
            info!("Hotkey pressed, launching terminal");
            self.launcher.launch_detached(&self.config.terminal)?;
        }
        Ok(())
    }

    fn handle_button_press(&mut self, e: ButtonEvent) -> Result<(), WmError> {
        debug!("ButtonPress: button {} state 0x{:x} on window {}", e.detail, e.state, e.window);
        if e.detail == RAISE_BUTTON {
            debug!("Raising window {}", e.window);
            self.conn.configure(e.window, &WindowChanges::raise())?;
        }
        Ok(())
    }

    fn handle_mapping_notify(&mut self, request: MappingKind) -> Result<(), WmError> {
        if request == MappingKind::Pointer {
            return Ok(());
        }

        let keymap = self.conn.keyboard_mapping()?;
        self.hotkey = Hotkey::resolve(&keymap, self.config.hotkey_keysym);
        info!(
            "Keyboard mapping changed, keysym 0x{:x} now on keycodes {:?}",
            self.hotkey.keysym, self.hotkey.codes
        );

        let modifiers = self.config.hotkey_grab_mask();
        for screen in self.screens.iter() {
            keyboard::regrab_hotkey(&self.conn, screen.root, &self.hotkey, modifiers)?;
        }
        Ok(())
    }
}
