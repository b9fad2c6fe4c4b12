//! Screen Module
//!
//! Acquisition of screens: substructure redirection on each root, then the
//! hotkey grab on the root and the drag grab on every existing client.

use tracing::{info, warn};
use x11rb::protocol::xproto::Window;

use crate::config::Config;
use crate::error::{StartupError, WmError};
use crate::wm::conn::XConn;
use crate::wm::keyboard::{self, Hotkey};

/// A screen this window manager redirects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagedScreen {
    /// Screen number
    pub index: usize,
    /// Root window
    pub root: Window,
}

/// Screens acquired at startup. Never shrinks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedScreens {
    screens: Vec<ManagedScreen>,
}

impl ManagedScreens {
    pub fn iter(&self) -> impl Iterator<Item = &ManagedScreen> {
        self.screens.iter()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.screens.iter().map(|s| s.index).collect()
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }
}

/// Take every screen not already owned by another window manager.
///
/// Fails with `StartupError::NoManagedScreens` if none could be taken.
pub fn acquire<C: XConn>(
    conn: &C,
    config: &Config,
    hotkey: &Hotkey,
) -> Result<ManagedScreens, WmError> {
    let mut managed = ManagedScreens::default();

    for (index, root) in conn.roots().into_iter().enumerate() {
        if !conn.redirect_substructure(root)? {
            warn!("Screen {} is already managed, skipping", index);
            continue;
        }

        info!("Managing screen {} (root window {})", index, root);
        keyboard::grab_hotkey(conn, root, hotkey, config.hotkey_grab_mask())?;

        for window in conn.children(root)? {
            info!("Detecting grab events for window {}", window);
            // The window may be gone by now
            if let Err(e) = keyboard::grab_drag_button(conn, window, config.drag_button) {
                warn!("Failed to grab button on window {}: {}", window, e);
            }
        }

        managed.screens.push(ManagedScreen { index, root });
    }

    if managed.is_empty() {
        return Err(StartupError::NoManagedScreens.into());
    }

    Ok(managed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::XK_RETURN;
    use crate::wm::testing::{Call, MockConn, RETURN_KEYCODE, root};
    use x11rb::protocol::xproto::Keycode;

    fn hotkey(codes: &[Keycode]) -> Hotkey {
        Hotkey {
            keysym: XK_RETURN,
            codes: codes.to_vec(),
        }
    }

    #[test]
    fn test_owned_screen_is_skipped() {
        let conn = MockConn::new(3).owned_by_other(1);
        let managed = acquire(&conn, &Config::default(), &hotkey(&[RETURN_KEYCODE])).unwrap();

        assert_eq!(managed.indices(), vec![0, 2]);
        let grabbed_roots: Vec<Window> = conn
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::GrabKey { root, .. } => Some(root),
                _ => None,
            })
            .collect();
        assert_eq!(grabbed_roots, vec![root(0), root(2)]);
    }

    #[test]
    fn test_no_screens_is_fatal() {
        let conn = MockConn::new(2).owned_by_other(0).owned_by_other(1);
        let err = acquire(&conn, &Config::default(), &hotkey(&[RETURN_KEYCODE])).unwrap_err();

        assert!(matches!(err, WmError::Startup(StartupError::NoManagedScreens)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_zero_screens_is_fatal() {
        let conn = MockConn::new(0);
        assert!(acquire(&conn, &Config::default(), &hotkey(&[])).is_err());
    }

    #[test]
    fn test_existing_windows_get_drag_grab() {
        let conn = MockConn::new(2)
            .owned_by_other(0)
            .with_children(0, &[11])
            .with_children(1, &[21, 22]);
        acquire(&conn, &Config::default(), &hotkey(&[RETURN_KEYCODE])).unwrap();

        let grabbed: Vec<Window> = conn
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::GrabButton { window, button: 3, modifiers: 0 } => Some(window),
                _ => None,
            })
            .collect();
        assert_eq!(grabbed, vec![21, 22]);
    }

    #[test]
    fn test_hotkey_grab_per_code_with_masked_modifier() {
        let conn = MockConn::new(1);
        acquire(&conn, &Config::default(), &hotkey(&[36, 104])).unwrap();

        assert_eq!(
            conn.calls(),
            vec![
                Call::Redirect { root: root(0) },
                Call::GrabKey { root: root(0), keycode: 36, modifiers: 0x08 },
                Call::GrabKey { root: root(0), keycode: 104, modifiers: 0x08 },
            ]
        );
    }

    #[test]
    fn test_vanished_child_does_not_abort_acquisition() {
        let conn = MockConn::new(1).with_children(0, &[5, 6]).with_vanished(5);
        let managed = acquire(&conn, &Config::default(), &hotkey(&[])).unwrap();

        assert_eq!(managed.len(), 1);
        assert!(conn.calls().contains(&Call::GrabButton { window: 6, button: 3, modifiers: 0 }));
        assert!(!conn.calls().iter().any(|c| matches!(c, Call::GrabButton { window: 5, .. })));
    }
}
