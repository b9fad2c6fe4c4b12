//! Asynchronous protocol error reporting.
//!
//! Unchecked requests that fail (typically because the target window was
//! destroyed between the event and our reaction to it) come back as error
//! events. They are expected and only logged.

use tracing::warn;

use crate::wm::events::ProtocolError;

pub fn report(error: &ProtocolError) {
    warn!("X protocol error: {}", error);
}
