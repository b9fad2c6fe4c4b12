//! X11 Async Event Stream
//!
//! Waits for X11 events on the current tokio task by registering the
//! connection's socket with the runtime's reactor. No polling thread.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::Arc;

use tokio::io::unix::AsyncFd;
use x11rb::connection::Connection;
use x11rb::errors::ConnectionError;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

/// The connection's socket, kept open by the connection it belongs to
struct XSocket(Arc<RustConnection>);

impl AsRawFd for XSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.0.stream().as_raw_fd()
    }
}

/// X11 event stream with async readiness
pub struct X11EventStream {
    socket: AsyncFd<XSocket>,
}

impl X11EventStream {
    /// Register the connection socket with the tokio reactor.
    ///
    /// Must be called from within a runtime.
    pub fn new(conn: Arc<RustConnection>) -> io::Result<Self> {
        let socket = AsyncFd::new(XSocket(conn))?;
        Ok(Self { socket })
    }

    /// Next event, waiting for the socket if the internal buffer is empty.
    ///
    /// Replies read while handling the previous event may already have
    /// buffered events, so the buffer is drained before waiting.
    pub async fn next_event(&self) -> Result<Event, ConnectionError> {
        let conn = &self.socket.get_ref().0;
        loop {
            if let Some(event) = conn.poll_for_event()? {
                return Ok(event);
            }

            let mut guard = self.socket.readable().await.map_err(ConnectionError::IoError)?;

            if let Some(event) = conn.poll_for_event()? {
                return Ok(event);
            }
            guard.clear_ready();
        }
    }
}
