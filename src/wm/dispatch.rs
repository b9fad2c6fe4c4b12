//! Event dispatch loop.
//!
//! Waits for each event, hands it to the window manager, and absorbs handler
//! faults up to a fixed ceiling. Shutdown conditions always stop the loop.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, info, trace};

use crate::error::{Shutdown, WmError};
use crate::wm::WindowManager;
use crate::wm::conn::XConn;
use crate::wm::events::WmEvent;
use crate::wm::startup::ProcessLauncher;

/// Recoverable faults seen during this process lifetime
#[derive(Debug, Clone, Copy)]
pub struct FaultCounter {
    count: u32,
    max: u32,
}

impl FaultCounter {
    pub fn new(max: u32) -> Self {
        Self { count: 0, max }
    }

    /// Count one fault, returning the new total
    pub fn record(&mut self) -> u32 {
        self.count = self.count.saturating_add(1);
        self.count
    }

    pub fn exceeded(&self) -> bool {
        self.count > self.max
    }
}

/// Serve events until shutdown or too many faults.
///
/// Returns the shutdown reason on a clean stop and `WmError::RuntimeFatal`
/// once the fault ceiling is passed.
pub async fn run<C: XConn, L: ProcessLauncher>(
    wm: &mut WindowManager<C, L>,
) -> Result<Shutdown, WmError> {
    let mut faults = FaultCounter::new(wm.config().max_faults);

    info!("Entering event loop");
    loop {
        let outcome = match wm.conn_mut().next_event().await {
            Ok(event) => dispatch(wm, event).and_then(|()| wm.conn().flush()),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {}
            Err(WmError::Shutdown(reason)) => {
                info!("Event loop stopping: {}", reason);
                return Ok(reason);
            }
            Err(fault) => {
                let count = faults.record();
                error!("Fault {} of at most {}: {}", count, wm.config().max_faults, fault);
                debug!("Fault detail: {:?}", fault);

                if faults.exceeded() {
                    error!("Too many faults, giving up");
                    return Err(WmError::RuntimeFatal {
                        faults: count,
                        last: Box::new(fault),
                    });
                }
            }
        }
    }
}

/// Serve events until `interrupt` resolves or the loop stops on its own.
///
/// The interrupt is checked first on every wake, so it is honored between
/// events even while events keep arriving.
pub async fn run_until<C, L, F>(
    wm: &mut WindowManager<C, L>,
    interrupt: F,
) -> Result<Shutdown, WmError>
where
    C: XConn,
    L: ProcessLauncher,
    F: Future<Output = &'static str>,
{
    tokio::select! {
        biased;
        signal = interrupt => {
            info!("Received {}, shutting down", signal);
            Ok(Shutdown::Interrupted)
        }
        result = run(wm) => result,
    }
}

/// Run one handler, turning a panic into a fault
fn dispatch<C: XConn, L: ProcessLauncher>(
    wm: &mut WindowManager<C, L>,
    event: WmEvent,
) -> Result<(), WmError> {
    if matches!(event, WmEvent::MotionNotify(_)) {
        trace!("Dispatching {}", event.kind());
    } else {
        debug!("Dispatching {}", event.kind());
    }

    panic::catch_unwind(AssertUnwindSafe(|| wm.handle_event(event)))
        .unwrap_or_else(|payload| Err(WmError::HandlerPanic(panic_message(payload))))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
