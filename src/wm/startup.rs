//! Startup Module
//!
//! Launching external programs fully detached from the window manager:
//! startup programs at boot and the terminal on the hotkey.
//!
//! The launch is a double fork. The first child starts a new session and
//! forks again, then exits at once; the caller reaps it immediately so it
//! never holds a child. The grandchild is reparented to init, resets its
//! process state and execs the target.

use std::ffi::{CString, OsString};
use std::os::raw::c_char;
use std::os::unix::ffi::{OsStrExt, OsStringExt};

use nix::errno::Errno;
use nix::sys::resource::{Resource, getrlimit};
use nix::sys::signal::{SigHandler, SigSet, SigmaskHow, Signal, signal, sigprocmask};
use nix::sys::wait::waitpid;
use nix::unistd::{ForkResult, Pid, fork, setsid};
use tracing::{error, info, warn};

use crate::error::SpawnError;

/// Descriptor cap used when the hard limit is unbounded
const FALLBACK_MAX_FDS: libc::c_int = 1024;

/// Runs a program without the caller tracking it
pub trait ProcessLauncher {
    fn launch_detached(&self, argv: &[String]) -> Result<(), SpawnError>;
}

/// Double-fork launcher for unix targets
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedLauncher;

impl ProcessLauncher for DetachedLauncher {
    fn launch_detached(&self, argv: &[String]) -> Result<(), SpawnError> {
        // Everything the children need is allocated before forking.
        let prepared = Prepared::new(argv)?;

        info!("Launching: {}", argv.join(" "));

        // SAFETY: the children only touch memory prepared above until they
        // exec or exit.
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => {
                reap(child);
                Ok(())
            }
            Ok(ForkResult::Child) => detach(&prepared),
            Err(e) => Err(SpawnError::Fork(e)),
        }
    }
}

/// Launch each startup program in order, logging failures
pub fn run_startup_programs<L: ProcessLauncher>(launcher: &L, programs: &[Vec<String>]) {
    for argv in programs {
        if let Err(e) = launcher.launch_detached(argv) {
            warn!("Failed to launch startup program {:?}: {}", argv, e);
        }
    }
}

/// Exec arguments encoded for the C ABI
struct Prepared {
    program: CString,
    _argv: Vec<CString>,
    _envp: Vec<CString>,
    argv_ptrs: Vec<*const c_char>,
    envp_ptrs: Vec<*const c_char>,
    cwd: CString,
}

impl Prepared {
    fn new(argv: &[String]) -> Result<Self, SpawnError> {
        if argv.is_empty() {
            return Err(SpawnError::EmptyCommand);
        }

        let argv: Vec<CString> = argv
            .iter()
            .map(|arg| CString::new(arg.as_bytes()).map_err(|_| SpawnError::NulByte(arg.clone())))
            .collect::<Result<_, _>>()?;

        let envp: Vec<CString> = std::env::vars_os()
            .map(|(key, value)| {
                let mut pair: OsString = key;
                pair.push("=");
                pair.push(value);
                CString::new(pair.into_vec())
                    .map_err(|e| SpawnError::NulByte(String::from_utf8_lossy(&e.into_vec()).into_owned()))
            })
            .collect::<Result<_, _>>()?;

        let cwd = dirs::home_dir()
            .and_then(|home| CString::new(home.as_os_str().as_bytes()).ok())
            .unwrap_or_else(|| c"/".to_owned());

        let argv_ptrs = null_terminated(&argv);
        let envp_ptrs = null_terminated(&envp);

        Ok(Self {
            program: argv[0].clone(),
            _argv: argv,
            _envp: envp,
            argv_ptrs,
            envp_ptrs,
            cwd,
        })
    }
}

fn null_terminated(strings: &[CString]) -> Vec<*const c_char> {
    strings
        .iter()
        .map(|s| s.as_ptr())
        .chain(std::iter::once(std::ptr::null()))
        .collect()
}

/// Wait for the intermediate child, which exits right after its own fork
fn reap(child: Pid) {
    loop {
        match waitpid(child, None) {
            Err(Errno::EINTR) => continue,
            Err(e) => {
                warn!("Failed to reap launcher child {}: {}", child, e);
                return;
            }
            Ok(_) => return,
        }
    }
}

/// First child: new session, second fork, then leave
fn detach(prepared: &Prepared) -> ! {
    if let Err(e) = setsid() {
        fail("setsid", e);
    }

    // SAFETY: see `launch_detached`.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { .. }) => unsafe { libc::_exit(0) },
        Ok(ForkResult::Child) => exec(prepared),
        Err(e) => fail("second fork", e),
    }
}

/// Grandchild: reset process state and replace the image
fn exec(prepared: &Prepared) -> ! {
    reset_signals();

    unsafe {
        if libc::chdir(prepared.cwd.as_ptr()) != 0 {
            fail("chdir", std::io::Error::last_os_error());
        }
        libc::umask(0);

        for fd in 0..max_descriptors() {
            libc::close(fd);
        }

        // Lowest free descriptor is 0 now
        let null = libc::open(c"/dev/null".as_ptr(), libc::O_RDWR);
        if null < 0 {
            fail("open /dev/null", std::io::Error::last_os_error());
        }
        libc::dup2(null, 1);
        libc::dup2(null, 2);

        libc::execve(
            prepared.program.as_ptr(),
            prepared.argv_ptrs.as_ptr(),
            prepared.envp_ptrs.as_ptr(),
        );
    }
    let err = std::io::Error::last_os_error();
    error!("Failed to exec {:?}: {}", prepared.program, err);
    unsafe { libc::_exit(1) }
}

/// Ignored dispositions and the blocked mask survive `execve`.
///
/// The runtime ignores SIGPIPE in this process, so it is restored to the
/// default along with an empty mask.
fn reset_signals() {
    // SAFETY: single-threaded child, no handler is being installed.
    if let Err(e) = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) } {
        fail("reset SIGPIPE", e);
    }
    if let Err(e) = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&SigSet::empty()), None) {
        fail("clear signal mask", e);
    }
}

fn max_descriptors() -> libc::c_int {
    match getrlimit(Resource::RLIMIT_NOFILE) {
        Ok((_, hard)) if hard != libc::RLIM_INFINITY => {
            libc::c_int::try_from(hard).unwrap_or(libc::c_int::MAX)
        }
        _ => FALLBACK_MAX_FDS,
    }
}

fn fail(stage: &str, err: impl std::fmt::Display) -> ! {
    error!("Error in detached child during {}: {}", stage, err);
    unsafe { libc::_exit(1) }
}
