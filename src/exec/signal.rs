// src/exec/signal.rs

//! Thin wrappers over the signals the supervisor sends.
//!
//! Supervised binaries are spawned as process-group leaders, so the group id
//! equals the pid recorded at spawn time.

use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;

/// Pids that must never be signalled: 0 and 1 would address our own
/// process group or init, negatives address groups.
fn target(pid: i32) -> Option<Pid> {
    (pid > 1).then(|| Pid::from_raw(pid))
}

/// Ask a process to shut down (SIGINT).
pub fn interrupt(pid: i32) -> Result<(), Errno> {
    let Some(pid) = target(pid) else {
        return Err(Errno::EINVAL);
    };
    kill(pid, Signal::SIGINT)
}

/// SIGKILL the whole process group led by `pid`, falling back to the pid
/// itself when it is not a group leader.
pub fn kill_group(pid: i32) -> Result<(), Errno> {
    let Some(pid) = target(pid) else {
        return Err(Errno::EINVAL);
    };
    match killpg(pid, Signal::SIGKILL) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => kill(pid, Signal::SIGKILL),
        Err(err) => Err(err),
    }
}

/// SIGKILL what is left of the group led by an exited `pid`.
///
/// Returns whether any member was still there. Never signals a lone pid,
/// which may already belong to an unrelated process.
pub fn sweep_group(pid: i32) -> Result<bool, Errno> {
    let Some(pid) = target(pid) else {
        return Err(Errno::EINVAL);
    };
    match killpg(pid, Signal::SIGKILL) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(err) => Err(err),
    }
}
