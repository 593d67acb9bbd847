//! The narrow set of ptrace and wait operations the controller needs.

use crate::error::Error;
use nix::sys::ptrace::{self, Options};
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

/// Options applied to the launched process; the kernel copies them onto
/// every auto-attached descendant.
pub fn default_options() -> Options {
    Options::PTRACE_O_TRACESYSGOOD
        | Options::PTRACE_O_TRACEFORK
        | Options::PTRACE_O_TRACEVFORK
        | Options::PTRACE_O_TRACECLONE
        | Options::PTRACE_O_TRACEEXEC
        | Options::PTRACE_O_EXITKILL
}

pub trait Ptrace {
    /// Wait for the first stop of a freshly launched tracee.
    fn wait_initial(&mut self, pid: Pid) -> Result<WaitStatus, Error>;

    /// Wait for the next event from any tracee.
    fn wait_any(&mut self) -> Result<WaitStatus, Error>;

    fn set_options(&mut self, pid: Pid, options: Options) -> Result<(), Error>;

    /// Restart a stopped tracee until its next syscall stop.
    fn resume(&mut self, pid: Pid, signal: Option<Signal>) -> Result<(), Error>;

    /// The syscall number saved at the current syscall stop.
    fn syscall_number(&mut self, pid: Pid) -> Result<u64, Error>;

    /// Pid of the child reported by a fork, vfork or clone event stop.
    fn event_message(&mut self, pid: Pid) -> Result<Pid, Error>;
}

/// [`Ptrace`] backed by the real syscalls. Must be used from the thread
/// that launched the tracee.
#[derive(Debug, Default)]
pub struct NixPtrace;

// Only this thread's children: other threads may run their own sessions.
const WAIT_FLAGS: Option<WaitPidFlag> =
    Some(WaitPidFlag::__WALL.union(WaitPidFlag::__WNOTHREAD));

impl Ptrace for NixPtrace {
    fn wait_initial(&mut self, pid: Pid) -> Result<WaitStatus, Error> {
        waitpid(pid, WAIT_FLAGS).map_err(Error::Wait)
    }

    fn wait_any(&mut self) -> Result<WaitStatus, Error> {
        loop {
            match waitpid(None, WAIT_FLAGS) {
                Err(nix::errno::Errno::EINTR) => continue,
                res => return res.map_err(Error::Wait),
            }
        }
    }

    fn set_options(&mut self, pid: Pid, options: Options) -> Result<(), Error> {
        ptrace::setoptions(pid, options).map_err(|source| Error::TraceConfig { pid, source })
    }

    fn resume(&mut self, pid: Pid, signal: Option<Signal>) -> Result<(), Error> {
        ptrace::syscall(pid, signal).map_err(|source| Error::Resume { pid, source })
    }

    fn syscall_number(&mut self, pid: Pid) -> Result<u64, Error> {
        syscall_number(pid)
    }

    fn event_message(&mut self, pid: Pid) -> Result<Pid, Error> {
        let raw = ptrace::getevent(pid).map_err(|source| Error::Inspect { pid, source })?;
        Ok(Pid::from_raw(raw as libc::pid_t))
    }
}

#[cfg(target_arch = "x86_64")]
fn syscall_number(pid: Pid) -> Result<u64, Error> {
    let regs = ptrace::getregs(pid).map_err(|source| Error::Inspect { pid, source })?;
    Ok(regs.orig_rax)
}

#[cfg(all(target_arch = "aarch64", target_env = "gnu"))]
fn syscall_number(pid: Pid) -> Result<u64, Error> {
    let regs = ptrace::getregset::<ptrace::regset::NT_PRSTATUS>(pid)
        .map_err(|source| Error::Inspect { pid, source })?;
    // x8 carries the syscall number on both entry and exit.
    Ok(regs.regs[8])
}

#[cfg(not(any(target_arch = "x86_64", all(target_arch = "aarch64", target_env = "gnu"))))]
fn syscall_number(_pid: Pid) -> Result<u64, Error> {
    Err(Error::UnsupportedArch(std::env::consts::ARCH))
}
