#![forbid(unsafe_code)]

use crate::domain::{StopPhase, SyscallClass};
use crate::error::Error;
use crate::observation::MappingsSource;
use crate::ptrace::{Ptrace, default_options};
use crate::stores::FileSet;
use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, trace};

/// Drives the stop loop over a tree of tracees and collects the files
/// their mapping tables reveal.
///
/// A controller is single use: [`attach`](Self::attach) the launched
/// process, then [`run`](Self::run) until every tracee has exited.
#[derive(Debug)]
pub struct TraceController<P, M> {
    ptrace: P,
    source: M,
    sample_on: Vec<SyscallClass>,
    tracees: FxHashMap<Pid, StopPhase>,
    /// Announced by a fork/vfork/clone event, initial `SIGSTOP` not seen yet.
    awaiting_first_stop: FxHashSet<Pid>,
    /// Stopped before the parent's event announced them.
    unannounced: FxHashSet<Pid>,
    /// Exited before the parent's event announced them.
    reaped_early: FxHashSet<Pid>,
    files: FileSet,
}

impl<P: Ptrace, M: MappingsSource> TraceController<P, M> {
    pub fn new(ptrace: P, source: M, sample_on: impl IntoIterator<Item = SyscallClass>) -> Self {
        let mut classes = Vec::new();
        for class in sample_on {
            if class != SyscallClass::Other && !classes.contains(&class) {
                classes.push(class);
            }
        }
        Self {
            ptrace,
            source,
            sample_on: classes,
            tracees: FxHashMap::default(),
            awaiting_first_stop: FxHashSet::default(),
            unannounced: FxHashSet::default(),
            reaped_early: FxHashSet::default(),
            files: FileSet::default(),
        }
    }

    /// Take over a process launched with `PTRACE_TRACEME`.
    ///
    /// Consumes the initial trace trap, enables fork/vfork/clone following
    /// and lets the process run to its first syscall stop. The freshly
    /// executed image is sampled right away, since its own `execve` exit
    /// happened before the tracer was in control.
    pub fn attach(&mut self, pid: Pid) -> Result<(), Error> {
        match self.ptrace.wait_initial(pid)? {
            WaitStatus::Stopped(stopped, Signal::SIGTRAP) if stopped == pid => {
                debug!(pid = pid.as_raw(), "tracee stopped at initial trace trap");
            }
            status => {
                return Err(Error::InitialStop {
                    pid,
                    status: format!("{status:?}"),
                });
            }
        }

        self.ptrace.set_options(pid, default_options())?;
        self.tracees.insert(pid, StopPhase::AwaitingEntryStop);
        if self.sample_on.contains(&SyscallClass::ProcessExec) {
            self.sample(pid, SyscallClass::ProcessExec)?;
        }
        self.ptrace.resume(pid, None)?;
        info!(pid = pid.as_raw(), "attached");
        Ok(())
    }

    /// Process stop events until no tracee is left, then hand over the
    /// collected files.
    pub fn run(mut self) -> Result<FileSet, Error> {
        while !self.tracees.is_empty() {
            let status = self.ptrace.wait_any()?;
            trace!(live = self.live_tracees(), ?status, "wait");
            self.handle(status)?;
        }
        info!(files = self.files.len(), "all tracees exited");
        Ok(self.files)
    }

    pub fn live_tracees(&self) -> usize {
        self.tracees.len()
    }

    fn handle(&mut self, status: WaitStatus) -> Result<(), Error> {
        match status {
            WaitStatus::PtraceSyscall(pid) => {
                let phase = self.tracees.entry(pid).or_default();
                let exiting = phase.is_exit();
                phase.flip();
                if exiting {
                    self.on_syscall_exit(pid)?;
                }
                self.ptrace.resume(pid, None)
            }
            WaitStatus::PtraceEvent(pid, _, event) => {
                self.tracees.entry(pid).or_default();
                self.on_event(pid, event)?;
                self.ptrace.resume(pid, None)
            }
            WaitStatus::Stopped(pid, signal) => {
                // First stop of a new tracee or a signal-delivery stop.
                // Neither is a syscall stop, so the phase stays put.
                let first_stop = if self.tracees.contains_key(&pid) {
                    self.awaiting_first_stop.remove(&pid)
                } else {
                    self.tracees.insert(pid, StopPhase::default());
                    self.unannounced.insert(pid);
                    true
                };
                let forward = match signal {
                    Signal::SIGTRAP => None,
                    Signal::SIGSTOP if first_stop => None,
                    other => Some(other),
                };
                trace!(pid = pid.as_raw(), ?signal, ?forward, "signal stop");
                self.ptrace.resume(pid, forward)
            }
            WaitStatus::Exited(pid, code) => {
                self.retire(pid);
                debug!(pid = pid.as_raw(), code, left = self.live_tracees(), "tracee exited");
                Ok(())
            }
            WaitStatus::Signaled(pid, signal, _) => {
                self.retire(pid);
                debug!(pid = pid.as_raw(), ?signal, left = self.live_tracees(), "tracee killed");
                Ok(())
            }
            other => {
                trace!(?other, "ignored wait status");
                Ok(())
            }
        }
    }

    fn on_event(&mut self, pid: Pid, event: i32) -> Result<(), Error> {
        match event {
            libc::PTRACE_EVENT_FORK | libc::PTRACE_EVENT_VFORK | libc::PTRACE_EVENT_CLONE => {
                // Registered now so the loop cannot end before the child's
                // first stop arrives. The child may already have stopped, or
                // even exited, if the parent was slow to report the event.
                let child = self.ptrace.event_message(pid)?;
                if self.reaped_early.remove(&child) {
                    debug!(
                        parent = pid.as_raw(),
                        child = child.as_raw(),
                        event,
                        "child already exited"
                    );
                } else if !self.unannounced.remove(&child) {
                    self.tracees.entry(child).or_default();
                    self.awaiting_first_stop.insert(child);
                    debug!(parent = pid.as_raw(), child = child.as_raw(), event, "new tracee");
                }
            }
            libc::PTRACE_EVENT_EXEC => {
                // A non-leader thread that execs takes over the leader's pid
                // and its old tid never reports an exit.
                let former = self.ptrace.event_message(pid)?;
                if former != pid {
                    let phase = self
                        .tracees
                        .remove(&former)
                        .unwrap_or(StopPhase::AwaitingExitStop);
                    self.awaiting_first_stop.remove(&former);
                    self.unannounced.remove(&former);
                    self.tracees.insert(pid, phase);
                    debug!(pid = pid.as_raw(), former = former.as_raw(), "exec replaced thread");
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn retire(&mut self, pid: Pid) {
        self.tracees.remove(&pid);
        self.awaiting_first_stop.remove(&pid);
        if self.unannounced.remove(&pid) {
            self.reaped_early.insert(pid);
        }
    }

    fn on_syscall_exit(&mut self, pid: Pid) -> Result<(), Error> {
        let nr = self.ptrace.syscall_number(pid)?;
        let class = SyscallClass::classify(nr);
        if self.sample_on.contains(&class) {
            self.sample(pid, class)?;
        }
        Ok(())
    }

    fn sample(&mut self, pid: Pid, class: SyscallClass) -> Result<(), Error> {
        let paths = self.source.file_paths(pid)?;
        let seen = paths.len();
        let added = self.files.merge(paths);
        trace!(pid = pid.as_raw(), ?class, seen, added, "sampled mappings");
        Ok(())
    }
}
