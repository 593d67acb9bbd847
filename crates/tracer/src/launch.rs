use crate::error::Error;
use nix::sys::ptrace;
use nix::unistd::Pid;
use std::ffi::{OsStr, OsString};
use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use tracing::debug;

/// A program and its arguments, passed through to the tracee unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<OsString>,
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Start the program with the caller's standard streams, asking to be
    /// traced before `execve` so the kernel stops it with `SIGTRAP` right
    /// after the new image is loaded.
    ///
    /// The returned process is not reaped here; the caller owns it through
    /// `waitpid`.
    pub fn launch(&self) -> Result<Pid, Error> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // SAFETY: `traceme` is a single async-signal-safe syscall.
        #[allow(unsafe_code)]
        unsafe {
            command.pre_exec(|| ptrace::traceme().map_err(io::Error::from));
        }

        let child = command.spawn().map_err(|source| Error::Launch {
            program: self.program.clone(),
            source,
        })?;
        let pid = Pid::from_raw(child.id() as libc::pid_t);
        debug!(pid = pid.as_raw(), program = ?self.program, "launched tracee");
        Ok(pid)
    }
}
