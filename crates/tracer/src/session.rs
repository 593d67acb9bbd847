#![forbid(unsafe_code)]

use crate::controller::TraceController;
use crate::domain::SyscallClass;
use crate::error::Error;
use crate::launch::Invocation;
use crate::observation::ProcMaps;
use crate::ptrace::NixPtrace;
use crate::stores::FileSet;
use config::Config;
use std::thread;
use tracing::{debug, info_span};

/// One traced run of a command.
///
/// ptrace ties a tracee to the thread that attached it, so launching,
/// waiting and every restart happen on a single dedicated `tracer` thread
/// that lives exactly as long as the session.
#[derive(Debug, Clone)]
pub struct TraceSession {
    sample_on: Vec<SyscallClass>,
    maps: ProcMaps,
}

impl TraceSession {
    pub fn new(config: &Config) -> Self {
        Self {
            sample_on: config
                .trace
                .sample_on
                .iter()
                .copied()
                .map(SyscallClass::from)
                .collect(),
            maps: ProcMaps::new(&config.trace.proc_root),
        }
    }

    /// Run `invocation` to completion and return every file its process
    /// tree had mapped at the sampled syscalls.
    pub fn run(self, invocation: Invocation) -> Result<FileSet, Error> {
        let handle = thread::Builder::new()
            .name("tracer".into())
            .spawn(move || {
                let span = info_span!("session", program = ?invocation.program());
                let _entered = span.enter();

                let pid = invocation.launch()?;
                let mut controller = TraceController::new(NixPtrace, self.maps, self.sample_on);
                controller.attach(pid)?;
                controller.run()
            })
            .map_err(Error::TracerThread)?;

        let files = handle.join().map_err(|_| Error::TracerPanicked)??;
        debug!(files = files.len(), "session finished");
        Ok(files)
    }
}

impl Default for TraceSession {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
