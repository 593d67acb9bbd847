use nix::errno::Errno;
use nix::unistd::Pid;
use std::ffi::OsString;
use std::path::PathBuf;

/// Everything that can end a trace session. None of these are recoverable:
/// a session either yields a complete file set or an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to launch {program:?}: {source}")]
    Launch {
        program: OsString,
        source: std::io::Error,
    },

    #[error("Launched process {pid} did not stop at its initial trace trap: {status}")]
    InitialStop { pid: Pid, status: String },

    #[error("Failed to set trace options on {pid}: {source}")]
    TraceConfig { pid: Pid, source: Errno },

    #[error("Failed to wait for tracees: {0}")]
    Wait(Errno),

    #[error("Failed to resume tracee {pid}: {source}")]
    Resume { pid: Pid, source: Errno },

    #[error("Failed to inspect tracee {pid}: {source}")]
    Inspect { pid: Pid, source: Errno },

    #[error("Mapping table {path:?} is unavailable: {source}")]
    MappingsUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed mapping line {line:?}: {reason}")]
    MappingParse { line: String, reason: &'static str },

    #[error("Reading syscall numbers is not supported on {0}")]
    UnsupportedArch(&'static str),

    #[error("Failed to spawn tracer thread: {0}")]
    TracerThread(std::io::Error),

    #[error("Tracer thread panicked")]
    TracerPanicked,
}

impl Error {
    /// Short, stable name of the failure class for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Launch { .. } | Error::InitialStop { .. } => "launch",
            Error::TraceConfig { .. } => "trace-config",
            Error::Wait(_) => "wait",
            Error::Resume { .. } => "resume",
            Error::Inspect { .. } => "inspect",
            Error::MappingsUnavailable { .. } => "mappings-unavailable",
            Error::MappingParse { .. } => "mapping-parse",
            Error::UnsupportedArch(_) => "unsupported-arch",
            Error::TracerThread(_) | Error::TracerPanicked => "tracer-thread",
        }
    }
}
