use serde::{Deserialize, Serialize};

/// A family of syscalls whose completion makes the tracer snapshot the
/// tracee's memory mappings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleTrigger {
    /// `execve` and `execveat`. The new program image and its dynamic
    /// libraries are mapped by the time the syscall returns.
    #[serde(rename = "exec")]
    Exec,

    /// `open`.
    #[serde(rename = "open")]
    Open,

    /// `creat`.
    #[serde(rename = "creat")]
    Creat,

    /// `openat` and `openat2`.
    #[serde(rename = "openat")]
    OpenAt,
}

impl SampleTrigger {
    pub const ALL: [SampleTrigger; 4] = [Self::Exec, Self::Open, Self::Creat, Self::OpenAt];
}
