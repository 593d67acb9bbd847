#![forbid(unsafe_code)]

use config::SampleTrigger;

/// Coarse classification of a raw syscall number.
///
/// Only the file-relevant classes trigger a mapping snapshot; everything
/// else is [`SyscallClass::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyscallClass {
    ProcessExec,
    OpenFile,
    CreateFile,
    OpenAtFile,
    Other,
}

impl SyscallClass {
    /// Classify a syscall number of the architecture this crate is built for.
    pub fn classify(nr: u64) -> Self {
        let Ok(nr) = libc::c_long::try_from(nr) else {
            return SyscallClass::Other;
        };
        classify_native(nr)
    }
}

impl From<SampleTrigger> for SyscallClass {
    fn from(trigger: SampleTrigger) -> Self {
        match trigger {
            SampleTrigger::Exec => SyscallClass::ProcessExec,
            SampleTrigger::Open => SyscallClass::OpenFile,
            SampleTrigger::Creat => SyscallClass::CreateFile,
            SampleTrigger::OpenAt => SyscallClass::OpenAtFile,
        }
    }
}

#[cfg(target_arch = "x86_64")]
fn classify_native(nr: libc::c_long) -> SyscallClass {
    match nr {
        libc::SYS_execve | libc::SYS_execveat => SyscallClass::ProcessExec,
        libc::SYS_open => SyscallClass::OpenFile,
        libc::SYS_creat => SyscallClass::CreateFile,
        libc::SYS_openat | libc::SYS_openat2 => SyscallClass::OpenAtFile,
        _ => SyscallClass::Other,
    }
}

// The generic syscall table has no `open` or `creat`; libc routes both
// through `openat`.
#[cfg(target_arch = "aarch64")]
fn classify_native(nr: libc::c_long) -> SyscallClass {
    match nr {
        libc::SYS_execve | libc::SYS_execveat => SyscallClass::ProcessExec,
        libc::SYS_openat | libc::SYS_openat2 => SyscallClass::OpenAtFile,
        _ => SyscallClass::Other,
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn classify_native(_nr: libc::c_long) -> SyscallClass {
    SyscallClass::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_map_onto_file_classes() {
        let classes: Vec<SyscallClass> = SampleTrigger::ALL.into_iter().map(Into::into).collect();
        assert_eq!(
            classes,
            vec![
                SyscallClass::ProcessExec,
                SyscallClass::OpenFile,
                SyscallClass::CreateFile,
                SyscallClass::OpenAtFile,
            ]
        );
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn x86_64_table() {
        assert_eq!(SyscallClass::classify(59), SyscallClass::ProcessExec);
        assert_eq!(SyscallClass::classify(322), SyscallClass::ProcessExec);
        assert_eq!(SyscallClass::classify(2), SyscallClass::OpenFile);
        assert_eq!(SyscallClass::classify(85), SyscallClass::CreateFile);
        assert_eq!(SyscallClass::classify(257), SyscallClass::OpenAtFile);
        assert_eq!(SyscallClass::classify(437), SyscallClass::OpenAtFile);
        assert_eq!(SyscallClass::classify(0), SyscallClass::Other);
        assert_eq!(SyscallClass::classify(9), SyscallClass::Other);
    }

    #[test]
    #[cfg(target_arch = "aarch64")]
    fn aarch64_table() {
        assert_eq!(SyscallClass::classify(221), SyscallClass::ProcessExec);
        assert_eq!(SyscallClass::classify(56), SyscallClass::OpenAtFile);
        assert_eq!(SyscallClass::classify(63), SyscallClass::Other);
    }

    #[test]
    fn out_of_range_numbers_are_other() {
        assert_eq!(SyscallClass::classify(u64::MAX), SyscallClass::Other);
    }
}
