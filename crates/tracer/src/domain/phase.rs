#![forbid(unsafe_code)]

/// Which kind of syscall stop a tracee will report next.
///
/// Syscall-entry and syscall-exit stops strictly alternate for a single
/// tracee, but stops from different tracees interleave arbitrarily, so the
/// phase is kept per pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopPhase {
    #[default]
    AwaitingEntryStop,
    AwaitingExitStop,
}

impl StopPhase {
    pub fn flip(&mut self) {
        *self = match self {
            StopPhase::AwaitingEntryStop => StopPhase::AwaitingExitStop,
            StopPhase::AwaitingExitStop => StopPhase::AwaitingEntryStop,
        };
    }

    pub fn is_exit(self) -> bool {
        self == StopPhase::AwaitingExitStop
    }
}
