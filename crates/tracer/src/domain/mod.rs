#![forbid(unsafe_code)]

mod mapping;
mod phase;
mod syscall;

pub use mapping::{DeviceId, MemoryMapping, Permissions};
pub use phase::StopPhase;
pub use syscall::SyscallClass;
